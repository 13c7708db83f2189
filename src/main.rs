use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use swarmwatch::telemetry::{self, LogFormat};
use swarmwatch::{Config, DockerClient, RuntimeBuilder, RuntimeError};

// ============================================================================
// CLI
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "swarmwatch")]
#[command(about = "Live dashboard backend for a container swarm", version)]
struct Cli {
    /// HTTP/WebSocket listen address
    #[arg(long, env = "SWARMWATCH_LISTEN", default_value = "0.0.0.0:6969")]
    listen: SocketAddr,

    /// Docker Engine endpoint (unix://, tcp:// or http://); defaults to the local socket
    #[arg(long, env = "DOCKER_HOST")]
    endpoint: Option<String>,

    /// Directory with the dashboard's static files
    #[arg(long, env = "SWARMWATCH_STATIC_DIR", default_value = "static")]
    static_dir: PathBuf,

    /// Node poll interval in milliseconds
    #[arg(long, default_value_t = 5000)]
    node_interval_ms: u64,

    /// Service poll interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    service_interval_ms: u64,

    /// Task poll interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    task_interval_ms: u64,

    /// Pause after each broadcast pass in milliseconds
    #[arg(long, default_value_t = 50)]
    send_interval_ms: u64,

    /// Liveness probe interval in milliseconds
    #[arg(long, default_value_t = 5000)]
    probe_interval_ms: u64,

    /// Event queue capacity
    #[arg(long, default_value_t = 100)]
    queue_capacity: usize,

    /// Shutdown grace period in milliseconds
    #[arg(long, default_value_t = 10_000)]
    grace_ms: u64,

    /// Only poll tasks with this desired state
    #[arg(long, default_value = "running", conflicts_with = "all_tasks")]
    task_state: String,

    /// Poll tasks in every desired state
    #[arg(long)]
    all_tasks: bool,

    /// Default log level when RUST_LOG is unset
    #[arg(long, env = "SWARMWATCH_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format (pretty or json)
    #[arg(long, env = "SWARMWATCH_LOG_FORMAT", default_value = "pretty")]
    log_format: LogFormat,
}

impl Cli {
    fn into_config(self) -> Config {
        Config {
            listen: self.listen,
            endpoint: self.endpoint,
            static_dir: self.static_dir,
            node_interval: Duration::from_millis(self.node_interval_ms),
            service_interval: Duration::from_millis(self.service_interval_ms),
            task_interval: Duration::from_millis(self.task_interval_ms),
            queue_capacity: self.queue_capacity,
            send_interval: Duration::from_millis(self.send_interval_ms),
            probe_interval: Duration::from_millis(self.probe_interval_ms),
            grace: Duration::from_millis(self.grace_ms),
            task_desired_state: (!self.all_tasks).then_some(self.task_state),
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init_logging(cli.log_format, &cli.log_level);

    match run(cli.into_config()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(label = e.as_label(), error = %e, "swarmwatch stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: Config) -> Result<(), RuntimeError> {
    let docker = DockerClient::connect(cfg.endpoint.as_deref())?;
    info!(
        endpoint = docker.endpoint(),
        listen = %cfg.listen,
        static_dir = %cfg.static_dir.display(),
        "starting swarmwatch"
    );

    let runtime = RuntimeBuilder::new(cfg)
        .with_source(Arc::new(docker))
        .build()?;
    runtime.run().await
}
