//! Display helpers: task names and node capacity strings.

/// Derives a task's display name from its image reference and slot.
///
/// Rule, applied in order:
/// 1. cut at the first `@` (image digest);
/// 2. cut at the first `:latest`;
/// 3. drop everything through the first `/`, unless that slash is the last character;
/// 4. append `.{slot}`.
///
/// ```
/// use swarmwatch::model::naming::task_display_name;
///
/// assert_eq!(task_display_name("repo/image:latest@sha256:abcd", 2), "image.2");
/// assert_eq!(task_display_name("repo/image.1", 2), "image.1.2");
/// ```
pub fn task_display_name(image: &str, slot: u64) -> String {
    format!("{}.{}", sanitize_image(image), slot)
}

fn sanitize_image(image: &str) -> &str {
    let mut name = image;
    if let Some(at) = name.find('@') {
        name = &name[..at];
    }
    if let Some(tag) = name.find(":latest") {
        name = &name[..tag];
    }
    if let Some(slash) = name.find('/') {
        if slash != name.len() - 1 {
            name = &name[slash + 1..];
        }
    }
    name
}

/// Formats a NanoCPUs value as whole CPUs, e.g. `4 CPU(s)`.
pub fn format_cpus(nano_cpus: i64) -> String {
    format!("{} CPU(s)", nano_cpus / 1_000_000_000)
}

/// Formats a byte count with SI (base 1000) units, e.g. `2.1 GB`.
pub fn format_memory(bytes: i64) -> String {
    const UNIT: i64 = 1000;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let prefix = ['k', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {}B", bytes as f64 / div as f64, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_tag_and_digest_are_stripped() {
        assert_eq!(task_display_name("repo/image:latest@sha256:abcd", 2), "image.2");
        assert_eq!(task_display_name("some/name:latest@sha256.1", 1), "name.1");
    }

    #[test]
    fn untagged_reference_keeps_dots() {
        assert_eq!(task_display_name("repo/image.1", 2), "image.1.2");
        assert_eq!(task_display_name("image/name", 2), "name.2");
    }

    #[test]
    fn only_the_leading_segment_is_removed() {
        assert_eq!(
            task_display_name("registry.local/team/api:latest", 3),
            "team/api.3"
        );
    }

    #[test]
    fn other_tags_and_trailing_slash_survive() {
        assert_eq!(task_display_name("nginx:1.25", 1), "nginx:1.25.1");
        assert_eq!(task_display_name("odd/", 1), "odd/.1");
        assert_eq!(
            task_display_name("redis@sha256:0123", 4),
            "redis.4"
        );
    }

    #[test]
    fn capacity_formatting() {
        assert_eq!(format_cpus(4_000_000_000), "4 CPU(s)");
        assert_eq!(format_cpus(500_000_000), "0 CPU(s)");
        assert_eq!(format_memory(999), "999 B");
        assert_eq!(format_memory(1_500), "1.5 kB");
        assert_eq!(format_memory(2_147_483_648), "2.1 GB");
    }
}
