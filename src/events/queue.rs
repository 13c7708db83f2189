//! # Event queue between reconcilers and the broadcaster.
//!
//! Thin wrapper around a bounded [`tokio::sync::mpsc`] channel carrying encoded
//! [`Frame`]s.
//!
//! ## Architecture
//! ```text
//! Producers (many):                    Consumer (one):
//!   Reconciler(node)    ──┐
//!   Reconciler(service) ──┼──► EventQueue ──► Broadcaster sender loop
//!   Reconciler(task)    ──┘   (bounded FIFO)
//! ```
//!
//! ## Rules
//! - **Blocking enqueue**: `enqueue()` waits while the queue is full (backpressure).
//! - **No drop policy**: a frame is either delivered to the consumer or the
//!   consumer is gone (`QueueClosed`).
//! - **FIFO**: frames from one producer arrive in the order they were enqueued;
//!   frames from different producers interleave by arrival.

use thiserror::Error;
use tokio::sync::mpsc;

use super::event::Frame;

/// The consumer side was dropped; the frame was not queued.
#[derive(Error, Debug)]
#[error("event queue closed")]
pub struct QueueClosed(pub Frame);

/// Creates a bounded event queue.
///
/// The minimum capacity is 1 (clamped).
pub fn channel(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer handle. Cheap to clone.
#[derive(Clone, Debug)]
pub struct EventSender {
    tx: mpsc::Sender<Frame>,
}

impl EventSender {
    /// Appends a frame, waiting while the queue is full.
    pub async fn enqueue(&self, frame: Frame) -> Result<(), QueueClosed> {
        self.tx.send(frame).await.map_err(|e| QueueClosed(e.0))
    }

    /// Number of frames that can be enqueued without waiting.
    pub fn free_slots(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumer handle, owned by the broadcaster's sender loop.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<Frame>,
}

impl EventReceiver {
    /// Next frame in FIFO order; `None` once every sender is dropped and the queue is drained.
    pub async fn dequeue(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    /// Non-waiting variant of [`dequeue`](Self::dequeue).
    pub fn try_dequeue(&mut self) -> Option<Frame> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn frames_come_out_in_order() {
        let (tx, mut rx) = channel(4);
        for text in ["a", "b", "c"] {
            tx.enqueue(Frame::from(text)).await.unwrap();
        }
        assert_eq!(rx.dequeue().await.unwrap().as_str(), "a");
        assert_eq!(rx.dequeue().await.unwrap().as_str(), "b");
        assert_eq!(rx.dequeue().await.unwrap().as_str(), "c");
    }

    #[tokio::test]
    async fn full_queue_blocks_the_producer() {
        let (tx, mut rx) = channel(1);
        tx.enqueue(Frame::from("first")).await.unwrap();
        assert_eq!(tx.free_slots(), 0);

        let blocked = tokio::time::timeout(
            Duration::from_millis(20),
            tx.enqueue(Frame::from("second")),
        )
        .await;
        assert!(blocked.is_err(), "enqueue must wait while the queue is full");

        let producer = {
            let tx = tx.clone();
            tokio::spawn(async move { tx.enqueue(Frame::from("second")).await })
        };
        assert_eq!(rx.dequeue().await.unwrap().as_str(), "first");
        producer.await.unwrap().unwrap();
        assert_eq!(rx.dequeue().await.unwrap().as_str(), "second");
    }

    #[tokio::test]
    async fn enqueue_fails_once_consumer_is_gone() {
        let (tx, rx) = channel(0);
        drop(rx);
        let err = tx.enqueue(Frame::from("lost")).await.unwrap_err();
        assert_eq!(err.0.as_str(), "lost");
    }
}
