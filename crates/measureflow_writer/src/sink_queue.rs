//! The in-process FIFO handing parsed messages from the network thread to
//! the disk thread, with a distinguishable termination sentinel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use measureflow_protocol::{ChunkHeader, Row};

/// One queued item: either a real chunk or the `chunkid = -1` termination
/// sentinel. The sentinel must never have been received over the wire —
/// [`measureflow_protocol::send_chunk`] refuses to send it.
pub struct SinkMessage {
    pub header: ChunkHeader,
    pub row: Row,
}

impl SinkMessage {
    pub fn sentinel() -> Self {
        Self {
            header: ChunkHeader::sentinel(),
            row: Row::empty(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.header.is_sentinel()
    }
}

/// The producing half, held by the network loop.
#[derive(Clone)]
pub struct SinkQueue {
    sender: Sender<SinkMessage>,
}

/// The consuming half, owned by the disk thread.
pub struct SinkQueueReceiver {
    receiver: Receiver<SinkMessage>,
}

impl SinkQueue {
    /// `mpsc::channel` is logically unbounded, but backpressure on this
    /// runtime comes from the push socket's high-water mark (spec.md
    /// §4.2), not from this queue — the disk thread is expected to keep
    /// up with a queue whose depth stays bounded in practice.
    pub fn new() -> (SinkQueue, SinkQueueReceiver) {
        let (sender, receiver) = mpsc::channel();
        (SinkQueue { sender }, SinkQueueReceiver { receiver })
    }

    pub fn enqueue(&self, message: SinkMessage) {
        // The disk thread only disconnects after it has already exited its
        // loop (sentinel received or fatal error); a send failure here
        // means the sink is already tearing down, so it is safe to drop.
        let _ = self.sender.send(message);
    }

    pub fn enqueue_sentinel(&self) {
        self.enqueue(SinkMessage::sentinel());
    }
}

impl SinkQueueReceiver {
    /// Blocks for up to `timeout` waiting for the next message. Returns
    /// `None` on timeout, matching the "blocking dequeue with a short
    /// timeout" variant spec.md §5 prefers over a busy-poll `empty()`
    /// check.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SinkMessage> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use measureflow_protocol::RowValue;

    #[test]
    fn enqueued_messages_are_received_in_order() {
        let (queue, rx) = SinkQueue::new();
        queue.enqueue(SinkMessage {
            header: ChunkHeader::new("run-1", 1),
            row: Row::new(vec![("param".into(), RowValue::Int(1))]),
        });
        queue.enqueue(SinkMessage {
            header: ChunkHeader::new("run-1", 2),
            row: Row::new(vec![("param".into(), RowValue::Int(2))]),
        });

        let first = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(first.header.chunkid, 1);
        assert_eq!(second.header.chunkid, 2);
    }

    #[test]
    fn sentinel_is_distinguishable_from_a_real_message() {
        let (queue, rx) = SinkQueue::new();
        queue.enqueue_sentinel();
        let message = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert!(message.is_sentinel());
    }

    #[test]
    fn recv_timeout_returns_none_when_the_queue_is_empty() {
        let (_queue, rx) = SinkQueue::new();
        assert!(rx.recv_timeout(Duration::from_millis(20)).is_none());
    }
}
