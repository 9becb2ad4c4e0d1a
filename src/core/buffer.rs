//! Capped ring of recent console lines.
//!
//! Each running instance keeps its most recent output lines, tagged with the
//! event sequence number they were published under, so a consumer can replay
//! the buffer and then tail the live bus without gaps or duplicates.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::RwLock;

const MAX_LINES: usize = 1000;

/// Shared, capped line buffer.
#[derive(Clone, Debug)]
pub struct LogBuffer {
    inner: Arc<RwLock<VecDeque<(u64, String)>>>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_capacity(MAX_LINES)
    }
}

impl LogBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(VecDeque::new())),
            capacity: capacity.max(1),
        }
    }

    /// Appends a line, evicting the oldest entries past capacity.
    pub async fn push(&self, seq: u64, line: &str) {
        let mut lines = self.inner.write().await;
        lines.push_back((seq, line.to_string()));
        while lines.len() > self.capacity {
            lines.pop_front();
        }
    }

    /// Snapshot of the buffered lines, oldest first.
    pub async fn snapshot(&self) -> Vec<(u64, String)> {
        self.inner.read().await.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_lines_in_order() {
        let buffer = LogBuffer::with_capacity(10);
        buffer.push(1, "first").await;
        buffer.push(2, "second").await;

        let lines = buffer.snapshot().await;
        assert_eq!(
            lines,
            vec![(1, "first".to_string()), (2, "second".to_string())]
        );
    }

    #[tokio::test]
    async fn evicts_oldest_past_capacity() {
        let buffer = LogBuffer::with_capacity(2);
        buffer.push(1, "a").await;
        buffer.push(2, "b").await;
        buffer.push(3, "c").await;

        let lines = buffer.snapshot().await;
        assert_eq!(lines, vec![(2, "b".to_string()), (3, "c".to_string())]);
    }
}
