//! Bounded, oldest-evicted message history of a room.

use std::collections::VecDeque;

use super::message::ChatMessage;

/// Maximum number of messages a room keeps
pub const HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<ChatMessage>,
    capacity: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Create a history holding at most `capacity` messages (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, HISTORY_CAPACITY);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message, evicting the oldest one when full.
    ///
    /// Returns the evicted message, if any.
    pub fn push(&mut self, message: ChatMessage) -> Option<ChatMessage> {
        self.entries.push_back(message);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copy of the entries, oldest first
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.entries.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(n: usize) -> ChatMessage {
        ChatMessage::chat(None, "1", format!("message {}", n))
    }

    #[test]
    fn test_push_below_capacity_keeps_everything() {
        // テスト項目: 容量未満では全てのメッセージが保持される
        // given (前提条件):
        let mut history = History::new();

        // when (操作):
        let evicted: Vec<_> = (0..3).filter_map(|n| history.push(chat(n))).collect();

        // then (期待する結果):
        assert!(evicted.is_empty());
        assert_eq!(history.len(), 3);
        assert_eq!(history.snapshot()[0], chat(0));
    }

    #[test]
    fn test_push_over_capacity_evicts_oldest() {
        // テスト項目: 容量を超えると最も古いメッセージから削除される
        // given (前提条件):
        let mut history = History::new();
        for n in 0..HISTORY_CAPACITY {
            history.push(chat(n));
        }

        // when (操作):
        let evicted = history.push(chat(HISTORY_CAPACITY));

        // then (期待する結果):
        assert_eq!(evicted, Some(chat(0)));
        assert_eq!(history.len(), HISTORY_CAPACITY);
        let snapshot = history.snapshot();
        assert_eq!(snapshot.first(), Some(&chat(1)));
        assert_eq!(snapshot.last(), Some(&chat(HISTORY_CAPACITY)));
    }

    #[test]
    fn test_length_never_exceeds_capacity() {
        // テスト項目: 何件追加しても長さは上限を超えない
        // given (前提条件):
        let mut history = History::new();

        for n in 0..(HISTORY_CAPACITY * 3 + 7) {
            // when (操作):
            history.push(chat(n));

            // then (期待する結果):
            assert!(history.len() <= HISTORY_CAPACITY);
        }
    }

    #[test]
    fn test_capacity_is_clamped() {
        // テスト項目: 指定容量は 1 以上、上限以下に丸められる
        // given (前提条件):

        // when (操作):
        let tiny = History::with_capacity(0);
        let huge = History::with_capacity(HISTORY_CAPACITY * 10);

        // then (期待する結果):
        assert_eq!(tiny.capacity(), 1);
        assert_eq!(huge.capacity(), HISTORY_CAPACITY);
    }
}
