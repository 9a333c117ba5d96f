//! Per-session turn log with bounded-window reads.
//!
//! The log is append-only. By default it grows for the lifetime of the
//! session; an optional cap drops the oldest turns once exceeded.

use std::collections::VecDeque;

use postgame_types::chat::{Role, Turn};

/// Ordered log of the turns exchanged in one session.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    turns: VecDeque<Turn>,
    /// Maximum turns retained. `None` keeps everything.
    cap: Option<usize>,
}

impl HistoryStore {
    /// An empty, uncapped log.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty log that retains at most `cap` turns.
    ///
    /// A cap of zero is treated as no cap.
    pub fn with_cap(cap: Option<usize>) -> Self {
        Self {
            turns: VecDeque::new(),
            cap: cap.filter(|c| *c > 0),
        }
    }

    /// Append one turn to the tail of the log.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push_back(Turn::new(role, content));
        if let Some(cap) = self.cap {
            while self.turns.len() > cap {
                self.turns.pop_front();
            }
        }
    }

    /// The most recent `max_turns` turns in chronological order.
    ///
    /// Returns the whole log when it is shorter than `max_turns`.
    pub fn window(&self, max_turns: usize) -> Vec<Turn> {
        let skip = self.turns.len().saturating_sub(max_turns);
        self.turns.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }
}
