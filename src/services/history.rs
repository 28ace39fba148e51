// src/services/history.rs
use crate::models::{EmbeddedImage, EraId, HistoryEntry};
use std::collections::VecDeque;
use uuid::Uuid;

pub const HISTORY_CAPACITY: usize = 10;

/// Most-recent-first record of successful transformations. Entries are
/// never edited or reordered; the oldest falls off once capacity is reached.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, era: EraId, image: EmbeddedImage, timestamp: i64) -> HistoryEntry {
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            era,
            image_url: image,
            timestamp,
        };
        self.entries.push_front(entry.clone());
        self.entries.truncate(HISTORY_CAPACITY);
        entry
    }

    pub fn get(&self, id: &Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}
