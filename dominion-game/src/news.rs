//! Round-tagged news feed.
use serde::{Deserialize, Serialize};

use crate::empire::EmpireId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsEntry {
    pub round: u32,
    pub key: String,
    #[serde(default)]
    pub actor: Option<EmpireId>,
    #[serde(default)]
    pub target: Option<EmpireId>,
    #[serde(default)]
    pub detail: String,
}

/// Bounded feed; the oldest entries fall off once `capacity` is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsFeed {
    entries: Vec<NewsEntry>,
    capacity: usize,
}

impl Default for NewsFeed {
    fn default() -> Self {
        Self::with_capacity(200)
    }
}

impl NewsFeed {
    #[must_use]
    pub const fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn push(
        &mut self,
        round: u32,
        key: &str,
        actor: Option<EmpireId>,
        target: Option<EmpireId>,
        detail: impl Into<String>,
    ) {
        self.entries.push(NewsEntry {
            round,
            key: key.to_string(),
            actor,
            target,
            detail: detail.into(),
        });
        if self.entries.len() > self.capacity {
            let overflow = self.entries.len() - self.capacity;
            self.entries.drain(..overflow);
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[NewsEntry] {
        &self.entries
    }

    pub fn for_round(&self, round: u32) -> impl Iterator<Item = &NewsEntry> {
        self.entries.iter().filter(move |entry| entry.round == round)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_drops_oldest_entries_past_capacity() {
        let mut feed = NewsFeed::with_capacity(3);
        for round in 1..=5 {
            feed.push(round, "news.test", Some(1), None, format!("r{round}"));
        }
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.entries()[0].round, 3);
        assert_eq!(feed.for_round(5).count(), 1);
        assert_eq!(feed.for_round(1).count(), 0);
    }
}
