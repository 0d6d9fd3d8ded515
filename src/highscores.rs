//! High score leaderboard system
//!
//! Persisted through a key-value store, tracks top 10 scores.

use serde::{Deserialize, Serialize};

use crate::persistence::{KeyValueStore, load_json, save_json};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;
/// Longest accepted player name (characters, after trimming)
pub const MAX_NAME_LEN: usize = 20;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Player's name (trimmed, non-empty)
    pub name: String,
    /// Player's score
    pub score: i64,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// Trim a submitted name and cap its length; None if nothing is left
pub fn clean_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(MAX_NAME_LEN).collect::<String>().trim_end().to_string())
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "robot_runner_highscores";

    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score would make the leaderboard
    pub fn qualifies(&self, score: i64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: i64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard
    ///
    /// Ties rank below existing entries with the same score. Returns the rank
    /// achieved (1-indexed) or None if it fell off the bottom.
    pub fn add_score(&mut self, name: String, score: i64, timestamp: f64) -> Option<usize> {
        let entry = HighScoreEntry {
            name,
            score,
            timestamp,
        };

        // Find insertion point (sorted descending by score)
        let pos = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        (pos < MAX_HIGH_SCORES).then_some(pos + 1)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<i64> {
        self.entries.first().map(|e| e.score)
    }

    /// Restore ordering and size after loading data we didn't write ourselves
    fn normalize(&mut self) {
        self.entries.retain(|e| !e.name.trim().is_empty());
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_HIGH_SCORES);
    }

    /// Load high scores; missing or unreadable data yields an empty board
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<HighScores>(store, Self::STORAGE_KEY) {
            Ok(Some(mut scores)) => {
                scores.normalize();
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Ok(None) => {
                log::info!("No high scores found, starting fresh");
                Self::new()
            }
            Err(e) => {
                log::warn!("Failed to read high scores ({e}), starting fresh");
                Self::new()
            }
        }
    }

    /// Save high scores; a failed write is logged, not retried
    pub fn save(&self, store: &mut dyn KeyValueStore) {
        match save_json(store, Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("High scores saved ({} entries)", self.entries.len()),
            Err(e) => log::warn!("Failed to save high scores: {e}"),
        }
    }
}

/// Format a timestamp as a relative date string
pub fn format_date(timestamp: f64, now: f64) -> String {
    let diff_secs = (now - timestamp) / 1000.0;
    let diff_mins = diff_secs / 60.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i64;
        match days {
            1 => "Yesterday".to_string(),
            d if d < 7 => format!("{} days ago", d),
            d if d < 14 => "Last week".to_string(),
            d => format!("{} weeks ago", d / 7),
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as i64;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as i64;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}
