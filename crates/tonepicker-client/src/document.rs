use serde::{Deserialize, Serialize};

/// Oldest snapshots are dropped first once history grows past this.
pub const MAX_HISTORY: usize = 50;

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The user's working text plus an undo/redo history of snapshots.
///
/// `current_index` points at the snapshot matching `text`, or is `-1` when
/// history is empty. It always stays within `-1..history.len()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDocument {
    pub text: String,
    pub history: Vec<String>,
    pub current_index: i64,
    pub timestamp: i64,
}

impl Default for ClientDocument {
    fn default() -> Self {
        Self {
            text: String::new(),
            history: Vec::new(),
            current_index: -1,
            timestamp: now_millis(),
        }
    }
}

impl ClientDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `text` current and push it as a new snapshot. Anything that
    /// could have been redone is discarded.
    pub fn record(&mut self, text: impl Into<String>) {
        let text = text.into();
        let keep = (self.current_index + 1).clamp(0, self.history.len() as i64) as usize;
        self.history.truncate(keep);
        self.history.push(text.clone());
        self.drop_oldest_past_cap();
        self.current_index = self.history.len() as i64 - 1;
        self.text = text;
        self.timestamp = now_millis();
    }

    pub fn can_undo(&self) -> bool {
        self.position() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position() + 1 < self.history.len() as i64
    }

    pub fn undo(&mut self) -> bool {
        self.can_undo() && self.move_to(self.position() - 1)
    }

    pub fn redo(&mut self) -> bool {
        self.can_redo() && self.move_to(self.position() + 1)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Copy with history capped at [`MAX_HISTORY`] (newest kept) and the
    /// index shifted with it, then clamped into bounds.
    pub fn normalized(&self) -> Self {
        let mut doc = self.clone();
        let dropped = doc.drop_oldest_past_cap();
        doc.current_index = clamp_index(self.current_index - dropped as i64, doc.history.len());
        doc
    }

    /// `current_index` clamped into bounds; the fields are public, so it
    /// may have been set to anything.
    fn position(&self) -> i64 {
        clamp_index(self.current_index, self.history.len())
    }

    fn move_to(&mut self, index: i64) -> bool {
        let Some(text) = usize::try_from(index).ok().and_then(|i| self.history.get(i)) else {
            return false;
        };
        self.text = text.clone();
        self.current_index = index;
        self.timestamp = now_millis();
        true
    }

    fn drop_oldest_past_cap(&mut self) -> usize {
        let excess = self.history.len().saturating_sub(MAX_HISTORY);
        self.history.drain(..excess);
        excess
    }
}

pub(crate) fn clamp_index(index: i64, history_len: usize) -> i64 {
    index.clamp(-1, history_len as i64 - 1)
}
