//! # Sync
//!
//! A bounded log of serialized commands for sharing edits between editors. Each record gets an id one
//! greater than the last, starting from 1. Collaborators poll with the last id they've seen and replay
//! whatever is newer.
//!
//! Only the most recent [`DEFAULT_CAPACITY`] records are kept. A collaborator that falls further behind
//! than that gets a gap, detectable as the first returned id being more than one past what it asked for.

use crate::commands::serialize::{SerializeError, SerializedCommand};
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 500;
/// Largest accepted command, in bytes of JSON.
pub const MAX_COMMAND_BYTES: usize = 2 * 1024 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("command of {0} bytes exceeds the limit of {MAX_COMMAND_BYTES}")]
    TooLarge(usize),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CommandRecord {
    pub id: u64,
    pub data: SerializedCommand,
}

#[derive(Clone, Debug)]
pub struct CommandLog {
    last_id: u64,
    capacity: usize,
    records: VecDeque<CommandRecord>,
}
impl Default for CommandLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
impl CommandLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
    /// A log keeping at most `capacity` records, minimum one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            last_id: 0,
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
    /// Id of the newest record, or 0 if nothing was ever pushed.
    #[must_use]
    pub fn last_id(&self) -> u64 {
        self.last_id
    }
    /// Append a command, dropping the oldest if full. Returns the new record's id.
    pub fn push(&mut self, command: SerializedCommand) -> u64 {
        self.last_id += 1;
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(CommandRecord {
            id: self.last_id,
            data: command,
        });
        self.last_id
    }
    /// Append a command, refusing it if its JSON is larger than [`MAX_COMMAND_BYTES`].
    pub fn push_checked(&mut self, command: SerializedCommand) -> Result<u64, SyncError> {
        let size = serde_json::to_vec(&command)
            .map_err(SerializeError::from)?
            .len();
        if size > MAX_COMMAND_BYTES {
            return Err(SyncError::TooLarge(size));
        }
        Ok(self.push(command))
    }
    /// Append a command received as JSON, checking it describes a valid command first.
    pub fn push_json(&mut self, json: &str) -> Result<u64, SyncError> {
        if json.len() > MAX_COMMAND_BYTES {
            return Err(SyncError::TooLarge(json.len()));
        }
        let serialized: SerializedCommand =
            serde_json::from_str(json).map_err(SerializeError::from)?;
        crate::commands::Command::deserialize(&serialized)?;
        Ok(self.push(serialized))
    }
    /// Every retained record with an id strictly greater than `id`, oldest first.
    pub fn commands_since(&self, id: u64) -> impl Iterator<Item = &CommandRecord> + '_ {
        // Ids are contiguous, so the start can be found without searching.
        let first_id = self.records.front().map_or(0, |record| record.id);
        let skip = id.saturating_add(1).saturating_sub(first_id);
        self.records
            .iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
    }
}
