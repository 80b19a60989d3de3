use crate::error::BallotError;
use crate::events::ElectionEvent;
use crate::identity::ElectionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hash-chained record of one emitted event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: String,
    pub index: u64,
    pub election_id: ElectionId,
    pub timestamp: DateTime<Utc>,
    pub event: ElectionEvent,
    pub previous_hash: Option<String>,
    pub entry_hash: String,
}

/// Append-only event journal of one election.
///
/// Entries are only ever appended. Each entry hashes its predecessor so any
/// later edit is detectable with [`EventJournal::verify_chain`].
#[derive(Debug, Clone)]
pub struct EventJournal {
    election_id: ElectionId,
    entries: Vec<JournalEntry>,
}

impl EventJournal {
    pub fn new(election_id: ElectionId) -> Self {
        Self {
            election_id,
            entries: Vec::new(),
        }
    }

    /// Rebuild a journal from stored entries and verify the chain.
    pub fn from_entries(
        election_id: ElectionId,
        entries: Vec<JournalEntry>,
    ) -> Result<Self, BallotError> {
        let journal = Self {
            election_id,
            entries,
        };

        for (expected_index, entry) in journal.entries.iter().enumerate() {
            if entry.index != expected_index as u64 {
                return Err(BallotError::Journal(format!(
                    "journal index gap at position {} (found {})",
                    expected_index, entry.index
                )));
            }
            if entry.election_id != election_id {
                return Err(BallotError::Journal(format!(
                    "entry {} belongs to election {}",
                    entry.index, entry.election_id
                )));
            }
        }

        if !journal.verify_chain() {
            return Err(BallotError::Journal(
                "journal hash-chain verification failed".to_string(),
            ));
        }

        Ok(journal)
    }

    pub fn election_id(&self) -> ElectionId {
        self.election_id
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&JournalEntry> {
        self.entries.last()
    }

    pub fn verify_chain(&self) -> bool {
        let mut previous_hash: Option<String> = None;
        for entry in &self.entries {
            let expected = match compute_entry_hash(
                entry.index,
                &entry.election_id,
                entry.timestamp,
                &entry.event,
                previous_hash.as_deref(),
            ) {
                Ok(hash) => hash,
                Err(_) => return false,
            };
            if entry.entry_hash != expected || entry.previous_hash != previous_hash {
                return false;
            }
            previous_hash = Some(entry.entry_hash.clone());
        }
        true
    }

    /// Build the next entry without appending it.
    pub fn build_entry(&self, event: ElectionEvent) -> Result<JournalEntry, BallotError> {
        let index = self.entries.len() as u64;
        let timestamp = Utc::now();
        let previous_hash = self.entries.last().map(|entry| entry.entry_hash.clone());
        let entry_hash = compute_entry_hash(
            index,
            &self.election_id,
            timestamp,
            &event,
            previous_hash.as_deref(),
        )?;

        Ok(JournalEntry {
            entry_id: Uuid::new_v4().to_string(),
            index,
            election_id: self.election_id,
            timestamp,
            event,
            previous_hash,
            entry_hash,
        })
    }

    /// Append an entry produced by [`Self::build_entry`].
    pub fn commit_entry(&mut self, entry: JournalEntry) -> Result<(), BallotError> {
        let expected_index = self.entries.len() as u64;
        if entry.index != expected_index {
            return Err(BallotError::Journal(format!(
                "commit index mismatch: expected {}, got {}",
                expected_index, entry.index
            )));
        }

        let expected_previous_hash = self.entries.last().map(|e| e.entry_hash.clone());
        if entry.previous_hash != expected_previous_hash {
            return Err(BallotError::Journal(
                "commit previous hash mismatch".to_string(),
            ));
        }

        self.entries.push(entry);
        Ok(())
    }

    pub fn append(&mut self, event: ElectionEvent) -> Result<JournalEntry, BallotError> {
        let entry = self.build_entry(event)?;
        self.commit_entry(entry.clone())?;
        Ok(entry)
    }
}

fn compute_entry_hash(
    index: u64,
    election_id: &ElectionId,
    timestamp: DateTime<Utc>,
    event: &ElectionEvent,
    previous_hash: Option<&str>,
) -> Result<String, BallotError> {
    let material = serde_json::json!({
        "index": index,
        "election_id": election_id,
        "timestamp": timestamp,
        "event": event,
        "previous_hash": previous_hash,
    });

    let bytes =
        serde_json::to_vec(&material).map_err(|e| BallotError::Journal(e.to_string()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}
