//! Elections keyed by id, each behind its own serialization point.

use crate::election::{Election, ElectionSummary};
use crate::error::BallotError;
use crate::identity::{ElectionId, Identity};
use crate::journal::JournalEntry;
use crate::proposals::{Proposal, ProposalId};
use crate::tally::TallyOutcome;
use crate::voters::Voter;
use crate::workflow::WorkflowStatus;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::{debug, info, instrument};

pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Owns every election of a service instance.
///
/// Each election sits behind its own mutex, held for the whole
/// check-then-mutate sequence of an operation. Journal entries of successful
/// calls are fanned out to subscribers after the lock is released.
pub struct ElectionRegistry {
    elections: RwLock<HashMap<ElectionId, Arc<Mutex<Election>>>>,
    events: broadcast::Sender<JournalEntry>,
}

impl Default for ElectionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

impl ElectionRegistry {
    pub fn new(event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            elections: RwLock::new(HashMap::new()),
            events,
        }
    }

    /// Receive every journal entry appended by any election from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<JournalEntry> {
        self.events.subscribe()
    }

    pub async fn create(&self, administrator: Identity) -> Result<ElectionHandle, BallotError> {
        let election = Election::create(administrator)?;
        let id = election.id();
        let cell = Arc::new(Mutex::new(election));
        self.elections.write().await.insert(id, cell.clone());
        info!(election_id = %id, "Election registered");
        Ok(ElectionHandle {
            id,
            election: cell,
            events: self.events.clone(),
        })
    }

    pub async fn get(&self, id: ElectionId) -> Result<ElectionHandle, BallotError> {
        let elections = self.elections.read().await;
        let cell = elections
            .get(&id)
            .cloned()
            .ok_or_else(|| BallotError::NotFound(format!("election '{}' not found", id)))?;
        Ok(ElectionHandle {
            id,
            election: cell,
            events: self.events.clone(),
        })
    }

    pub async fn list(&self) -> Vec<ElectionSummary> {
        let cells: Vec<Arc<Mutex<Election>>> =
            self.elections.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(cells.len());
        for cell in cells {
            summaries.push(cell.lock().await.summary());
        }
        summaries.sort_by_key(|summary| summary.election_id.to_string());
        summaries
    }

    pub async fn len(&self) -> usize {
        self.elections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.elections.read().await.is_empty()
    }
}

/// Shared access to one election.
#[derive(Clone)]
pub struct ElectionHandle {
    id: ElectionId,
    election: Arc<Mutex<Election>>,
    events: broadcast::Sender<JournalEntry>,
}

impl ElectionHandle {
    pub fn id(&self) -> ElectionId {
        self.id
    }

    #[instrument(skip(self), fields(election_id = %self.id))]
    pub async fn add_voter(
        &self,
        caller: &Identity,
        voter: Identity,
    ) -> Result<JournalEntry, BallotError> {
        self.mutate(|election| election.add_voter(caller, voter))
            .await
    }

    pub async fn get_voter(&self, caller: &Identity, voter: &Identity) -> Result<Voter, BallotError> {
        self.election.lock().await.get_voter(caller, voter)
    }

    #[instrument(skip(self, description), fields(election_id = %self.id))]
    pub async fn add_proposal(
        &self,
        caller: &Identity,
        description: String,
    ) -> Result<JournalEntry, BallotError> {
        self.mutate(|election| election.add_proposal(caller, description))
            .await
    }

    pub async fn get_one_proposal(
        &self,
        caller: &Identity,
        proposal_id: ProposalId,
    ) -> Result<Proposal, BallotError> {
        self.election.lock().await.get_one_proposal(caller, proposal_id)
    }

    #[instrument(skip(self), fields(election_id = %self.id))]
    pub async fn set_vote(
        &self,
        caller: &Identity,
        proposal_id: ProposalId,
    ) -> Result<JournalEntry, BallotError> {
        self.mutate(|election| election.set_vote(caller, proposal_id))
            .await
    }

    #[instrument(skip(self), fields(election_id = %self.id))]
    pub async fn start_proposals_registering(
        &self,
        caller: &Identity,
    ) -> Result<JournalEntry, BallotError> {
        self.mutate(|election| election.start_proposals_registering(caller))
            .await
    }

    #[instrument(skip(self), fields(election_id = %self.id))]
    pub async fn end_proposals_registering(
        &self,
        caller: &Identity,
    ) -> Result<JournalEntry, BallotError> {
        self.mutate(|election| election.end_proposals_registering(caller))
            .await
    }

    #[instrument(skip(self), fields(election_id = %self.id))]
    pub async fn start_voting_session(&self, caller: &Identity) -> Result<JournalEntry, BallotError> {
        self.mutate(|election| election.start_voting_session(caller))
            .await
    }

    #[instrument(skip(self), fields(election_id = %self.id))]
    pub async fn end_voting_session(&self, caller: &Identity) -> Result<JournalEntry, BallotError> {
        self.mutate(|election| election.end_voting_session(caller))
            .await
    }

    #[instrument(skip(self), fields(election_id = %self.id))]
    pub async fn tally_votes(&self, caller: &Identity) -> Result<JournalEntry, BallotError> {
        self.mutate(|election| election.tally_votes(caller)).await
    }

    #[instrument(skip(self), fields(election_id = %self.id))]
    pub async fn override_workflow_status(
        &self,
        caller: &Identity,
        status: WorkflowStatus,
    ) -> Result<JournalEntry, BallotError> {
        self.mutate(|election| election.override_workflow_status(caller, status))
            .await
    }

    pub async fn winner_id(&self) -> Result<ProposalId, BallotError> {
        self.election.lock().await.winner_id()
    }

    pub async fn tally_outcome(&self) -> Option<TallyOutcome> {
        self.election.lock().await.tally_outcome().cloned()
    }

    pub async fn workflow_status(&self) -> WorkflowStatus {
        self.election.lock().await.workflow_status()
    }

    pub async fn summary(&self) -> ElectionSummary {
        self.election.lock().await.summary()
    }

    pub async fn journal_entries(&self) -> Vec<JournalEntry> {
        self.election.lock().await.journal().entries().to_vec()
    }

    async fn mutate<F>(&self, op: F) -> Result<JournalEntry, BallotError>
    where
        F: FnOnce(&mut Election) -> Result<JournalEntry, BallotError>,
    {
        let entry = {
            let mut election = self.election.lock().await;
            op(&mut election)?
        };
        if self.events.send(entry.clone()).is_err() {
            debug!(election_id = %self.id, "No event subscribers");
        }
        Ok(entry)
    }
}
