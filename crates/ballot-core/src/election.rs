use crate::access::AccessGate;
use crate::error::BallotError;
use crate::events::ElectionEvent;
use crate::identity::{ElectionId, Identity};
use crate::journal::{EventJournal, JournalEntry};
use crate::proposals::{Proposal, ProposalId, ProposalRegistry};
use crate::tally::{tally, TallyOutcome};
use crate::voters::{Voter, VoterRegistry};
use crate::workflow::{WorkflowStateMachine, WorkflowStatus};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One election: administrator, phase, registries and event journal.
///
/// Every mutating operation runs its checks in a fixed order (access gate,
/// phase, arguments, registry constraints) and only then mutates. The journal
/// entry is built before the mutation, so a failure at any step leaves the
/// election exactly as it was.
#[derive(Debug, Clone)]
pub struct Election {
    id: ElectionId,
    gate: AccessGate,
    workflow: WorkflowStateMachine,
    voters: VoterRegistry,
    proposals: ProposalRegistry,
    outcome: Option<TallyOutcome>,
    journal: EventJournal,
}

/// Read-only overview of an election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSummary {
    pub election_id: ElectionId,
    pub administrator: Identity,
    pub status: WorkflowStatus,
    pub voter_count: usize,
    pub proposal_count: usize,
    pub winning_proposal_id: Option<ProposalId>,
}

impl Election {
    pub fn new(id: ElectionId, administrator: Identity) -> Result<Self, BallotError> {
        if administrator.is_zero() {
            return Err(BallotError::InvalidArgument(
                "administrator cant have invalid address".to_string(),
            ));
        }
        info!(election_id = %id, administrator = %administrator, "Election created");
        Ok(Self {
            id,
            gate: AccessGate::new(administrator),
            workflow: WorkflowStateMachine::new(),
            voters: VoterRegistry::new(),
            proposals: ProposalRegistry::new(),
            outcome: None,
            journal: EventJournal::new(id),
        })
    }

    pub fn create(administrator: Identity) -> Result<Self, BallotError> {
        Self::new(ElectionId::generate(), administrator)
    }

    pub fn id(&self) -> ElectionId {
        self.id
    }

    pub fn administrator(&self) -> &Identity {
        self.gate.administrator()
    }

    pub fn workflow_status(&self) -> WorkflowStatus {
        self.workflow.status()
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    pub fn journal(&self) -> &EventJournal {
        &self.journal
    }

    pub fn tally_outcome(&self) -> Option<&TallyOutcome> {
        self.outcome.as_ref()
    }

    pub fn summary(&self) -> ElectionSummary {
        ElectionSummary {
            election_id: self.id,
            administrator: self.administrator().clone(),
            status: self.workflow.status(),
            voter_count: self.voters.len(),
            proposal_count: self.proposals.len(),
            winning_proposal_id: self.winner_id().ok(),
        }
    }

    // --- voter registry ---

    pub fn add_voter(
        &mut self,
        caller: &Identity,
        voter: Identity,
    ) -> Result<JournalEntry, BallotError> {
        self.gate.require_admin(caller)?;
        self.workflow.require(
            WorkflowStatus::RegisteringVoters,
            "Voters registration is not open yet",
        )?;
        self.voters.check_register(&voter)?;

        let entry = self.journal.build_entry(ElectionEvent::VoterRegistered {
            voter: voter.clone(),
        })?;
        self.voters.register(voter.clone())?;
        let entry = self.commit(entry)?;
        info!(election_id = %self.id, voter = %voter, "Voter registered");
        Ok(entry)
    }

    /// Any registered voter may look up any voter record.
    pub fn get_voter(&self, caller: &Identity, voter: &Identity) -> Result<Voter, BallotError> {
        self.gate.require_registered_voter(caller, &self.voters)?;
        self.voters
            .get(voter)
            .cloned()
            .ok_or_else(|| BallotError::NotFound("Voter not found".to_string()))
    }

    // --- proposal registry ---

    pub fn add_proposal(
        &mut self,
        caller: &Identity,
        description: impl Into<String>,
    ) -> Result<JournalEntry, BallotError> {
        let description = description.into();
        self.gate.require_registered_voter(caller, &self.voters)?;
        self.workflow.require(
            WorkflowStatus::ProposalsRegistrationStarted,
            "Proposals are not allowed yet",
        )?;
        ProposalRegistry::check_description(&description)?;

        let proposal_id = self.proposals.len() as ProposalId;
        let entry = self
            .journal
            .build_entry(ElectionEvent::ProposalRegistered { proposal_id })?;
        let assigned = self.proposals.submit(description)?;
        debug_assert_eq!(assigned, proposal_id);
        let entry = self.commit(entry)?;
        info!(election_id = %self.id, proposal_id, proposer = %caller, "Proposal registered");
        Ok(entry)
    }

    pub fn get_one_proposal(
        &self,
        caller: &Identity,
        proposal_id: ProposalId,
    ) -> Result<Proposal, BallotError> {
        self.gate.require_registered_voter(caller, &self.voters)?;
        self.proposals.get(proposal_id).cloned()
    }

    // --- voting and tallying ---

    pub fn set_vote(
        &mut self,
        caller: &Identity,
        proposal_id: ProposalId,
    ) -> Result<JournalEntry, BallotError> {
        self.gate.require_registered_voter(caller, &self.voters)?;
        self.workflow.require(
            WorkflowStatus::VotingSessionStarted,
            "Voting session havent started yet",
        )?;
        self.voters.check_can_vote(caller)?;
        self.proposals.get(proposal_id)?;

        let entry = self.journal.build_entry(ElectionEvent::Voted {
            voter: caller.clone(),
            proposal_id,
        })?;
        let vote_count = self.proposals.increment(proposal_id)?;
        self.voters.record_vote(caller, proposal_id)?;
        let entry = self.commit(entry)?;
        info!(election_id = %self.id, voter = %caller, proposal_id, vote_count, "Vote recorded");
        Ok(entry)
    }

    pub fn tally_votes(&mut self, caller: &Identity) -> Result<JournalEntry, BallotError> {
        self.gate.require_admin(caller)?;
        self.workflow.check_tally()?;

        let outcome = tally(self.proposals.proposals());
        let entry = self.journal.build_entry(ElectionEvent::WorkflowStatusChange {
            previous_status: WorkflowStatus::VotingSessionEnded,
            new_status: WorkflowStatus::VotesTallied,
        })?;
        self.workflow.mark_tallied()?;

        if outcome.is_tie() {
            debug!(
                election_id = %self.id,
                tied = ?outcome.tied,
                "Tie resolved in favour of the earliest proposal"
            );
        }
        let winner = outcome.winning_proposal_id;
        let votes = outcome.winning_vote_count;
        self.outcome = Some(outcome);
        let entry = self.commit(entry)?;
        info!(election_id = %self.id, winner = ?winner, votes, "Votes tallied");
        Ok(entry)
    }

    /// Winning proposal id, available once votes are tallied.
    pub fn winner_id(&self) -> Result<ProposalId, BallotError> {
        self.workflow
            .require(WorkflowStatus::VotesTallied, "Votes are not tallied yet")?;
        self.outcome
            .as_ref()
            .and_then(|outcome| outcome.winning_proposal_id)
            .ok_or_else(|| BallotError::NotFound("No winning proposal".to_string()))
    }

    // --- workflow transitions ---

    pub fn start_proposals_registering(
        &mut self,
        caller: &Identity,
    ) -> Result<JournalEntry, BallotError> {
        self.gate.require_admin(caller)?;
        self.transition(WorkflowStateMachine::start_proposals_registering)
    }

    pub fn end_proposals_registering(
        &mut self,
        caller: &Identity,
    ) -> Result<JournalEntry, BallotError> {
        self.gate.require_admin(caller)?;
        self.transition(WorkflowStateMachine::end_proposals_registering)
    }

    pub fn start_voting_session(&mut self, caller: &Identity) -> Result<JournalEntry, BallotError> {
        self.gate.require_admin(caller)?;
        self.transition(WorkflowStateMachine::start_voting_session)
    }

    pub fn end_voting_session(&mut self, caller: &Identity) -> Result<JournalEntry, BallotError> {
        self.gate.require_admin(caller)?;
        self.transition(WorkflowStateMachine::end_voting_session)
    }

    /// Recovery entry point: set any phase, ignoring the forward-only rule.
    ///
    /// Kept apart from the regular transitions; transports should only expose
    /// it when explicitly enabled.
    pub fn override_workflow_status(
        &mut self,
        caller: &Identity,
        status: WorkflowStatus,
    ) -> Result<JournalEntry, BallotError> {
        self.gate.require_admin(caller)?;
        let entry = self.journal.build_entry(ElectionEvent::WorkflowStatusChange {
            previous_status: self.workflow.status(),
            new_status: status,
        })?;
        let (previous, next) = self.workflow.force(status);
        let entry = self.commit(entry)?;
        warn!(
            election_id = %self.id,
            previous = %previous,
            next = %next,
            "Workflow status overridden"
        );
        Ok(entry)
    }

    fn transition(
        &mut self,
        step: fn(&mut WorkflowStateMachine) -> Result<(WorkflowStatus, WorkflowStatus), BallotError>,
    ) -> Result<JournalEntry, BallotError> {
        // Dry-run on a copy so the journal entry can be built before the move.
        let mut probe = self.workflow.clone();
        let (previous, next) = step(&mut probe)?;
        let entry = self.journal.build_entry(ElectionEvent::WorkflowStatusChange {
            previous_status: previous,
            new_status: next,
        })?;
        self.workflow = probe;
        let entry = self.commit(entry)?;
        info!(election_id = %self.id, previous = %previous, next = %next, "Workflow status changed");
        Ok(entry)
    }

    fn commit(&mut self, entry: JournalEntry) -> Result<JournalEntry, BallotError> {
        self.journal.commit_entry(entry.clone())?;
        Ok(entry)
    }
}
