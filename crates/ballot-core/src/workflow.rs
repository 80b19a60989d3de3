use crate::error::BallotError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Election phases, in lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkflowStatus {
    RegisteringVoters,
    ProposalsRegistrationStarted,
    ProposalsRegistrationEnded,
    VotingSessionStarted,
    VotingSessionEnded,
    VotesTallied,
}

impl WorkflowStatus {
    pub const ALL: [WorkflowStatus; 6] = [
        Self::RegisteringVoters,
        Self::ProposalsRegistrationStarted,
        Self::ProposalsRegistrationEnded,
        Self::VotingSessionStarted,
        Self::VotingSessionEnded,
        Self::VotesTallied,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::RegisteringVoters => "RegisteringVoters",
            Self::ProposalsRegistrationStarted => "ProposalsRegistrationStarted",
            Self::ProposalsRegistrationEnded => "ProposalsRegistrationEnded",
            Self::VotingSessionStarted => "VotingSessionStarted",
            Self::VotingSessionEnded => "VotingSessionEnded",
            Self::VotesTallied => "VotesTallied",
        }
    }

    /// Position in the lifecycle, starting at 0.
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// The only legal forward successor; `None` for the terminal phase.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::RegisteringVoters => Some(Self::ProposalsRegistrationStarted),
            Self::ProposalsRegistrationStarted => Some(Self::ProposalsRegistrationEnded),
            Self::ProposalsRegistrationEnded => Some(Self::VotingSessionStarted),
            Self::VotingSessionStarted => Some(Self::VotingSessionEnded),
            Self::VotingSessionEnded => Some(Self::VotesTallied),
            Self::VotesTallied => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl Default for WorkflowStatus {
    fn default() -> Self {
        Self::RegisteringVoters
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Forward-only election lifecycle.
///
/// Each transition is legal from exactly one phase. The state machine only
/// checks legality; authorization happens in [`crate::AccessGate`] before any
/// transition is attempted.
#[derive(Debug, Clone, Default)]
pub struct WorkflowStateMachine {
    status: WorkflowStatus,
}

impl WorkflowStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    /// Fail with `InvalidPhase(message)` unless the current phase is `expected`.
    pub fn require(&self, expected: WorkflowStatus, message: &str) -> Result<(), BallotError> {
        if self.status != expected {
            return Err(BallotError::InvalidPhase(message.to_string()));
        }
        Ok(())
    }

    pub fn start_proposals_registering(
        &mut self,
    ) -> Result<(WorkflowStatus, WorkflowStatus), BallotError> {
        self.advance(
            WorkflowStatus::RegisteringVoters,
            "Registering proposals cant be started now",
        )
    }

    pub fn end_proposals_registering(
        &mut self,
    ) -> Result<(WorkflowStatus, WorkflowStatus), BallotError> {
        self.advance(
            WorkflowStatus::ProposalsRegistrationStarted,
            "Registering proposals havent started yet",
        )
    }

    pub fn start_voting_session(
        &mut self,
    ) -> Result<(WorkflowStatus, WorkflowStatus), BallotError> {
        self.advance(
            WorkflowStatus::ProposalsRegistrationEnded,
            "Registering proposals phase is not finished",
        )
    }

    pub fn end_voting_session(&mut self) -> Result<(WorkflowStatus, WorkflowStatus), BallotError> {
        self.advance(
            WorkflowStatus::VotingSessionStarted,
            "Voting session havent started yet",
        )
    }

    /// Check that tallying may run, without moving. The tally engine computes
    /// the winner between this check and [`Self::mark_tallied`].
    pub fn check_tally(&self) -> Result<(), BallotError> {
        self.require(
            WorkflowStatus::VotingSessionEnded,
            "Current status is not voting session ended",
        )
    }

    pub fn mark_tallied(&mut self) -> Result<(WorkflowStatus, WorkflowStatus), BallotError> {
        self.advance(
            WorkflowStatus::VotingSessionEnded,
            "Current status is not voting session ended",
        )
    }

    /// Recovery override: set any phase, bypassing the forward-only rule.
    pub fn force(&mut self, status: WorkflowStatus) -> (WorkflowStatus, WorkflowStatus) {
        let previous = self.status;
        self.status = status;
        (previous, status)
    }

    fn advance(
        &mut self,
        expected_current: WorkflowStatus,
        message: &str,
    ) -> Result<(WorkflowStatus, WorkflowStatus), BallotError> {
        self.require(expected_current, message)?;
        let next = expected_current
            .next()
            .ok_or_else(|| BallotError::InvalidPhase(message.to_string()))?;
        self.status = next;
        Ok((expected_current, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_the_full_lifecycle() {
        let mut machine = WorkflowStateMachine::new();
        assert_eq!(machine.status(), WorkflowStatus::RegisteringVoters);
        machine.start_proposals_registering().unwrap();
        machine.end_proposals_registering().unwrap();
        machine.start_voting_session().unwrap();
        machine.end_voting_session().unwrap();
        machine.check_tally().unwrap();
        let (previous, next) = machine.mark_tallied().unwrap();
        assert_eq!(previous, WorkflowStatus::VotingSessionEnded);
        assert_eq!(next, WorkflowStatus::VotesTallied);
        assert!(machine.status().is_terminal());
    }

    #[test]
    fn rejects_skipping_a_phase() {
        let mut machine = WorkflowStateMachine::new();
        let err = machine.start_voting_session().unwrap_err();
        assert_eq!(
            err,
            BallotError::InvalidPhase("Registering proposals phase is not finished".into())
        );
        assert_eq!(machine.status(), WorkflowStatus::RegisteringVoters);
    }

    #[test]
    fn rejects_going_backward() {
        let mut machine = WorkflowStateMachine::new();
        machine.force(WorkflowStatus::ProposalsRegistrationStarted);
        let err = machine.start_proposals_registering().unwrap_err();
        assert_eq!(err.message(), "Registering proposals cant be started now");
    }

    #[test]
    fn terminal_phase_has_no_successor() {
        let mut machine = WorkflowStateMachine::new();
        machine.force(WorkflowStatus::VotesTallied);
        assert!(machine.start_proposals_registering().is_err());
        assert!(machine.end_proposals_registering().is_err());
        assert!(machine.start_voting_session().is_err());
        assert!(machine.end_voting_session().is_err());
        assert!(machine.check_tally().is_err());
    }

    #[test]
    fn ordinals_follow_lifecycle_order() {
        for (index, status) in WorkflowStatus::ALL.iter().enumerate() {
            assert_eq!(status.ordinal() as usize, index);
        }
    }
}
