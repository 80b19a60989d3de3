use crate::error::BallotError;
use crate::identity::Identity;
use crate::proposals::ProposalId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Registration and participation record of one whitelisted voter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    pub identity: Identity,
    pub is_registered: bool,
    pub has_voted: bool,
    pub voted_proposal_id: Option<ProposalId>,
}

impl Voter {
    fn registered(identity: Identity) -> Self {
        Self {
            identity,
            is_registered: true,
            has_voted: false,
            voted_proposal_id: None,
        }
    }
}

/// Voter whitelist. Records are never removed.
#[derive(Debug, Clone, Default)]
pub struct VoterRegistry {
    voters: HashMap<Identity, Voter>,
}

impl VoterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    pub fn get(&self, identity: &Identity) -> Option<&Voter> {
        self.voters.get(identity)
    }

    pub fn is_registered(&self, identity: &Identity) -> bool {
        self.voters
            .get(identity)
            .map(|voter| voter.is_registered)
            .unwrap_or(false)
    }

    /// Validate a registration without touching the registry.
    pub fn check_register(&self, identity: &Identity) -> Result<(), BallotError> {
        if identity.is_zero() {
            return Err(BallotError::InvalidArgument(
                "Voters cant have invalid address".to_string(),
            ));
        }
        if self.is_registered(identity) {
            return Err(BallotError::AlreadyExists("Already registered".to_string()));
        }
        Ok(())
    }

    pub fn register(&mut self, identity: Identity) -> Result<&Voter, BallotError> {
        self.check_register(&identity)?;
        let voter = self
            .voters
            .entry(identity.clone())
            .or_insert_with(|| Voter::registered(identity));
        Ok(voter)
    }

    /// Validate that `identity` may still cast a vote.
    pub fn check_can_vote(&self, identity: &Identity) -> Result<(), BallotError> {
        match self.voters.get(identity) {
            Some(voter) if voter.is_registered && voter.has_voted => Err(
                BallotError::AlreadyVoted("You have already voted".to_string()),
            ),
            Some(voter) if voter.is_registered => Ok(()),
            _ => Err(BallotError::not_voter()),
        }
    }

    /// Mark the vote. Callers must have validated the proposal id already.
    pub fn record_vote(
        &mut self,
        identity: &Identity,
        proposal_id: ProposalId,
    ) -> Result<(), BallotError> {
        self.check_can_vote(identity)?;
        let voter = self
            .voters
            .get_mut(identity)
            .ok_or_else(BallotError::not_voter)?;
        voter.has_voted = true;
        voter.voted_proposal_id = Some(proposal_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_once() {
        let mut registry = VoterRegistry::new();
        let alice = Identity::new("alice");
        let voter = registry.register(alice.clone()).unwrap();
        assert!(voter.is_registered);
        assert!(!voter.has_voted);
        assert_eq!(voter.voted_proposal_id, None);

        let err = registry.register(alice).unwrap_err();
        assert_eq!(err, BallotError::AlreadyExists("Already registered".into()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_zero_identity() {
        let mut registry = VoterRegistry::new();
        let err = registry
            .register(Identity::new("0x0000000000000000000000000000000000000000"))
            .unwrap_err();
        assert_eq!(err.message(), "Voters cant have invalid address");
        assert!(registry.is_empty());
    }

    #[test]
    fn vote_is_recorded_once() {
        let mut registry = VoterRegistry::new();
        let bob = Identity::new("bob");
        registry.register(bob.clone()).unwrap();
        registry.record_vote(&bob, 3).unwrap();

        let voter = registry.get(&bob).unwrap();
        assert!(voter.has_voted);
        assert_eq!(voter.voted_proposal_id, Some(3));

        let err = registry.record_vote(&bob, 1).unwrap_err();
        assert!(matches!(err, BallotError::AlreadyVoted(_)));
        assert_eq!(registry.get(&bob).unwrap().voted_proposal_id, Some(3));
    }

    #[test]
    fn unknown_identity_cannot_vote() {
        let registry = VoterRegistry::new();
        let err = registry.check_can_vote(&Identity::new("mallory")).unwrap_err();
        assert_eq!(err, BallotError::Unauthorized("You're not a voter".into()));
    }
}
