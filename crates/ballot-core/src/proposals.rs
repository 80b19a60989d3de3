use crate::error::BallotError;
use serde::{Deserialize, Serialize};

/// Proposal identifier: the 0-based insertion index.
pub type ProposalId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub description: String,
    pub vote_count: u64,
}

/// Ordered proposal list. Ids are contiguous and never reused.
#[derive(Debug, Clone, Default)]
pub struct ProposalRegistry {
    proposals: Vec<Proposal>,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn get(&self, id: ProposalId) -> Result<&Proposal, BallotError> {
        usize::try_from(id)
            .ok()
            .and_then(|index| self.proposals.get(index))
            .ok_or_else(BallotError::proposal_not_found)
    }

    pub fn check_description(description: &str) -> Result<(), BallotError> {
        if description.trim().is_empty() {
            return Err(BallotError::InvalidArgument(
                "Vous ne pouvez pas ne rien proposer".to_string(),
            ));
        }
        Ok(())
    }

    /// Append a proposal and return its id.
    pub fn submit(&mut self, description: impl Into<String>) -> Result<ProposalId, BallotError> {
        let description = description.into();
        Self::check_description(&description)?;
        let id = self.proposals.len() as ProposalId;
        self.proposals.push(Proposal {
            description,
            vote_count: 0,
        });
        Ok(id)
    }

    pub fn increment(&mut self, id: ProposalId) -> Result<u64, BallotError> {
        let proposal = usize::try_from(id)
            .ok()
            .and_then(|index| self.proposals.get_mut(index))
            .ok_or_else(BallotError::proposal_not_found)?;
        proposal.vote_count += 1;
        Ok(proposal.vote_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_from_zero() {
        let mut registry = ProposalRegistry::new();
        assert_eq!(registry.submit("P0").unwrap(), 0);
        assert_eq!(registry.submit("P1").unwrap(), 1);
        assert_eq!(registry.submit("P2").unwrap(), 2);
        assert_eq!(registry.get(1).unwrap().description, "P1");
        assert_eq!(registry.get(1).unwrap().vote_count, 0);
    }

    #[test]
    fn rejects_empty_description() {
        let mut registry = ProposalRegistry::new();
        let err = registry.submit("").unwrap_err();
        assert_eq!(
            err,
            BallotError::InvalidArgument("Vous ne pouvez pas ne rien proposer".into())
        );
        assert!(registry.submit("  \t").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn unknown_id_is_not_found() {
        let mut registry = ProposalRegistry::new();
        registry.submit("only").unwrap();
        assert_eq!(
            registry.get(10).unwrap_err(),
            BallotError::NotFound("Proposal not found".into())
        );
        assert!(registry.increment(u64::MAX).is_err());
        assert_eq!(registry.increment(0).unwrap(), 1);
    }
}
