//! Winner selection.
//!
//! The winner is the proposal with the strictly greatest vote count. When
//! several proposals share the maximum, the one submitted first (lowest id)
//! wins. Ties are reported in [`TallyOutcome::tied`] but are not an error.

use crate::proposals::{Proposal, ProposalId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyOutcome {
    /// `None` only when there were no proposals.
    pub winning_proposal_id: Option<ProposalId>,
    pub winning_vote_count: u64,
    /// Every proposal sharing the maximum vote count, in id order.
    pub tied: Vec<ProposalId>,
    pub total_votes: u64,
}

impl TallyOutcome {
    pub fn is_tie(&self) -> bool {
        self.tied.len() > 1
    }
}

pub fn tally(proposals: &[Proposal]) -> TallyOutcome {
    let mut winner: Option<(ProposalId, u64)> = None;
    let mut total_votes = 0u64;

    for (index, proposal) in proposals.iter().enumerate() {
        total_votes += proposal.vote_count;
        // strict comparison keeps the earliest maximum
        let better = match winner {
            Some((_, best)) => proposal.vote_count > best,
            None => true,
        };
        if better {
            winner = Some((index as ProposalId, proposal.vote_count));
        }
    }

    let winning_vote_count = winner.map(|(_, count)| count).unwrap_or(0);
    let tied = match winner {
        Some(_) => proposals
            .iter()
            .enumerate()
            .filter(|(_, p)| p.vote_count == winning_vote_count)
            .map(|(index, _)| index as ProposalId)
            .collect(),
        None => Vec::new(),
    };

    TallyOutcome {
        winning_proposal_id: winner.map(|(id, _)| id),
        winning_vote_count,
        tied,
        total_votes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn proposals(counts: &[u64]) -> Vec<Proposal> {
        counts
            .iter()
            .enumerate()
            .map(|(i, count)| Proposal {
                description: format!("P{}", i),
                vote_count: *count,
            })
            .collect()
    }

    #[test]
    fn picks_the_strict_maximum() {
        let outcome = tally(&proposals(&[0, 1, 2]));
        assert_eq!(outcome.winning_proposal_id, Some(2));
        assert_eq!(outcome.winning_vote_count, 2);
        assert_eq!(outcome.total_votes, 3);
        assert!(!outcome.is_tie());
    }

    #[test]
    fn lowest_index_wins_a_tie() {
        let outcome = tally(&proposals(&[1, 3, 0, 3]));
        assert_eq!(outcome.winning_proposal_id, Some(1));
        assert_eq!(outcome.tied, vec![1, 3]);
        assert!(outcome.is_tie());
    }

    #[test]
    fn no_votes_at_all_selects_first_proposal() {
        let outcome = tally(&proposals(&[0, 0]));
        assert_eq!(outcome.winning_proposal_id, Some(0));
        assert_eq!(outcome.winning_vote_count, 0);
    }

    #[test]
    fn no_proposals_has_no_winner() {
        let outcome = tally(&[]);
        assert_eq!(outcome.winning_proposal_id, None);
        assert!(outcome.tied.is_empty());
    }

    proptest! {
        #[test]
        fn winner_is_first_index_of_maximum(counts in proptest::collection::vec(0u64..5, 1..20)) {
            let outcome = tally(&proposals(&counts));
            let max = *counts.iter().max().unwrap();
            let first = counts.iter().position(|c| *c == max).unwrap() as ProposalId;
            prop_assert_eq!(outcome.winning_proposal_id, Some(first));
            prop_assert_eq!(outcome.winning_vote_count, max);
            prop_assert_eq!(outcome.tied.first().copied(), Some(first));
        }
    }
}
