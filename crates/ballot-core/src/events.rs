use crate::identity::Identity;
use crate::proposals::ProposalId;
use crate::workflow::WorkflowStatus;
use serde::{Deserialize, Serialize};

/// Notification emitted by each successful mutating call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ElectionEvent {
    VoterRegistered {
        voter: Identity,
    },
    ProposalRegistered {
        proposal_id: ProposalId,
    },
    Voted {
        voter: Identity,
        proposal_id: ProposalId,
    },
    WorkflowStatusChange {
        previous_status: WorkflowStatus,
        new_status: WorkflowStatus,
    },
}

impl ElectionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::VoterRegistered { .. } => "VoterRegistered",
            Self::ProposalRegistered { .. } => "ProposalRegistered",
            Self::Voted { .. } => "Voted",
            Self::WorkflowStatusChange { .. } => "WorkflowStatusChange",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_tag() {
        let event = ElectionEvent::Voted {
            voter: Identity::new("voter1"),
            proposal_id: 0,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"event": "Voted", "voter": "voter1", "proposal_id": 0})
        );
        assert_eq!(event.name(), "Voted");
    }

    #[test]
    fn status_change_carries_both_phases() {
        let event = ElectionEvent::WorkflowStatusChange {
            previous_status: WorkflowStatus::VotingSessionEnded,
            new_status: WorkflowStatus::VotesTallied,
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["previous_status"], "VotingSessionEnded");
        assert_eq!(value["new_status"], "VotesTallied");
    }
}
