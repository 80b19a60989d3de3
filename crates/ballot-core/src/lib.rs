//! Ballot core: a permissioned voting workflow.
//!
//! A single administrator drives an election through a fixed sequence of
//! phases (voter registration, proposal registration, voting, tallying).
//! Whitelisted voters submit proposals and cast one vote each while the
//! matching phase is open. Tallying picks the proposal with the most votes,
//! the lowest proposal id winning ties.
//!
//! Every mutating call passes the access gate, then the workflow phase check,
//! then mutates the registries and appends exactly one event to the election's
//! hash-chained journal. A failed call leaves the election untouched.

#![deny(unsafe_code)]

pub mod access;
pub mod election;
pub mod error;
pub mod events;
pub mod identity;
pub mod journal;
pub mod proposals;
pub mod registry;
pub mod tally;
pub mod voters;
pub mod workflow;

pub use access::AccessGate;
pub use election::{Election, ElectionSummary};
pub use error::{BallotError, ErrorKind};
pub use events::ElectionEvent;
pub use identity::{ElectionId, Identity};
pub use journal::{EventJournal, JournalEntry};
pub use proposals::{Proposal, ProposalId, ProposalRegistry};
pub use registry::{ElectionHandle, ElectionRegistry};
pub use tally::{tally, TallyOutcome};
pub use voters::{Voter, VoterRegistry};
pub use workflow::{WorkflowStateMachine, WorkflowStatus};
