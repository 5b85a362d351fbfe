//! Capability discovery: candidate-map combinators and the query engine.

pub mod combinators;
pub mod engine;
pub mod types;

pub use combinators::{intersection_merge, union_merge, CandidateMap};
pub use engine::{rank, DiscoveryEngine};
pub use types::{Capability, CapabilityUri, EntityKind, RankedMatch, SlotKind};
