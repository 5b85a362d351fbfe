//! Concept matching: the match lattice, the collaborator interfaces, and the
//! direct and indexed matchers.

pub mod events;
pub mod indexed;
pub mod matcher;
pub mod sources;
pub mod types;

pub use events::{spawn_event_loop, TaxonomyEvent};
pub use indexed::IndexedConceptMatcher;
pub use matcher::{ConceptMatcher, DirectConceptMatcher};
pub use sources::{CapabilityIndex, ClassificationSource, QueryMode};
pub use types::{CompositeMatchType, Concept, MatchResult, MatchTable, MatchType};
