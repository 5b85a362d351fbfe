//! Core of a semantic web-service registry: given a taxonomy of concepts and
//! a catalogue of capabilities whose slots reference those concepts, decide
//! which capabilities satisfy a request and how well.
//!
//! The crate is the matching and discovery engine only. Format importers,
//! RDF storage, and the REST surface are external collaborators, reached
//! through the [`matching::ClassificationSource`] and
//! [`matching::CapabilityIndex`] interfaces and the
//! [`matching::TaxonomyEvent`] notification channel.
//!
//! Typical wiring:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use semreg::{EngineConfig, DiscoveryEngine, IndexedConceptMatcher};
//! # use semreg::matching::{spawn_event_loop, ClassificationSource, CapabilityIndex};
//! # fn wire(taxonomy: Arc<dyn ClassificationSource>, catalogue: Arc<dyn CapabilityIndex>) {
//! let config = EngineConfig::default();
//! let matcher = Arc::new(IndexedConceptMatcher::new(taxonomy, &config));
//! let (events_tx, events_rx) = tokio::sync::mpsc::channel(64);
//! let _invalidation = spawn_event_loop(Arc::clone(&matcher), events_rx);
//! let engine = DiscoveryEngine::new(matcher, catalogue, config);
//! # let _ = (engine, events_tx);
//! # }
//! ```

pub mod config;
pub mod discovery;
pub mod errors;
pub mod matching;
pub mod testing;

pub use config::EngineConfig;
pub use discovery::{Capability, CapabilityUri, DiscoveryEngine, EntityKind, RankedMatch, SlotKind};
pub use errors::{DiscoveryError, DiscoveryResult};
pub use matching::{
    CompositeMatchType, Concept, ConceptMatcher, DirectConceptMatcher, IndexedConceptMatcher,
    MatchResult, MatchType,
};
