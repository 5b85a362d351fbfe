//! Collaborator interfaces consumed by the matching core.
//!
//! Both collaborators are remote, potentially expensive query services in a
//! real deployment (an RDF store behind SPARQL in the original system), so
//! the interfaces are batched: one call answers a whole set of origins.
//! Implementations are injected as `Arc<dyn ...>`; the engine never reaches
//! for ambient global state.

use crate::discovery::types::{CapabilityUri, EntityKind, SlotKind};
use crate::errors::DiscoveryResult;
use crate::matching::types::{Concept, MatchTable, MatchType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// How the `bound` argument of a subsumption query is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    /// Destinations whose match strength is `>= bound`.
    AtLeast,
    /// Destinations whose match strength is `<= bound`.
    AtMost,
    /// Destinations whose match strength is exactly `bound`.
    Exactly,
}

/// Answers subsumption queries over a concept taxonomy.
///
/// Contract:
/// - `subsumption_matches` is a single batched round trip regardless of how
///   many origins are passed;
/// - `Fail` rows are never materialized: a pair absent from the answer has no
///   recorded relation;
/// - every concept a source knows has a reflexive `Exact` self-match in its
///   answers, so "concept unknown to the taxonomy" is observable as an empty
///   row;
/// - unreachability surfaces as `DiscoveryError::CollaboratorUnavailable`.
#[async_trait]
pub trait ClassificationSource: Send + Sync {
    /// All concepts known to the taxonomy, optionally restricted to one
    /// registered concept source.
    async fn list_concepts(&self, scope: Option<&Url>) -> DiscoveryResult<HashSet<Concept>>;

    /// For each origin, the destinations whose match strength satisfies
    /// `mode`/`bound`, with the strength of each pair.
    async fn subsumption_matches(
        &self,
        origins: &HashSet<Concept>,
        bound: MatchType,
        mode: QueryMode,
    ) -> DiscoveryResult<MatchTable>;
}

/// Looks up the capabilities that declare a concept in a given slot.
///
/// Read-only during discovery; the engine never mutates a capability.
#[async_trait]
pub trait CapabilityIndex: Send + Sync {
    async fn capabilities_with_concept_in_slot(
        &self,
        concept: &Concept,
        slot: SlotKind,
        entity: EntityKind,
    ) -> DiscoveryResult<HashSet<CapabilityUri>>;
}
