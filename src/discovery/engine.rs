//! Discovery engine: answers "which capabilities satisfy these concepts".
//!
//! Pipeline per query: expand every required concept into the set of concepts
//! that can satisfy it at the requested strictness, look each expanded concept
//! up in the capability index, UNION-merge per requirement, then combine the
//! per-requirement maps (intersection for ALL, union for SOME).

use crate::config::EngineConfig;
use crate::discovery::combinators::{intersection_merge, union_merge, CandidateMap};
use crate::discovery::types::{CapabilityUri, EntityKind, RankedMatch, SlotKind};
use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::matching::matcher::ConceptMatcher;
use crate::matching::sources::CapabilityIndex;
use crate::matching::types::{Concept, MatchType};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::debug;

pub struct DiscoveryEngine {
    matcher: Arc<dyn ConceptMatcher>,
    index: Arc<dyn CapabilityIndex>,
    config: EngineConfig,
}

impl DiscoveryEngine {
    pub fn new(
        matcher: Arc<dyn ConceptMatcher>,
        index: Arc<dyn CapabilityIndex>,
        config: EngineConfig,
    ) -> Self {
        Self {
            matcher,
            index,
            config,
        }
    }

    /// Capabilities satisfying **every** required concept (ALL semantics).
    ///
    /// An empty requirement set yields an empty map. A required concept
    /// unknown to the taxonomy has an empty expansion, which empties the
    /// intersection; that is a correct answer, not an error.
    pub async fn find_all(
        &self,
        required: &HashSet<Concept>,
        floor: MatchType,
        slot: SlotKind,
        entity: EntityKind,
    ) -> DiscoveryResult<HashMap<CapabilityUri, RankedMatch>> {
        let maps = self.candidate_maps(required, floor, slot, entity).await?;
        let merged = intersection_merge(maps);
        debug!(required = required.len(), candidates = merged.len(), "find_all answered");
        Ok(merged)
    }

    /// Capabilities satisfying **any** required concept (SOME semantics).
    pub async fn find_some(
        &self,
        required: &HashSet<Concept>,
        floor: MatchType,
        slot: SlotKind,
        entity: EntityKind,
    ) -> DiscoveryResult<HashMap<CapabilityUri, RankedMatch>> {
        let maps = self.candidate_maps(required, floor, slot, entity).await?;
        let merged = union_merge(maps);
        debug!(required = required.len(), candidates = merged.len(), "find_some answered");
        Ok(merged)
    }

    async fn candidate_maps(
        &self,
        required: &HashSet<Concept>,
        floor: MatchType,
        slot: SlotKind,
        entity: EntityKind,
    ) -> DiscoveryResult<Vec<CandidateMap>> {
        let lookups = required
            .iter()
            .map(|concept| self.candidates_for(concept, floor, slot, entity));
        join_all(lookups).await.into_iter().collect()
    }

    /// The per-requirement map `M(t)`: every capability reachable through the
    /// expansion set of `t`, UNION-merged (one capability may be reachable
    /// through several expanded concepts).
    async fn candidates_for(
        &self,
        required: &Concept,
        floor: MatchType,
        slot: SlotKind,
        entity: EntityKind,
    ) -> DiscoveryResult<CandidateMap> {
        let row = self
            .bounded(
                "classification source",
                self.matcher
                    .matches_within_range(required, MatchType::Subsume, MatchType::Exact),
            )
            .await?;
        let expansion: Vec<_> = row
            .into_values()
            .filter(|result| admits(floor, result.match_type))
            .collect();

        let lookups = expansion.into_iter().map(|result| async move {
            let capabilities = self
                .bounded(
                    "capability index",
                    self.index
                        .capabilities_with_concept_in_slot(&result.destination, slot, entity),
                )
                .await?;
            Ok::<_, DiscoveryError>((result, capabilities))
        });

        let mut candidates = CandidateMap::new();
        for looked_up in join_all(lookups).await {
            let (result, capabilities) = looked_up?;
            for capability in capabilities {
                candidates
                    .entry(capability)
                    .and_modify(|ranked| ranked.absorb(result.clone()))
                    .or_insert_with(|| RankedMatch::single(result.clone()));
            }
        }
        Ok(candidates)
    }

    /// Bounds a collaborator call by the configured deadline; a timeout is
    /// the same transient failure as an unreachable collaborator.
    async fn bounded<T>(
        &self,
        collaborator: &str,
        fut: impl Future<Output = DiscoveryResult<T>>,
    ) -> DiscoveryResult<T> {
        match timeout(self.config.collaborator_timeout(), fut).await {
            Ok(answer) => answer,
            Err(_) => Err(DiscoveryError::unavailable(collaborator, "deadline exceeded")),
        }
    }
}

/// Whether a destination of this strength belongs to the expansion set at the
/// requested floor.
///
/// The floor widens as it loosens: `Exact` admits identity only, `Subsume`
/// also admits more general concepts (a capability stated against an ancestor
/// can be invoked with the requirement), and `Plugin` admits every non-`Fail`
/// relation. `Fail` is read as "no strictness requested" and treated like
/// `Plugin`.
fn admits(floor: MatchType, strength: MatchType) -> bool {
    if strength.is_fail() {
        return false;
    }
    match floor {
        MatchType::Exact => strength == MatchType::Exact,
        MatchType::Subsume => matches!(strength, MatchType::Subsume | MatchType::Exact),
        MatchType::Plugin | MatchType::Fail => true,
    }
}

/// Orders a result map by descending composite strength, capabilities with
/// equal strength by URI for a stable answer.
pub fn rank(results: &HashMap<CapabilityUri, RankedMatch>) -> Vec<(CapabilityUri, RankedMatch)> {
    let mut ordered: Vec<_> = results
        .iter()
        .map(|(capability, ranked)| (capability.clone(), ranked.clone()))
        .collect();
    ordered.sort_by(|(ua, ra), (ub, rb)| {
        rb.match_type
            .cmp(&ra.match_type)
            .then_with(|| ua.cmp(ub))
    });
    ordered
}
