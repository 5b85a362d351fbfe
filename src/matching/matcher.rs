//! Concept matchers: pairwise and bulk subsumption queries over a taxonomy.

use crate::config::EngineConfig;
use crate::errors::DiscoveryResult;
use crate::matching::sources::{ClassificationSource, QueryMode};
use crate::matching::types::{Concept, MatchResult, MatchTable, MatchType};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Answers match queries between concepts using the match lattice.
///
/// `match_concepts` never reports "no relation" as an error or an absent
/// value: the answer is a `Fail` result. The bulk operations are each a
/// single batched round trip to the classification source.
#[async_trait]
pub trait ConceptMatcher: Send + Sync {
    /// Strength of the relation from `origin` to `destination`.
    async fn match_concepts(
        &self,
        origin: &Concept,
        destination: &Concept,
    ) -> DiscoveryResult<MatchResult>;

    /// Per origin, all destinations matching with strength `>= floor`.
    async fn matches_at_least(
        &self,
        origins: &HashSet<Concept>,
        floor: MatchType,
    ) -> DiscoveryResult<MatchTable>;

    /// Per origin, all destinations matching with strength `<= ceiling`.
    /// `Fail` rows are never part of the answer, so a ceiling of `Fail`
    /// yields empty rows.
    async fn matches_at_most(
        &self,
        origins: &HashSet<Concept>,
        ceiling: MatchType,
    ) -> DiscoveryResult<MatchTable>;

    /// Per origin, only the destinations matching with exactly this strength.
    async fn matches_of_type(
        &self,
        origins: &HashSet<Concept>,
        match_type: MatchType,
    ) -> DiscoveryResult<MatchTable>;

    /// All destinations of a single origin whose strength lies in the closed
    /// range `[min, max]`. Empty map (not `Fail`) if the origin is unknown.
    async fn matches_within_range(
        &self,
        origin: &Concept,
        min: MatchType,
        max: MatchType,
    ) -> DiscoveryResult<HashMap<Concept, MatchResult>>;
}

/// Uncached matcher delegating every query straight to the classification
/// source. One round trip per call, including pairwise queries.
pub struct DirectConceptMatcher {
    source: Arc<dyn ClassificationSource>,
    matcher_id: String,
}

impl DirectConceptMatcher {
    pub fn new(source: Arc<dyn ClassificationSource>, config: &EngineConfig) -> Self {
        Self {
            source,
            matcher_id: config.matcher_id.clone(),
        }
    }

    pub fn matcher_id(&self) -> &str {
        &self.matcher_id
    }

    fn singleton(origin: &Concept) -> HashSet<Concept> {
        std::iter::once(origin.clone()).collect()
    }
}

#[async_trait]
impl ConceptMatcher for DirectConceptMatcher {
    async fn match_concepts(
        &self,
        origin: &Concept,
        destination: &Concept,
    ) -> DiscoveryResult<MatchResult> {
        // One batched call for the origin's whole row, then a local lookup:
        // a pair absent from the row has no recorded relation.
        let mut table = self
            .source
            .subsumption_matches(&Self::singleton(origin), MatchType::Subsume, QueryMode::AtLeast)
            .await?;
        let found = table
            .get_mut(origin)
            .and_then(|row| row.remove(destination));
        Ok(found.unwrap_or_else(|| {
            MatchResult::fail(origin.clone(), destination.clone(), &self.matcher_id)
        }))
    }

    async fn matches_at_least(
        &self,
        origins: &HashSet<Concept>,
        floor: MatchType,
    ) -> DiscoveryResult<MatchTable> {
        if origins.is_empty() {
            return Ok(MatchTable::new());
        }
        // At-least-Fail would admit everything the source never materializes;
        // the loosest answerable floor is Subsume.
        let floor = floor.max(MatchType::Subsume);
        self.source
            .subsumption_matches(origins, floor, QueryMode::AtLeast)
            .await
    }

    async fn matches_at_most(
        &self,
        origins: &HashSet<Concept>,
        ceiling: MatchType,
    ) -> DiscoveryResult<MatchTable> {
        if origins.is_empty() || ceiling.is_fail() {
            return Ok(MatchTable::new());
        }
        self.source
            .subsumption_matches(origins, ceiling, QueryMode::AtMost)
            .await
    }

    async fn matches_of_type(
        &self,
        origins: &HashSet<Concept>,
        match_type: MatchType,
    ) -> DiscoveryResult<MatchTable> {
        if origins.is_empty() || match_type.is_fail() {
            return Ok(MatchTable::new());
        }
        self.source
            .subsumption_matches(origins, match_type, QueryMode::Exactly)
            .await
    }

    async fn matches_within_range(
        &self,
        origin: &Concept,
        min: MatchType,
        max: MatchType,
    ) -> DiscoveryResult<HashMap<Concept, MatchResult>> {
        if max < min || max.is_fail() {
            return Ok(HashMap::new());
        }
        let min = min.max(MatchType::Subsume);
        let mut table = self
            .source
            .subsumption_matches(&Self::singleton(origin), min, QueryMode::AtLeast)
            .await?;
        let mut row = table.remove(origin).unwrap_or_default();
        row.retain(|_, result| result.match_type <= max);
        debug!(origin = %origin, %min, %max, destinations = row.len(), "range query answered");
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryTaxonomy;

    fn c(uri: &str) -> Concept {
        Concept::parse(uri).unwrap()
    }

    async fn zoo() -> (Arc<InMemoryTaxonomy>, DirectConceptMatcher) {
        let taxonomy = Arc::new(InMemoryTaxonomy::new());
        let source = Url::parse("urn:semreg:source:zoo").unwrap();
        taxonomy.add_source(
            source,
            [c("urn:zoo:animal"), c("urn:zoo:dog"), c("urn:zoo:cat")],
        );
        taxonomy.add_subclass(c("urn:zoo:dog"), c("urn:zoo:animal"));
        taxonomy.add_subclass(c("urn:zoo:cat"), c("urn:zoo:animal"));
        let matcher = DirectConceptMatcher::new(
            Arc::clone(&taxonomy) as Arc<dyn ClassificationSource>,
            &EngineConfig::default(),
        );
        (taxonomy, matcher)
    }

    use url::Url;

    #[tokio::test]
    async fn self_match_is_exact() {
        let (_t, matcher) = zoo().await;
        let dog = c("urn:zoo:dog");
        let result = matcher.match_concepts(&dog, &dog).await.unwrap();
        assert_eq!(result.match_type, MatchType::Exact);
    }

    #[tokio::test]
    async fn plugin_and_subsume_are_antisymmetric() {
        let (_t, matcher) = zoo().await;
        let dog = c("urn:zoo:dog");
        let animal = c("urn:zoo:animal");
        let up = matcher.match_concepts(&dog, &animal).await.unwrap();
        let down = matcher.match_concepts(&animal, &dog).await.unwrap();
        assert_eq!(up.match_type, MatchType::Subsume);
        assert_eq!(down.match_type, MatchType::Plugin);
    }

    #[tokio::test]
    async fn unrelated_concepts_fail_rather_than_error() {
        let (_t, matcher) = zoo().await;
        let result = matcher
            .match_concepts(&c("urn:zoo:dog"), &c("urn:zoo:cat"))
            .await
            .unwrap();
        assert_eq!(result.match_type, MatchType::Fail);
        assert_eq!(result.matcher_id, EngineConfig::default().matcher_id);
    }

    #[tokio::test]
    async fn range_filter_is_inclusive_band() {
        let (_t, matcher) = zoo().await;
        let animal = c("urn:zoo:animal");
        let row = matcher
            .matches_within_range(&animal, MatchType::Plugin, MatchType::Plugin)
            .await
            .unwrap();
        // Both subclasses, but not the Exact self-match.
        assert_eq!(row.len(), 2);
        assert!(row.values().all(|r| r.match_type == MatchType::Plugin));
    }

    #[tokio::test]
    async fn unknown_origin_yields_empty_row() {
        let (_t, matcher) = zoo().await;
        let row = matcher
            .matches_within_range(&c("urn:zoo:ghost"), MatchType::Subsume, MatchType::Exact)
            .await
            .unwrap();
        assert!(row.is_empty());
    }
}
