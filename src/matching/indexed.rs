//! Cached concept matcher backed by a concurrent match index.
//!
//! The index maps each known origin concept to its full non-`Fail` match row,
//! built with one bulk query against the classification source and kept
//! current by taxonomy-change events. Reads are lock-free with respect to each
//! other; a single concept's row is always replaced wholesale, never patched
//! in place, so readers observe either the old or the new row.

use crate::config::EngineConfig;
use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::matching::events::TaxonomyEvent;
use crate::matching::matcher::{ConceptMatcher, DirectConceptMatcher};
use crate::matching::sources::ClassificationSource;
use crate::matching::types::{Concept, MatchResult, MatchTable, MatchType};
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

/// Write-through cache over a [`DirectConceptMatcher`].
///
/// Population is lazy and single-flight: the first query (or an explicit
/// [`populate`](Self::populate) call at startup) fetches the whole concept
/// universe and its match rows; concurrent queries arriving during population
/// wait on the same attempt. A failed attempt leaves the cache untouched and
/// unpopulated, so later queries retry instead of reading poisoned data.
pub struct IndexedConceptMatcher {
    source: Arc<dyn ClassificationSource>,
    direct: DirectConceptMatcher,
    index: DashMap<Concept, HashMap<Concept, MatchResult>>,
    populated: OnceCell<()>,
    population_attempts: u32,
}

impl IndexedConceptMatcher {
    pub fn new(source: Arc<dyn ClassificationSource>, config: &EngineConfig) -> Self {
        Self {
            direct: DirectConceptMatcher::new(Arc::clone(&source), config),
            source,
            index: DashMap::new(),
            populated: OnceCell::new(),
            population_attempts: config.population_attempts.max(1),
        }
    }

    /// Eagerly populates the index. Safe to call concurrently; only one
    /// population runs, everyone else waits for its outcome.
    pub async fn populate(&self) -> DiscoveryResult<()> {
        self.ensure_populated().await
    }

    pub fn is_populated(&self) -> bool {
        self.populated.initialized()
    }

    /// Number of origin concepts currently indexed.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    async fn ensure_populated(&self) -> DiscoveryResult<()> {
        self.populated
            .get_or_try_init(|| async {
                let mut attempt = 1;
                loop {
                    match self.populate_once().await {
                        Ok(()) => return Ok(()),
                        Err(e) if attempt < self.population_attempts => {
                            warn!(error = %e, attempt, "match index population failed, retrying");
                            attempt += 1;
                        }
                        Err(e) => {
                            return Err(DiscoveryError::IndexPopulation(e.to_string()));
                        }
                    }
                }
            })
            .await
            .map(|_| ())
    }

    async fn populate_once(&self) -> DiscoveryResult<()> {
        let universe = self.source.list_concepts(None).await?;
        // Subsume is the loosest non-failing floor, so one at-least query
        // also carries every Plugin and Exact pair.
        let mut table = self
            .direct
            .matches_at_least(&universe, MatchType::Subsume)
            .await?;
        for concept in universe.iter() {
            let row = table.remove(concept).unwrap_or_default();
            self.index.insert(concept.clone(), row);
        }
        info!(concepts = universe.len(), "match index populated");
        Ok(())
    }

    /// Applies one taxonomy-change event. Tolerates concurrent invocation;
    /// rows are swapped atomically per concept.
    pub async fn handle_event(&self, event: &TaxonomyEvent) -> DiscoveryResult<()> {
        match event {
            TaxonomyEvent::ConceptSourceCreated {
                source_id,
                added_concepts,
            } => self.on_source_created(source_id, added_concepts).await,
            TaxonomyEvent::ConceptSourceDeleted { source_id } => {
                self.on_source_deleted(source_id).await
            }
        }
    }

    /// Recomputes match rows for exactly the newly registered concepts.
    ///
    /// Rows of pre-existing concepts are deliberately left untouched even
    /// though they may now match the new concepts as destinations; an
    /// existing origin's row only learns about them when that origin is
    /// repopulated. This mirrors the registry's historical invalidation
    /// behavior.
    pub async fn on_source_created(
        &self,
        source_id: &Url,
        added_concepts: &HashSet<Concept>,
    ) -> DiscoveryResult<()> {
        if added_concepts.is_empty() {
            return Ok(());
        }
        self.ensure_populated().await?;
        let mut table = self
            .direct
            .matches_at_least(added_concepts, MatchType::Subsume)
            .await?;
        for concept in added_concepts {
            let row = table.remove(concept).unwrap_or_default();
            self.index.insert(concept.clone(), row);
        }
        debug!(source = %source_id, added = added_concepts.len(), "match index extended");
        Ok(())
    }

    /// Drops every trace of concepts that no longer exist: entries whose
    /// origin is gone, and removed destinations inside surviving rows.
    /// An event for concepts that were never cached is a no-op.
    pub async fn on_source_deleted(&self, source_id: &Url) -> DiscoveryResult<()> {
        self.ensure_populated().await?;
        let survivors = self.source.list_concepts(None).await?;
        let before = self.index.len();
        self.index.retain(|origin, _| survivors.contains(origin));
        for mut entry in self.index.iter_mut() {
            entry
                .value_mut()
                .retain(|destination, _| survivors.contains(destination));
        }
        debug!(
            source = %source_id,
            removed = before - self.index.len(),
            remaining = self.index.len(),
            "match index pruned"
        );
        Ok(())
    }

    fn row_filtered<F>(&self, origin: &Concept, keep: F) -> HashMap<Concept, MatchResult>
    where
        F: Fn(MatchType) -> bool,
    {
        match self.index.get(origin) {
            Some(row) => row
                .iter()
                .filter(|(_, result)| keep(result.match_type))
                .map(|(destination, result)| (destination.clone(), result.clone()))
                .collect(),
            None => HashMap::new(),
        }
    }

    fn table_filtered<F>(&self, origins: &HashSet<Concept>, keep: F) -> MatchTable
    where
        F: Fn(MatchType) -> bool + Copy,
    {
        origins
            .iter()
            .filter(|origin| self.index.contains_key(origin))
            .map(|origin| (origin.clone(), self.row_filtered(origin, keep)))
            .collect()
    }
}

#[async_trait]
impl ConceptMatcher for IndexedConceptMatcher {
    async fn match_concepts(
        &self,
        origin: &Concept,
        destination: &Concept,
    ) -> DiscoveryResult<MatchResult> {
        self.ensure_populated().await?;
        let cached = self
            .index
            .get(origin)
            .and_then(|row| row.get(destination).cloned());
        Ok(cached.unwrap_or_else(|| {
            MatchResult::fail(origin.clone(), destination.clone(), self.direct.matcher_id())
        }))
    }

    async fn matches_at_least(
        &self,
        origins: &HashSet<Concept>,
        floor: MatchType,
    ) -> DiscoveryResult<MatchTable> {
        self.ensure_populated().await?;
        Ok(self.table_filtered(origins, |t| t >= floor && !t.is_fail()))
    }

    async fn matches_at_most(
        &self,
        origins: &HashSet<Concept>,
        ceiling: MatchType,
    ) -> DiscoveryResult<MatchTable> {
        self.ensure_populated().await?;
        Ok(self.table_filtered(origins, |t| t <= ceiling && !t.is_fail()))
    }

    async fn matches_of_type(
        &self,
        origins: &HashSet<Concept>,
        match_type: MatchType,
    ) -> DiscoveryResult<MatchTable> {
        self.ensure_populated().await?;
        Ok(self.table_filtered(origins, |t| t == match_type && !t.is_fail()))
    }

    async fn matches_within_range(
        &self,
        origin: &Concept,
        min: MatchType,
        max: MatchType,
    ) -> DiscoveryResult<HashMap<Concept, MatchResult>> {
        self.ensure_populated().await?;
        if max < min {
            return Ok(HashMap::new());
        }
        Ok(self.row_filtered(origin, |t| t >= min && t <= max && !t.is_fail()))
    }
}
