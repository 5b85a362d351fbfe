//! In-memory collaborator implementations.
//!
//! These back the test suite and give embedders something to develop against
//! before wiring the real RDF-backed collaborators. The taxonomy answers
//! subsumption from an explicit subclass graph; the capability index is a
//! plain slot-keyed lookup built from [`Capability`] values.

use crate::discovery::types::{Capability, CapabilityUri, EntityKind, SlotKind};
use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::matching::sources::{CapabilityIndex, ClassificationSource, QueryMode};
use crate::matching::types::{Concept, MatchResult, MatchTable, MatchType};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use url::Url;

/// Matcher id stamped on results produced by [`InMemoryTaxonomy`].
pub const TAXONOMY_MATCHER_ID: &str = "urn:semreg:testing:taxonomy";

#[derive(Default)]
struct TaxonomyState {
    sources: HashMap<Url, HashSet<Concept>>,
    /// Direct superclass edges: child -> parents.
    parents: HashMap<Concept, HashSet<Concept>>,
}

impl TaxonomyState {
    fn universe(&self) -> HashSet<Concept> {
        self.sources.values().flatten().cloned().collect()
    }

    fn ancestors(&self, concept: &Concept) -> HashSet<Concept> {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<&Concept> = VecDeque::new();
        queue.push_back(concept);
        while let Some(current) = queue.pop_front() {
            if let Some(parents) = self.parents.get(current) {
                for parent in parents {
                    if seen.insert(parent.clone()) {
                        queue.push_back(parent);
                    }
                }
            }
        }
        seen
    }

    fn relation(&self, origin: &Concept, destination: &Concept) -> MatchType {
        if origin == destination {
            MatchType::Exact
        } else if self.ancestors(origin).contains(destination) {
            MatchType::Subsume
        } else if self.ancestors(destination).contains(origin) {
            MatchType::Plugin
        } else {
            MatchType::Fail
        }
    }
}

/// Classification source over an explicit in-memory subclass graph.
pub struct InMemoryTaxonomy {
    state: RwLock<TaxonomyState>,
    unavailable: AtomicBool,
}

impl InMemoryTaxonomy {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(TaxonomyState::default()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Registers a concept source (a taxonomy chunk) and the concepts it
    /// contributes. Re-registering a source replaces its concept set.
    pub fn add_source(&self, source_id: Url, concepts: impl IntoIterator<Item = Concept>) {
        let mut state = self.state.write().expect("taxonomy state lock poisoned");
        state
            .sources
            .insert(source_id, concepts.into_iter().collect());
    }

    /// Unregisters a source. Subclass edges touching its concepts are dropped
    /// unless another source still contributes the concept.
    pub fn remove_source(&self, source_id: &Url) {
        let mut state = self.state.write().expect("taxonomy state lock poisoned");
        state.sources.remove(source_id);
        let survivors = state.universe();
        state.parents.retain(|child, _| survivors.contains(child));
        for parents in state.parents.values_mut() {
            parents.retain(|parent| survivors.contains(parent));
        }
    }

    /// Declares `child` a direct subclass of `parent`.
    pub fn add_subclass(&self, child: Concept, parent: Concept) {
        let mut state = self.state.write().expect("taxonomy state lock poisoned");
        state.parents.entry(child).or_default().insert(parent);
    }

    /// Makes every call fail with `CollaboratorUnavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> DiscoveryResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(DiscoveryError::unavailable(
                "classification source",
                "simulated outage",
            ))
        } else {
            Ok(())
        }
    }

    fn explain(relation: MatchType) -> &'static str {
        match relation {
            MatchType::Exact => "concepts are identical",
            MatchType::Plugin => "destination is more specific than origin",
            MatchType::Subsume => "destination is more general than origin",
            MatchType::Fail => "no recorded relation between the concepts",
        }
    }
}

impl Default for InMemoryTaxonomy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClassificationSource for InMemoryTaxonomy {
    async fn list_concepts(&self, scope: Option<&Url>) -> DiscoveryResult<HashSet<Concept>> {
        self.check_available()?;
        let state = self.state.read().expect("taxonomy state lock poisoned");
        Ok(match scope {
            Some(source_id) => state.sources.get(source_id).cloned().unwrap_or_default(),
            None => state.universe(),
        })
    }

    async fn subsumption_matches(
        &self,
        origins: &HashSet<Concept>,
        bound: MatchType,
        mode: QueryMode,
    ) -> DiscoveryResult<MatchTable> {
        self.check_available()?;
        let state = self.state.read().expect("taxonomy state lock poisoned");
        let universe = state.universe();
        let mut table = MatchTable::new();
        for origin in origins {
            if !universe.contains(origin) {
                continue;
            }
            let mut row = HashMap::new();
            for destination in &universe {
                let relation = state.relation(origin, destination);
                if relation.is_fail() {
                    continue;
                }
                let admitted = match mode {
                    QueryMode::AtLeast => relation >= bound,
                    QueryMode::AtMost => relation <= bound,
                    QueryMode::Exactly => relation == bound,
                };
                if admitted {
                    row.insert(
                        destination.clone(),
                        MatchResult::new(
                            origin.clone(),
                            destination.clone(),
                            relation,
                            TAXONOMY_MATCHER_ID,
                        )
                        .with_explanation(Self::explain(relation)),
                    );
                }
            }
            table.insert(origin.clone(), row);
        }
        Ok(table)
    }
}

/// Capability index backed by a slot-keyed concept lookup.
pub struct InMemoryCapabilityIndex {
    entries: RwLock<HashMap<(SlotKind, EntityKind), HashMap<Concept, HashSet<CapabilityUri>>>>,
}

impl InMemoryCapabilityIndex {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Indexes a capability under every concept each of its slots declares.
    pub fn register(&self, entity: EntityKind, capability: &Capability) {
        let mut entries = self.entries.write().expect("capability index lock poisoned");
        for slot in [SlotKind::Input, SlotKind::Output, SlotKind::Classification] {
            for concept in capability.slot(slot) {
                entries
                    .entry((slot, entity))
                    .or_default()
                    .entry(concept.clone())
                    .or_default()
                    .insert(capability.uri.clone());
            }
        }
    }
}

impl Default for InMemoryCapabilityIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapabilityIndex for InMemoryCapabilityIndex {
    async fn capabilities_with_concept_in_slot(
        &self,
        concept: &Concept,
        slot: SlotKind,
        entity: EntityKind,
    ) -> DiscoveryResult<HashSet<CapabilityUri>> {
        let entries = self.entries.read().expect("capability index lock poisoned");
        Ok(entries
            .get(&(slot, entity))
            .and_then(|by_concept| by_concept.get(concept))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(uri: &str) -> Concept {
        Concept::parse(uri).unwrap()
    }

    fn u(uri: &str) -> Url {
        Url::parse(uri).unwrap()
    }

    #[test]
    fn relations_follow_the_subclass_graph() {
        let taxonomy = InMemoryTaxonomy::new();
        taxonomy.add_source(
            u("urn:s:1"),
            [c("urn:x:a"), c("urn:x:b"), c("urn:x:c")],
        );
        taxonomy.add_subclass(c("urn:x:b"), c("urn:x:a"));
        taxonomy.add_subclass(c("urn:x:c"), c("urn:x:b"));

        let state = taxonomy.state.read().unwrap();
        // Transitive ancestry counts.
        assert_eq!(state.relation(&c("urn:x:c"), &c("urn:x:a")), MatchType::Subsume);
        assert_eq!(state.relation(&c("urn:x:a"), &c("urn:x:c")), MatchType::Plugin);
        assert_eq!(state.relation(&c("urn:x:a"), &c("urn:x:a")), MatchType::Exact);
    }

    #[tokio::test]
    async fn scoped_listing_returns_one_source() {
        let taxonomy = InMemoryTaxonomy::new();
        taxonomy.add_source(u("urn:s:1"), [c("urn:x:a")]);
        taxonomy.add_source(u("urn:s:2"), [c("urn:x:b")]);
        let scoped = taxonomy.list_concepts(Some(&u("urn:s:1"))).await.unwrap();
        assert_eq!(scoped, [c("urn:x:a")].into_iter().collect());
        let all = taxonomy.list_concepts(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn index_lookup_is_per_slot_and_entity() {
        let index = InMemoryCapabilityIndex::new();
        let cap = Capability::new(CapabilityUri::parse("urn:op:feed").unwrap())
            .with_inputs([c("urn:zoo:animal")]);
        index.register(EntityKind::Operation, &cap);

        let hits = index
            .capabilities_with_concept_in_slot(
                &c("urn:zoo:animal"),
                SlotKind::Input,
                EntityKind::Operation,
            )
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let misses = index
            .capabilities_with_concept_in_slot(
                &c("urn:zoo:animal"),
                SlotKind::Output,
                EntityKind::Operation,
            )
            .await
            .unwrap();
        assert!(misses.is_empty());

        let wrong_entity = index
            .capabilities_with_concept_in_slot(
                &c("urn:zoo:animal"),
                SlotKind::Input,
                EntityKind::Service,
            )
            .await
            .unwrap();
        assert!(wrong_entity.is_empty());
    }
}
