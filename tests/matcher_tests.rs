//! Matcher-level properties: lattice laws, cache consistency, invalidation.

use semreg::matching::{
    spawn_event_loop, ClassificationSource, ConceptMatcher, DirectConceptMatcher,
    IndexedConceptMatcher, MatchType, TaxonomyEvent,
};
use semreg::testing::InMemoryTaxonomy;
use semreg::{Concept, EngineConfig};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

fn c(uri: &str) -> Concept {
    Concept::parse(uri).unwrap()
}

fn u(uri: &str) -> Url {
    Url::parse(uri).unwrap()
}

fn zoo() -> Arc<InMemoryTaxonomy> {
    let taxonomy = Arc::new(InMemoryTaxonomy::new());
    taxonomy.add_source(
        u("urn:semreg:source:zoo"),
        [
            c("urn:zoo:animal"),
            c("urn:zoo:dog"),
            c("urn:zoo:cat"),
            c("urn:zoo:bird"),
        ],
    );
    taxonomy.add_subclass(c("urn:zoo:dog"), c("urn:zoo:animal"));
    taxonomy.add_subclass(c("urn:zoo:cat"), c("urn:zoo:animal"));
    taxonomy.add_subclass(c("urn:zoo:bird"), c("urn:zoo:animal"));
    taxonomy
}

fn zoo_concepts() -> Vec<Concept> {
    vec![
        c("urn:zoo:animal"),
        c("urn:zoo:dog"),
        c("urn:zoo:cat"),
        c("urn:zoo:bird"),
    ]
}

#[tokio::test]
async fn every_pair_has_exactly_one_strength_and_self_match_is_exact() {
    let taxonomy = zoo();
    let matcher = DirectConceptMatcher::new(
        Arc::clone(&taxonomy) as Arc<dyn ClassificationSource>,
        &EngineConfig::default(),
    );
    for a in zoo_concepts() {
        for b in zoo_concepts() {
            let result = matcher.match_concepts(&a, &b).await.unwrap();
            assert!(matches!(
                result.match_type,
                MatchType::Fail | MatchType::Subsume | MatchType::Plugin | MatchType::Exact
            ));
            if a == b {
                assert_eq!(result.match_type, MatchType::Exact);
            }
        }
    }
}

#[tokio::test]
async fn plugin_and_subsume_are_antisymmetric_over_all_pairs() {
    let taxonomy = zoo();
    let matcher = DirectConceptMatcher::new(
        Arc::clone(&taxonomy) as Arc<dyn ClassificationSource>,
        &EngineConfig::default(),
    );
    for a in zoo_concepts() {
        for b in zoo_concepts() {
            let forward = matcher.match_concepts(&a, &b).await.unwrap().match_type;
            let backward = matcher.match_concepts(&b, &a).await.unwrap().match_type;
            match forward {
                MatchType::Plugin => assert_eq!(backward, MatchType::Subsume),
                MatchType::Subsume => assert_eq!(backward, MatchType::Plugin),
                MatchType::Exact => assert_eq!(backward, MatchType::Exact),
                MatchType::Fail => assert_eq!(backward, MatchType::Fail),
            }
        }
    }
}

#[tokio::test]
async fn indexed_matcher_agrees_with_direct_matcher_after_population() {
    let taxonomy = zoo();
    let direct = DirectConceptMatcher::new(
        Arc::clone(&taxonomy) as Arc<dyn ClassificationSource>,
        &EngineConfig::default(),
    );
    let indexed = IndexedConceptMatcher::new(
        Arc::clone(&taxonomy) as Arc<dyn ClassificationSource>,
        &EngineConfig::default(),
    );
    indexed.populate().await.unwrap();

    for a in zoo_concepts() {
        for b in zoo_concepts() {
            let cached = indexed.match_concepts(&a, &b).await.unwrap();
            let fresh = direct.match_concepts(&a, &b).await.unwrap();
            assert_eq!(cached.match_type, fresh.match_type, "{a} vs {b}");
        }
    }
}

#[tokio::test]
async fn indexed_matcher_agrees_for_concepts_added_by_event() {
    let taxonomy = zoo();
    let indexed = IndexedConceptMatcher::new(
        Arc::clone(&taxonomy) as Arc<dyn ClassificationSource>,
        &EngineConfig::default(),
    );
    indexed.populate().await.unwrap();

    let fish_source = u("urn:semreg:source:fish");
    let added: HashSet<Concept> = [c("urn:zoo:fish")].into_iter().collect();
    taxonomy.add_source(fish_source.clone(), added.iter().cloned());
    taxonomy.add_subclass(c("urn:zoo:fish"), c("urn:zoo:animal"));
    indexed.on_source_created(&fish_source, &added).await.unwrap();

    let direct = DirectConceptMatcher::new(
        Arc::clone(&taxonomy) as Arc<dyn ClassificationSource>,
        &EngineConfig::default(),
    );
    for b in zoo_concepts() {
        let cached = indexed.match_concepts(&c("urn:zoo:fish"), &b).await.unwrap();
        let fresh = direct.match_concepts(&c("urn:zoo:fish"), &b).await.unwrap();
        assert_eq!(cached.match_type, fresh.match_type, "fish vs {b}");
    }
}

#[tokio::test]
async fn deletion_event_through_the_channel_removes_all_traces() {
    let taxonomy = Arc::new(InMemoryTaxonomy::new());
    taxonomy.add_source(u("urn:semreg:source:base"), [c("urn:zoo:animal")]);
    let dogs = u("urn:semreg:source:dogs");
    taxonomy.add_source(dogs.clone(), [c("urn:zoo:dog")]);
    taxonomy.add_subclass(c("urn:zoo:dog"), c("urn:zoo:animal"));

    let matcher = Arc::new(IndexedConceptMatcher::new(
        Arc::clone(&taxonomy) as Arc<dyn ClassificationSource>,
        &EngineConfig::default(),
    ));
    matcher.populate().await.unwrap();

    let (tx, rx) = tokio::sync::mpsc::channel(8);
    let invalidation = spawn_event_loop(Arc::clone(&matcher), rx);

    taxonomy.remove_source(&dogs);
    tx.send(TaxonomyEvent::ConceptSourceDeleted { source_id: dogs })
        .await
        .unwrap();
    drop(tx);
    invalidation.await.unwrap();

    let gone = matcher
        .match_concepts(&c("urn:zoo:dog"), &c("urn:zoo:animal"))
        .await
        .unwrap();
    assert_eq!(gone.match_type, MatchType::Fail);

    let animal_row = matcher
        .matches_within_range(&c("urn:zoo:animal"), MatchType::Subsume, MatchType::Exact)
        .await
        .unwrap();
    assert!(!animal_row.contains_key(&c("urn:zoo:dog")));
}

#[tokio::test]
async fn bulk_queries_filter_by_floor_ceiling_and_exact_type() {
    let taxonomy = zoo();
    let matcher = DirectConceptMatcher::new(
        Arc::clone(&taxonomy) as Arc<dyn ClassificationSource>,
        &EngineConfig::default(),
    );
    let origins: HashSet<Concept> = [c("urn:zoo:dog")].into_iter().collect();

    let at_least_plugin = matcher
        .matches_at_least(&origins, MatchType::Plugin)
        .await
        .unwrap();
    // Dog has no descendants: only the Exact self-match clears the floor.
    assert_eq!(at_least_plugin[&c("urn:zoo:dog")].len(), 1);

    let at_most_subsume = matcher
        .matches_at_most(&origins, MatchType::Subsume)
        .await
        .unwrap();
    assert_eq!(at_most_subsume[&c("urn:zoo:dog")].len(), 1);
    assert!(at_most_subsume[&c("urn:zoo:dog")].contains_key(&c("urn:zoo:animal")));

    let exactly_exact = matcher
        .matches_of_type(&origins, MatchType::Exact)
        .await
        .unwrap();
    assert_eq!(exactly_exact[&c("urn:zoo:dog")].len(), 1);
    assert!(exactly_exact[&c("urn:zoo:dog")].contains_key(&c("urn:zoo:dog")));
}
