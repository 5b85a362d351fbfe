//! Merging of per-requirement candidate maps into one discovery answer.
//!
//! `union_merge` is the SOME operator: any requirement a candidate satisfies
//! qualifies it, and the strongest contribution wins. `intersection_merge` is
//! the ALL operator: the candidate key sets are intersected first, then each
//! survivor's strength is the weakest-link composite of its best contribution
//! per requirement.

use crate::discovery::types::{CapabilityUri, RankedMatch};
use crate::matching::types::CompositeMatchType;
use itertools::Itertools;
use std::collections::HashMap;

/// Candidate capabilities found for a single requirement.
pub type CandidateMap = HashMap<CapabilityUri, RankedMatch>;

/// Keeps every candidate from every map; a candidate reachable through
/// several requirements keeps all contributions and the strongest strength.
pub fn union_merge(maps: impl IntoIterator<Item = CandidateMap>) -> CandidateMap {
    let mut merged = CandidateMap::new();
    for map in maps {
        for (capability, ranked) in map {
            match merged.entry(capability) {
                std::collections::hash_map::Entry::Occupied(mut e) => {
                    let existing = e.get_mut();
                    existing.match_type = existing.match_type.max(ranked.match_type);
                    existing.contributing.extend(ranked.contributing);
                }
                std::collections::hash_map::Entry::Vacant(e) => {
                    e.insert(ranked);
                }
            }
        }
    }
    merged
}

/// Keeps only candidates present in every map, then scores each survivor by
/// the weakest-link composite over its per-requirement best contributions.
pub fn intersection_merge(maps: Vec<CandidateMap>) -> CandidateMap {
    let Some(first) = maps.first() else {
        return CandidateMap::new();
    };
    let surviving: Vec<CapabilityUri> = first
        .keys()
        .filter(|capability| maps.iter().all(|m| m.contains_key(*capability)))
        .cloned()
        .collect();

    surviving
        .into_iter()
        .map(|capability| {
            // One part per requirement: the best that requirement offered.
            let parts = maps
                .iter()
                .filter_map(|m| m.get(&capability))
                .filter_map(|ranked| ranked.strongest())
                .collect_vec();
            let match_type =
                CompositeMatchType::of_parts(parts.iter().map(|r| r.match_type));
            let contributing = parts.into_iter().cloned().collect();
            (
                capability,
                RankedMatch {
                    match_type,
                    contributing,
                },
            )
        })
        .collect()
}
