//! Value types of the match lattice.
//!
//! `MatchType` is the four-valued strength of a pairwise concept relation;
//! `CompositeMatchType` is the six-valued scale used when a single discovery
//! answer aggregates several atomic matches. Both are plain ordered
//! enumerations: ordering is the declaration order, comparisons are `Ord`.

use crate::errors::{DiscoveryError, DiscoveryResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

/// A node in an external classification taxonomy, identified by URI.
///
/// Concepts are opaque to the engine; every structural question (ancestry,
/// equivalence) is delegated to the classification source. Construct through
/// [`Concept::parse`] so malformed identifiers are rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Concept(Url);

impl Concept {
    pub fn parse(uri: &str) -> DiscoveryResult<Self> {
        Url::parse(uri)
            .map(Concept)
            .map_err(|e| DiscoveryError::InvalidConcept {
                uri: uri.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<Url> for Concept {
    fn from(url: Url) -> Self {
        Concept(url)
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Strength of the relation from an origin concept to a destination concept.
///
/// Exactly one of these holds for any ordered pair. The relation is not
/// symmetric: `Plugin(A, B)` iff `Subsume(B, A)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// No recorded relation.
    Fail,
    /// Destination is an ancestor of (more general than) the origin.
    Subsume,
    /// Destination is a descendant of (more specific than) the origin; it can
    /// plug into a requirement stated as the origin.
    Plugin,
    /// Identical or declared equivalent.
    Exact,
}

impl MatchType {
    pub fn is_fail(self) -> bool {
        self == MatchType::Fail
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchType::Fail => "fail",
            MatchType::Subsume => "subsume",
            MatchType::Plugin => "plugin",
            MatchType::Exact => "exact",
        };
        f.write_str(s)
    }
}

/// Strength of an answer derived from several atomic matches.
///
/// The `Partial*` values mean "some contributing matches failed, the best of
/// the rest reached this far".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMatchType {
    Fail,
    PartialSubsume,
    PartialPlugin,
    Subsume,
    Plugin,
    Exact,
}

impl From<MatchType> for CompositeMatchType {
    fn from(t: MatchType) -> Self {
        match t {
            MatchType::Fail => CompositeMatchType::Fail,
            MatchType::Subsume => CompositeMatchType::Subsume,
            MatchType::Plugin => CompositeMatchType::Plugin,
            MatchType::Exact => CompositeMatchType::Exact,
        }
    }
}

impl CompositeMatchType {
    /// Weakest-link aggregation over the contributing atomic strengths.
    ///
    /// If every contribution succeeded the chain is as strong as its weakest
    /// link. If any failed, the answer degrades to a partial strength keyed
    /// off the best surviving contribution. An empty contribution list is
    /// `Fail`.
    pub fn of_parts<I>(parts: I) -> Self
    where
        I: IntoIterator<Item = MatchType>,
    {
        let mut worst: Option<MatchType> = None;
        let mut best: Option<MatchType> = None;
        for t in parts {
            worst = Some(worst.map_or(t, |w| w.min(t)));
            best = Some(best.map_or(t, |b| b.max(t)));
        }
        match (worst, best) {
            (Some(w), Some(_)) if !w.is_fail() => w.into(),
            (Some(_), Some(b)) => match b {
                MatchType::Exact | MatchType::Plugin => CompositeMatchType::PartialPlugin,
                MatchType::Subsume => CompositeMatchType::PartialSubsume,
                MatchType::Fail => CompositeMatchType::Fail,
            },
            _ => CompositeMatchType::Fail,
        }
    }
}

impl fmt::Display for CompositeMatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompositeMatchType::Fail => "fail",
            CompositeMatchType::PartialSubsume => "partial-subsume",
            CompositeMatchType::PartialPlugin => "partial-plugin",
            CompositeMatchType::Subsume => "subsume",
            CompositeMatchType::Plugin => "plugin",
            CompositeMatchType::Exact => "exact",
        };
        f.write_str(s)
    }
}

/// Outcome of matching one origin concept against one destination concept.
///
/// Immutable once created. Identity (equality, hashing) is the
/// `(origin, destination, matcher_id)` triple; the strength and explanation
/// are payload, not identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub origin: Concept,
    pub destination: Concept,
    pub match_type: MatchType,
    pub matcher_id: String,
    pub explanation: Option<String>,
}

impl MatchResult {
    pub fn new(
        origin: Concept,
        destination: Concept,
        match_type: MatchType,
        matcher_id: impl Into<String>,
    ) -> Self {
        Self {
            origin,
            destination,
            match_type,
            matcher_id: matcher_id.into(),
            explanation: None,
        }
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// The semantic default for "no recorded relation": a synthesized `Fail`.
    pub fn fail(origin: Concept, destination: Concept, matcher_id: impl Into<String>) -> Self {
        Self::new(origin, destination, MatchType::Fail, matcher_id)
            .with_explanation("no recorded relation between the concepts")
    }
}

impl PartialEq for MatchResult {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin
            && self.destination == other.destination
            && self.matcher_id == other.matcher_id
    }
}

impl Eq for MatchResult {}

impl Hash for MatchResult {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.origin.hash(state);
        self.destination.hash(state);
        self.matcher_id.hash(state);
    }
}

/// Bulk query result: per origin, the destinations it matches and how.
pub type MatchTable = HashMap<Concept, HashMap<Concept, MatchResult>>;
