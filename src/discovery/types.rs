//! Capability-side value types.

use crate::errors::{DiscoveryError, DiscoveryResult};
use crate::matching::types::{CompositeMatchType, Concept, MatchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Identifier of a catalogued operation or service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityUri(Url);

impl CapabilityUri {
    pub fn parse(uri: &str) -> DiscoveryResult<Self> {
        Url::parse(uri)
            .map(CapabilityUri)
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

impl From<Url> for CapabilityUri {
    fn from(url: Url) -> Self {
        CapabilityUri(url)
    }
}

impl fmt::Display for CapabilityUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which slot of a capability a concept reference sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Input,
    Output,
    Classification,
}

/// Which kind of catalogued entity a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Operation,
    Service,
}

/// A catalogued operation or service with its concept-typed slots.
///
/// Read-only during discovery; the engine only ever looks capabilities up,
/// it never mutates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub uri: CapabilityUri,
    pub inputs: Vec<Concept>,
    pub outputs: Vec<Concept>,
    pub classifications: Vec<Concept>,
}

impl Capability {
    pub fn new(uri: CapabilityUri) -> Self {
        Self {
            uri,
            inputs: Vec::new(),
            outputs: Vec::new(),
            classifications: Vec::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: impl IntoIterator<Item = Concept>) -> Self {
        self.inputs = inputs.into_iter().collect();
        self
    }

    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = Concept>) -> Self {
        self.outputs = outputs.into_iter().collect();
        self
    }

    pub fn with_classifications(
        mut self,
        classifications: impl IntoIterator<Item = Concept>,
    ) -> Self {
        self.classifications = classifications.into_iter().collect();
        self
    }

    pub fn slot(&self, kind: SlotKind) -> &[Concept] {
        match kind {
            SlotKind::Input => &self.inputs,
            SlotKind::Output => &self.outputs,
            SlotKind::Classification => &self.classifications,
        }
    }
}

/// One discovery answer for one capability: the composite strength plus every
/// atomic match that contributed to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMatch {
    pub match_type: CompositeMatchType,
    pub contributing: Vec<MatchResult>,
}

impl RankedMatch {
    pub fn single(result: MatchResult) -> Self {
        Self {
            match_type: result.match_type.into(),
            contributing: vec![result],
        }
    }

    /// Folds another alternative contribution in, keeping the strongest
    /// overall strength (UNION semantics).
    pub fn absorb(&mut self, result: MatchResult) {
        self.match_type = self.match_type.max(result.match_type.into());
        self.contributing.push(result);
    }

    /// Strongest single contributing match, if any.
    pub fn strongest(&self) -> Option<&MatchResult> {
        self.contributing.iter().max_by_key(|r| r.match_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::types::MatchType;

    fn c(uri: &str) -> Concept {
        Concept::parse(uri).unwrap()
    }

    fn result(t: MatchType) -> MatchResult {
        MatchResult::new(c("urn:x:a"), c("urn:x:b"), t, "urn:m:test")
    }

    #[test]
    fn absorb_keeps_the_strongest_strength() {
        let mut ranked = RankedMatch::single(result(MatchType::Subsume));
        ranked.absorb(result(MatchType::Exact));
        ranked.absorb(result(MatchType::Plugin));
        assert_eq!(ranked.match_type, CompositeMatchType::Exact);
        assert_eq!(ranked.contributing.len(), 3);
        assert_eq!(ranked.strongest().unwrap().match_type, MatchType::Exact);
    }

    #[test]
    fn slots_are_addressable_by_kind() {
        let cap = Capability::new(CapabilityUri::parse("urn:op:feed").unwrap())
            .with_inputs([c("urn:zoo:animal")])
            .with_outputs([c("urn:zoo:meal")]);
        assert_eq!(cap.slot(SlotKind::Input), &[c("urn:zoo:animal")]);
        assert_eq!(cap.slot(SlotKind::Output), &[c("urn:zoo:meal")]);
        assert!(cap.slot(SlotKind::Classification).is_empty());
    }
}
