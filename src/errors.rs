//! Error types for the matching and discovery engine.
//!
//! Design rules (kept throughout the crate):
//! - "no relation between two concepts" is a `Fail` match value, never an error;
//! - collaborator unreachability is a transient, labeled failure;
//! - malformed URIs are rejected at the API boundary, before any matching runs.

use thiserror::Error;

/// Error type for concept matching and capability discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// A concept or capability identifier is not a valid URI.
    #[error("invalid concept URI '{uri}': {reason}")]
    InvalidConcept { uri: String, reason: String },

    /// A remote collaborator (classification source, capability index) could
    /// not be reached or did not answer within the configured deadline.
    #[error("collaborator '{collaborator}' unavailable: {reason}")]
    CollaboratorUnavailable {
        collaborator: String,
        reason: String,
    },

    /// The match index could not be populated; queries against it fail until
    /// a later population attempt succeeds.
    #[error("match index population failed: {0}")]
    IndexPopulation(String),

    #[error("{0}")]
    Other(String),
}

impl DiscoveryError {
    /// Shorthand for a labeled collaborator failure.
    pub fn unavailable(collaborator: impl Into<String>, reason: impl Into<String>) -> Self {
        DiscoveryError::CollaboratorUnavailable {
            collaborator: collaborator.into(),
            reason: reason.into(),
        }
    }
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
