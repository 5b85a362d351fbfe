//! Taxonomy-change notifications.
//!
//! The storage layer delivers these at-least-once, possibly concurrently and
//! with no ordering guarantee between unrelated sources. Instead of an event
//! bus with dynamic subscriber registration, delivery is an explicit mpsc
//! channel read by a task spawned at construction time; embedders with their
//! own dispatch can call the `IndexedConceptMatcher` handlers directly.

use crate::matching::indexed::IndexedConceptMatcher;
use crate::matching::types::Concept;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

/// A change to the set of registered concept sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TaxonomyEvent {
    /// A new taxonomy chunk was registered; `added_concepts` lists the
    /// concepts it contributes.
    ConceptSourceCreated {
        source_id: Url,
        added_concepts: HashSet<Concept>,
    },
    /// A taxonomy chunk was unregistered. The surviving concept universe is
    /// re-read from the classification source when the event is handled.
    ConceptSourceDeleted { source_id: Url },
}

/// Spawns the task that keeps `matcher` consistent with taxonomy changes.
///
/// The task runs until the sender side of the channel is dropped. Handler
/// failures are logged and swallowed: a lost invalidation only delays cache
/// freshness until the event is redelivered (delivery is at-least-once).
pub fn spawn_event_loop(
    matcher: Arc<IndexedConceptMatcher>,
    mut events: mpsc::Receiver<TaxonomyEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Err(e) = matcher.handle_event(&event).await {
                warn!(error = %e, ?event, "taxonomy event handling failed");
            }
        }
        debug!("taxonomy event channel closed, stopping invalidation loop");
    })
}
