//! Per-run restoration bookkeeping

use crate::scene::{CollectionKey, NodeKey, PayloadKey};
use std::collections::HashMap;

/// Everything one export run changed and must put back
///
/// The preparation passes fill this record as they go; the restoration pass
/// consumes it in a fixed order. A fresh record is created for every run, so
/// nothing leaks from one export into the next.
#[derive(Debug, Default)]
pub struct RestorationRecord {
    /// Objects whose payload was replaced by a copy, keyed by object name,
    /// each mapped to the payload it must be re-linked to
    pub shared_payloads: HashMap<String, PayloadKey>,

    /// Objects that were revealed and must be hidden again
    pub hidden_objects: Vec<NodeKey>,

    /// Objects that were enabled and must be disabled again
    pub disabled_objects: Vec<NodeKey>,

    /// Collections that were revealed and must be hidden again
    pub hidden_collections: Vec<CollectionKey>,

    /// Collections that were enabled and must be disabled again
    pub disabled_collections: Vec<CollectionKey>,

    /// Selection as it was when the run started
    pub selection: Vec<NodeKey>,
}

impl RestorationRecord {
    /// Empty record for a new export run
    pub fn new() -> Self {
        Self::default()
    }
}
