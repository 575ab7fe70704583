//! Knowledge-base store
//!
//! The knowledge base is loaded once from a JSON snapshot and kept in
//! memory:
//!
//! ```json
//! {
//!   "collections": { "variants": [{ "variant_id": "v1" }] },
//!   "links": [{ "from": "variants", "to": "effects", "pairs": [["v1", "e1"]] }]
//! }
//! ```
//!
//! Records must be flat and carry their entity's identifier field.
//! `aa_residues` holds the records of all three residue views.

mod entities;
mod links;
mod resolver;

pub use entities::{collection_of, filters_for, DocFilter, ForeignPredicate, Predicate};
pub use links::{id_key, LinkIndex};
pub use resolver::DocumentResolver;

use std::collections::HashMap;
use std::path::Path;

use cov2k_core::{EntityName, Record, Scalar};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    collections: HashMap<EntityName, Vec<serde_json::Value>>,
    #[serde(default)]
    links: Vec<LinkSet>,
}

#[derive(Debug, Deserialize)]
struct LinkSet {
    from: EntityName,
    to: EntityName,
    pairs: Vec<(Scalar, Scalar)>,
}

/// In-memory knowledge base: one record collection per entity plus the
/// relationships between them.
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    collections: HashMap<EntityName, Vec<Record>>,
    links: LinkIndex,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::Snapshot {
                path: path.to_path_buf(),
                source,
            })?;
        let kb = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            records = kb.record_count(),
            links = kb.links.len(),
            "Knowledge base loaded"
        );
        Ok(kb)
    }

    pub fn from_json_str(content: &str) -> StoreResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(content)?;
        let mut kb = Self::new();

        for (entity, values) in snapshot.collections {
            ensure_document_collection(entity)?;
            debug!(%entity, records = values.len(), "Loading collection");
            for value in values {
                let record = Record::try_from(value)
                    .map_err(|e| StoreError::InvalidSnapshot(format!("{entity}: {e}")))?;
                kb.insert(entity, record)?;
            }
        }

        for set in snapshot.links {
            ensure_document_collection(set.from)?;
            ensure_document_collection(set.to)?;
            for (from_id, to_id) in &set.pairs {
                kb.link(set.from, from_id, set.to, to_id);
            }
        }
        Ok(kb)
    }

    /// Add a record to the collection of `entity`.
    pub fn insert(&mut self, entity: EntityName, record: Record) -> StoreResult<()> {
        let collection = collection_of(entity);
        if record.identifier(collection).is_err() {
            return Err(StoreError::InvalidSnapshot(format!(
                "{collection}: record without {}",
                collection.identifier_field()
            )));
        }
        self.collections.entry(collection).or_default().push(record);
        Ok(())
    }

    pub fn link(&mut self, from: EntityName, from_id: &Scalar, to: EntityName, to_id: &Scalar) {
        self.links
            .insert(collection_of(from), from_id, collection_of(to), to_id);
    }

    /// Records of `entity`, in snapshot order.
    pub fn collection(&self, entity: EntityName) -> &[Record] {
        self.collections
            .get(&collection_of(entity))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn links(&self) -> &LinkIndex {
        &self.links
    }

    pub fn record_count(&self) -> usize {
        self.collections.values().map(Vec::len).sum()
    }

    pub fn stats(&self) -> KbStats {
        let mut collections: Vec<CollectionCount> = self
            .collections
            .iter()
            .map(|(entity, records)| CollectionCount {
                entity: *entity,
                records: records.len(),
            })
            .collect();
        collections.sort_by_key(|c| c.entity);
        KbStats {
            collections,
            links: self.links.len(),
        }
    }
}

fn ensure_document_collection(entity: EntityName) -> StoreResult<()> {
    if filters_for(entity).is_none() || collection_of(entity) != entity {
        return Err(StoreError::InvalidSnapshot(format!(
            "{entity} is not a knowledge-base collection"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct KbStats {
    pub collections: Vec<CollectionCount>,
    pub links: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionCount {
    pub entity: EntityName,
    pub records: usize,
}
