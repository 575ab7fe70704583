//! In-memory relationship index for the knowledge base
//!
//! Relationships between knowledge-base entities are stored as id pairs and
//! indexed in both directions, so a filter such as `effects?variant_id=v1`
//! and its inverse `variants?effect_id=e1` are both a single lookup.

use std::collections::{HashMap, HashSet};

use cov2k_core::{EntityName, Scalar};

/// Identifier key used by the index. Ids compare case-insensitively and
/// `5` matches `"5"`.
pub fn id_key(id: &Scalar) -> String {
    id.to_string().to_ascii_lowercase()
}

/// Bidirectional id → ids adjacency per ordered entity pair.
#[derive(Debug, Default)]
pub struct LinkIndex {
    /// (from, to) -> from id -> linked `to` ids
    edges: HashMap<(EntityName, EntityName), HashMap<String, HashSet<String>>>,
    pairs: usize,
}

impl LinkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from_id` of `from` is related to `to_id` of `to`.
    pub fn insert(&mut self, from: EntityName, from_id: &Scalar, to: EntityName, to_id: &Scalar) {
        let (a, b) = (id_key(from_id), id_key(to_id));

        let inserted = self
            .edges
            .entry((from, to))
            .or_default()
            .entry(a.clone())
            .or_default()
            .insert(b.clone());

        // Store the backlink too
        self.edges
            .entry((to, from))
            .or_default()
            .entry(b)
            .or_default()
            .insert(a);

        if inserted {
            self.pairs += 1;
        }
    }

    /// Keys of the `entity` ids related to `other_id` of `other`.
    pub fn linked(&self, entity: EntityName, other: EntityName, other_id: &Scalar) -> HashSet<String> {
        self.edges
            .get(&(other, entity))
            .and_then(|adjacency| adjacency.get(&id_key(other_id)))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of distinct relationships.
    pub fn len(&self) -> usize {
        self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index() {
        let index = LinkIndex::new();
        assert!(index.is_empty());
        assert!(index
            .linked(EntityName::Effects, EntityName::Variants, &"v1".into())
            .is_empty());
    }

    #[test]
    fn test_lookup_both_directions() {
        let mut index = LinkIndex::new();
        index.insert(EntityName::Variants, &"v1".into(), EntityName::Effects, &"e1".into());
        index.insert(EntityName::Variants, &"v1".into(), EntityName::Effects, &"e2".into());
        index.insert(EntityName::Variants, &"v2".into(), EntityName::Effects, &"e2".into());

        let effects = index.linked(EntityName::Effects, EntityName::Variants, &"v1".into());
        assert_eq!(effects, HashSet::from(["e1".to_string(), "e2".to_string()]));

        let variants = index.linked(EntityName::Variants, EntityName::Effects, &"E2".into());
        assert_eq!(variants, HashSet::from(["v1".to_string(), "v2".to_string()]));
    }

    #[test]
    fn test_duplicate_pairs_are_counted_once() {
        let mut index = LinkIndex::new();
        index.insert(EntityName::Effects, &"e1".into(), EntityName::Evidences, &Scalar::Int(7));
        index.insert(EntityName::Effects, &"e1".into(), EntityName::Evidences, &"7".into());
        assert_eq!(index.len(), 1);
        assert_eq!(
            index.linked(EntityName::Evidences, EntityName::Effects, &"e1".into()),
            HashSet::from(["7".to_string()])
        );
    }

    #[test]
    fn test_pairs_are_scoped_to_entities() {
        let mut index = LinkIndex::new();
        index.insert(EntityName::Contexts, &"c1".into(), EntityName::Variants, &"v1".into());
        assert!(index
            .linked(EntityName::Effects, EntityName::Variants, &"v1".into())
            .is_empty());
    }
}
