use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use cov2k_core::{
    EntityName, EntityResolver, Filter, FilterIntersection, PageWindow, PaginationPolicy,
    Record, ResolveError, ResolveResult, Scalar,
};
use tracing::trace;

use super::{filters_for, id_key, DocFilter, KnowledgeBase};
use crate::error::{StoreError, StoreResult};

/// Resolver for one knowledge-base entity.
///
/// Pagination is optional: without a window every matching record is
/// returned. Results are always sorted by identifier.
pub struct DocumentResolver {
    entity: EntityName,
    kb: Arc<KnowledgeBase>,
    filters: Vec<DocFilter>,
    foreign: HashMap<EntityName, Arc<dyn EntityResolver>>,
}

impl DocumentResolver {
    pub fn new(entity: EntityName, kb: Arc<KnowledgeBase>) -> StoreResult<Self> {
        let filters = filters_for(entity).ok_or_else(|| StoreError::Catalog(entity.to_string()))?;
        Ok(Self {
            entity,
            kb,
            filters,
            foreign: HashMap::new(),
        })
    }

    /// Resolver used by filters that consult another store.
    pub fn with_foreign(mut self, entity: EntityName, resolver: Arc<dyn EntityResolver>) -> Self {
        self.foreign.insert(entity, resolver);
        self
    }

    fn is_available(&self, filter: &DocFilter) -> bool {
        match filter {
            DocFilter::Foreign { other, .. } => self.foreign.contains_key(other),
            _ => true,
        }
    }

    fn id_of(&self, record: &Record) -> ResolveResult<String> {
        record.identifier(self.entity).map(id_key)
    }

    fn keep_ids(&self, records: &[Record], ids: &HashSet<String>) -> ResolveResult<Vec<Record>> {
        let mut kept = Vec::new();
        for record in records {
            if ids.contains(&self.id_of(record)?) {
                kept.push(record.clone());
            }
        }
        Ok(kept)
    }

    async fn apply(&self, filter: &DocFilter, value: &Scalar, records: &[Record]) -> ResolveResult<Vec<Record>> {
        match *filter {
            DocFilter::Field(field) => Ok(records
                .iter()
                .filter(|r| r.get(field).is_some_and(|v| v.loosely_matches(value)))
                .cloned()
                .collect()),
            DocFilter::Linked(other) => {
                let ids = self.kb.links().linked(self.entity, other, value);
                self.keep_ids(records, &ids)
            }
            DocFilter::Reference { other, field } => {
                let mut ids = HashSet::new();
                for target in self.kb.collection(other) {
                    if target.identifier(other)?.loosely_matches(value) {
                        if let Some(v) = target.get(field).filter(|v| !v.is_null()) {
                            ids.insert(id_key(v));
                        }
                    }
                }
                self.keep_ids(records, &ids)
            }
            DocFilter::Computed { matches, .. } => {
                let mut kept = Vec::new();
                for record in records {
                    if matches(record, value)? {
                        kept.push(record.clone());
                    }
                }
                Ok(kept)
            }
            DocFilter::Foreign { other, matches } => {
                let resolver = self
                    .foreign
                    .get(&other)
                    .ok_or_else(|| ResolveError::UnsupportedFilter(filter.key().to_string()))?;
                let targets = resolver.get(&value.to_string()).await?;
                Ok(records
                    .iter()
                    .filter(|r| targets.iter().any(|t| matches(r, t)))
                    .cloned()
                    .collect())
            }
        }
    }

    fn sorted(&self, records: Vec<Record>) -> ResolveResult<Vec<Record>> {
        let mut keyed = records
            .into_iter()
            .map(|r| Ok((r.identifier(self.entity)?.clone(), r)))
            .collect::<ResolveResult<Vec<_>>>()?;
        keyed.sort();
        Ok(keyed.into_iter().map(|(_, r)| r).collect())
    }
}

#[async_trait]
impl EntityResolver for DocumentResolver {
    async fn list(&self, filter: &Filter, window: Option<PageWindow>) -> ResolveResult<Vec<Record>> {
        let supported = self.supported_filters();
        if let Some(key) = filter.keys().find(|k| !supported.iter().any(|s| s == k)) {
            return Err(ResolveError::UnsupportedFilter(key.to_string()));
        }

        let records = self.kb.collection(self.entity);
        let mut intersection = FilterIntersection::new();
        for doc_filter in &self.filters {
            let key = doc_filter.key();
            if let Some(value) = filter.get(key) {
                let matched = self.apply(doc_filter, value, records).await?;
                trace!(entity = %self.entity, key, matched = matched.len(), "Filter applied");
                intersection.add_filter(Some(key), matched);
            }
        }

        let selected = intersection
            .intersect(|r| self.id_of(r))?
            .into_records()
            .unwrap_or_else(|| records.to_vec());

        let sorted = self.sorted(selected)?;
        Ok(match window {
            Some(window) => window.slice(sorted),
            None => sorted,
        })
    }

    async fn get(&self, id: &str) -> ResolveResult<Vec<Record>> {
        let wanted = Scalar::from(id.trim());
        let mut found = Vec::new();
        for record in self.kb.collection(self.entity) {
            if record.identifier(self.entity)?.loosely_matches(&wanted) {
                found.push(record.clone());
            }
        }
        self.sorted(found)
    }

    fn pagination_policy(&self) -> PaginationPolicy {
        PaginationPolicy::Optional
    }

    fn supported_filters(&self) -> Vec<&'static str> {
        self.filters
            .iter()
            .filter(|f| self.is_available(f))
            .map(DocFilter::key)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> Arc<KnowledgeBase> {
        let mut kb = KnowledgeBase::new();
        for (id, org) in [("n2", "WHO"), ("n1", "Pango"), ("n3", "WHO")] {
            kb.insert(
                EntityName::Namings,
                Record::new()
                    .with("naming_id", id)
                    .with("organization", org)
                    .with("v_class", "VOC"),
            )
            .unwrap();
        }
        kb.link(EntityName::Variants, &"v1".into(), EntityName::Namings, &"n1".into());
        kb.link(EntityName::Variants, &"v1".into(), EntityName::Namings, &"n2".into());
        Arc::new(kb)
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.get("naming_id").unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_unfiltered_list_is_sorted() {
        let resolver = DocumentResolver::new(EntityName::Namings, kb()).unwrap();
        let all = resolver.list(&Filter::new(), None).await.unwrap();
        assert_eq!(ids(&all), ["n1", "n2", "n3"]);
    }

    #[tokio::test]
    async fn test_field_and_link_filters_intersect() {
        let resolver = DocumentResolver::new(EntityName::Namings, kb()).unwrap();
        let filter = Filter::new().with("organization", "who").with("variant_id", "v1");
        let found = resolver.list(&filter, None).await.unwrap();
        assert_eq!(ids(&found), ["n2"]);
    }

    #[tokio::test]
    async fn test_window_slices_after_sort() {
        let resolver = DocumentResolver::new(EntityName::Namings, kb()).unwrap();
        let window = PageWindow::new(2, 2).unwrap();
        let page = resolver.list(&Filter::new(), Some(window)).await.unwrap();
        assert_eq!(ids(&page), ["n3"]);

        let beyond = PageWindow::new(2, 5).unwrap();
        assert!(resolver.list(&Filter::new(), Some(beyond)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_key_is_unsupported() {
        let resolver = DocumentResolver::new(EntityName::Namings, kb()).unwrap();
        let err = resolver
            .list(&Filter::single("colour", "red"), None)
            .await
            .unwrap_err();
        assert_eq!(err, ResolveError::UnsupportedFilter("colour".into()));
    }

    #[tokio::test]
    async fn test_foreign_filter_requires_wiring() {
        let resolver = DocumentResolver::new(EntityName::Proteins, kb()).unwrap();
        assert!(!resolver.supported_filters().contains(&"epitope_id"));
        let err = resolver
            .list(&Filter::single("epitope_id", "1"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedFilter(_)));
    }

    #[tokio::test]
    async fn test_get_is_case_insensitive() {
        let resolver = DocumentResolver::new(EntityName::Namings, kb()).unwrap();
        assert_eq!(ids(&resolver.get("N1").await.unwrap()), ["n1"]);
        assert!(resolver.get("n9").await.unwrap().is_empty());
    }

    #[test]
    fn test_sequence_store_entity_is_rejected() {
        assert!(DocumentResolver::new(EntityName::Sequences, kb()).is_err());
    }
}
