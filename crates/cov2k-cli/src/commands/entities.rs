use std::sync::Arc;

use anyhow::Result;
use cov2k_core::{EntityCatalog, EntityName, PaginationPolicy};
use cov2k_store::{backend_of, build_catalog, Backend, KnowledgeBase, SqlitePool};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct EntityInfo {
    pub entity: EntityName,
    pub identifier_field: &'static str,
    pub backend: Backend,
    pub pagination: PaginationPolicy,
    pub filters: Vec<&'static str>,
}

/// Describe every entity. Filters don't depend on stored data, so empty
/// stores are enough.
pub fn describe() -> Result<Vec<EntityInfo>> {
    let catalog = build_catalog(Arc::new(KnowledgeBase::new()), SqlitePool::memory()?)?;
    Ok(EntityName::ALL.iter().map(|&entity| info_of(&catalog, entity)).collect())
}

fn info_of(catalog: &EntityCatalog, entity: EntityName) -> EntityInfo {
    let resolver = catalog.resolver_of(entity);
    EntityInfo {
        entity,
        identifier_field: entity.identifier_field(),
        backend: backend_of(entity),
        pagination: resolver.pagination_policy(),
        filters: resolver.supported_filters(),
    }
}

pub fn execute(json: bool) -> Result<()> {
    let entities = describe()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entities)?);
        return Ok(());
    }

    println!("{:<28} {:<30} {:<14} {:<10} FILTERS", "ENTITY", "IDENTIFIER", "STORE", "PAGING");
    for info in &entities {
        let backend = match info.backend {
            Backend::KnowledgeBase => "knowledge_base",
            Backend::Sequences => "sequences",
        };
        let pagination = match info.pagination {
            PaginationPolicy::Optional => "optional",
            PaginationPolicy::Mandatory => "mandatory",
        };
        println!(
            "{:<28} {:<30} {:<14} {:<10} {}",
            info.entity.as_str(),
            info.identifier_field,
            backend,
            pagination,
            info.filters.join(", ")
        );
    }
    Ok(())
}
