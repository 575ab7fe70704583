//! Assembly of the entity catalog from both stores.

use std::sync::Arc;

use cov2k_core::{EntityCatalog, EntityName, EntityResolver};
use serde::Serialize;
use tracing::info;

use crate::connection::SqlitePool;
use crate::document::{DocumentResolver, KnowledgeBase};
use crate::error::{StoreError, StoreResult};
use crate::relational::{table_for, SqlResolver};

/// Which store holds an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    KnowledgeBase,
    Sequences,
}

pub fn backend_of(entity: EntityName) -> Backend {
    match entity {
        EntityName::Variants
        | EntityName::Namings
        | EntityName::Contexts
        | EntityName::Effects
        | EntityName::Evidences
        | EntityName::NucPositionalMutations
        | EntityName::AaPositionalChanges
        | EntityName::AaChangeGroups
        | EntityName::NucAnnotations
        | EntityName::Proteins
        | EntityName::ProteinRegions
        | EntityName::AaResidueChanges
        | EntityName::AaResidues
        | EntityName::AaResiduesRef
        | EntityName::AaResiduesAlt => Backend::KnowledgeBase,
        EntityName::Sequences
        | EntityName::HostSamples
        | EntityName::NucMutations
        | EntityName::AaChanges
        | EntityName::Epitopes
        | EntityName::Assays => Backend::Sequences,
    }
}

fn sql_resolver(pool: &SqlitePool, entity: EntityName) -> StoreResult<SqlResolver> {
    let table = table_for(entity).ok_or_else(|| StoreError::Catalog(entity.to_string()))?;
    Ok(SqlResolver::new(pool.clone(), table))
}

/// One resolver per entity. Knowledge-base filters on `epitope_id` are
/// answered through the epitope resolver of the sequence store.
pub fn build_catalog(kb: Arc<KnowledgeBase>, pool: SqlitePool) -> StoreResult<EntityCatalog> {
    let epitopes: Arc<dyn EntityResolver> = Arc::new(sql_resolver(&pool, EntityName::Epitopes)?);

    let catalog = EntityCatalog::try_from_fn(|entity| -> StoreResult<Arc<dyn EntityResolver>> {
        let resolver: Arc<dyn EntityResolver> = match backend_of(entity) {
            Backend::KnowledgeBase => Arc::new(
                DocumentResolver::new(entity, kb.clone())?
                    .with_foreign(EntityName::Epitopes, epitopes.clone()),
            ),
            Backend::Sequences if entity == EntityName::Epitopes => epitopes.clone(),
            Backend::Sequences => Arc::new(sql_resolver(&pool, entity)?),
        };
        Ok(resolver)
    })?;

    info!(
        kb_records = kb.record_count(),
        kb_links = kb.links().len(),
        "Entity catalog assembled"
    );
    Ok(catalog)
}
