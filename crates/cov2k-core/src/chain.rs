//! Relationship chaining over the entity graph.
//!
//! A chain is a slash-delimited path of entity names, e.g.
//! `effects/evidences`. The last entity is resolved first; the identifiers
//! of its records become the filter values of the entity before it, and so
//! on back to the first entity, whose records form the result.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::{debug, error};

use crate::catalog::{EntityCatalog, EntityName};
use crate::error::{CoreError, CoreResult};
use crate::pagination::PageWindow;
use crate::record::{Filter, Record, Scalar};
use crate::resolver::{EntityResolver, ResolveError};

/// Query keys that never count as filters.
pub const PAGINATION_KEYS: [&str; 2] = ["limit", "page"];

pub fn is_pagination_key(key: &str) -> bool {
    PAGINATION_KEYS.contains(&key)
}

/// How the final path segment selects records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HopMode {
    NoParam,
    PathParam,
    QueryParam,
}

/// Filter applied to one hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopFilter {
    None,
    /// A literal identifier taken from the path.
    Literal(String),
    /// One resolver call per value.
    Values { key: String, values: Vec<Scalar> },
}

/// A validated chain request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainPlan {
    entities: Vec<EntityName>,
    mode: HopMode,
    initial: HopFilter,
}

impl ChainPlan {
    /// Validate `path` and the request's query parameters.
    ///
    /// `limit` and `page` are ignored here. At most one distinct filter key
    /// may be given, possibly with several values.
    pub fn parse(path: &str, params: &[(String, String)]) -> CoreResult<Self> {
        let segments: Vec<&str> = path
            .trim_end_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let Some((first, _)) = segments.split_first() else {
            return Err(CoreError::NoEntitySpecified);
        };
        first.parse::<EntityName>()?;

        let filters: Vec<&(String, String)> =
            params.iter().filter(|(k, _)| !is_pagination_key(k)).collect();

        let (entities, mode, initial) = if filters.is_empty() {
            let (last, leading) = segments.split_last().ok_or(CoreError::NoEntitySpecified)?;
            let mut entities = leading
                .iter()
                .map(|s| s.parse::<EntityName>())
                .collect::<CoreResult<Vec<_>>>()?;
            match last.parse::<EntityName>() {
                Ok(name) => {
                    entities.push(name);
                    (entities, HopMode::NoParam, HopFilter::None)
                }
                Err(_) => (
                    entities,
                    HopMode::PathParam,
                    HopFilter::Literal((*last).to_string()),
                ),
            }
        } else {
            let entities = segments
                .iter()
                .map(|s| s.parse::<EntityName>())
                .collect::<CoreResult<Vec<_>>>()?;
            let key = filters[0].0.clone();
            if filters.iter().any(|(k, _)| *k != key) {
                return Err(CoreError::IllegalParameterCombination);
            }
            let mut seen = HashSet::new();
            let mut values = Vec::new();
            for (_, value) in filters.iter().copied() {
                if seen.insert(value.as_str()) {
                    values.push(Scalar::Text(value.clone()));
                }
            }
            (entities, HopMode::QueryParam, HopFilter::Values { key, values })
        };

        let mut seen = HashSet::new();
        if !entities.iter().all(|e| seen.insert(*e)) {
            return Err(CoreError::PathCycleDetected);
        }

        Ok(Self {
            entities,
            mode,
            initial,
        })
    }

    pub fn entities(&self) -> &[EntityName] {
        &self.entities
    }

    pub fn mode(&self) -> HopMode {
        self.mode
    }

    pub fn initial_filter(&self) -> &HopFilter {
        &self.initial
    }

    fn describe(&self) -> String {
        self.entities
            .iter()
            .map(|e| e.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Bounds on a single chain evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLimits {
    /// Largest number of distinct linking values a hop may hand on.
    pub max_intermediate_values: usize,
    /// Resolver calls in flight during one fan-out.
    pub fan_out_concurrency: usize,
}

impl Default for ChainLimits {
    fn default() -> Self {
        Self {
            max_intermediate_values: 10_000,
            fan_out_concurrency: 8,
        }
    }
}

/// Evaluates chain requests against an [`EntityCatalog`].
#[derive(Debug, Clone)]
pub struct ChainDriver {
    catalog: Arc<EntityCatalog>,
    limits: ChainLimits,
}

impl ChainDriver {
    pub fn new(catalog: Arc<EntityCatalog>) -> Self {
        Self::with_limits(catalog, ChainLimits::default())
    }

    pub fn with_limits(catalog: Arc<EntityCatalog>, limits: ChainLimits) -> Self {
        let limits = ChainLimits {
            fan_out_concurrency: limits.fan_out_concurrency.max(1),
            ..limits
        };
        Self { catalog, limits }
    }

    pub fn catalog(&self) -> &Arc<EntityCatalog> {
        &self.catalog
    }

    pub fn limits(&self) -> ChainLimits {
        self.limits
    }

    /// Parse and run a chain request.
    pub async fn combine(
        &self,
        path: &str,
        params: &[(String, String)],
        window: Option<PageWindow>,
    ) -> CoreResult<Vec<Record>> {
        let plan = ChainPlan::parse(path, params)?;
        self.run(&plan, window).await
    }

    pub async fn run(&self, plan: &ChainPlan, window: Option<PageWindow>) -> CoreResult<Vec<Record>> {
        let path = plan.describe();
        let mut filter = plan.initial.clone();

        for (step, &entity) in plan.entities.iter().enumerate().rev() {
            let resolver = self.catalog.resolver_of(entity);
            debug!(path = %path, entity = %entity, filter = ?filter, "resolving hop");

            if step == 0 {
                let stop_after = window.map(|w| w.last_idx());
                let records = self
                    .collect_records(&path, entity, resolver, &filter, stop_after)
                    .await?;
                return finalize(entity, records, window);
            }

            let values = self.collect_linking_values(&path, entity, resolver, &filter).await?;
            if values.is_empty() {
                debug!(path = %path, entity = %entity, "no linking values, chain ends empty");
                return Ok(Vec::new());
            }
            filter = HopFilter::Values {
                key: entity.identifier_field().to_string(),
                values: values.into_iter().collect(),
            };
        }

        Err(CoreError::NoEntitySpecified)
    }

    /// Records of the terminal hop, deduplicated on every field.
    ///
    /// Across a fan-out, accumulation stops once more than `stop_after`
    /// distinct records exist.
    async fn collect_records(
        &self,
        path: &str,
        entity: EntityName,
        resolver: &Arc<dyn EntityResolver>,
        filter: &HopFilter,
        stop_after: Option<usize>,
    ) -> CoreResult<HashSet<Record>> {
        let mut collected = HashSet::new();
        match filter {
            HopFilter::Values { key, values } if values.len() > 1 => {
                let mut calls = self.fan_out(resolver, key, values);
                while let Some((value, result)) = calls.next().await {
                    let records = result.map_err(|e| {
                        translate(path, entity, &Filter::single(key.as_str(), value), e)
                    })?;
                    collected.extend(records);
                    if stop_after.is_some_and(|bound| collected.len() > bound) {
                        debug!(path = %path, entity = %entity, "page filled, fan-out stopped early");
                        break;
                    }
                }
            }
            _ => collected.extend(self.call_once(path, entity, resolver, filter).await?),
        }
        Ok(collected)
    }

    /// Distinct identifiers of `entity` produced by this hop, sorted.
    async fn collect_linking_values(
        &self,
        path: &str,
        entity: EntityName,
        resolver: &Arc<dyn EntityResolver>,
        filter: &HopFilter,
    ) -> CoreResult<BTreeSet<Scalar>> {
        let mut values = BTreeSet::new();
        match filter {
            HopFilter::Values { key, values: inputs } if inputs.len() > 1 => {
                let mut calls = self.fan_out(resolver, key, inputs);
                while let Some((value, result)) = calls.next().await {
                    let records = result.map_err(|e| {
                        translate(path, entity, &Filter::single(key.as_str(), value), e)
                    })?;
                    self.absorb_identifiers(entity, &records, &mut values)?;
                }
            }
            _ => {
                let records = self.call_once(path, entity, resolver, filter).await?;
                self.absorb_identifiers(entity, &records, &mut values)?;
            }
        }
        Ok(values)
    }

    fn absorb_identifiers(
        &self,
        entity: EntityName,
        records: &[Record],
        values: &mut BTreeSet<Scalar>,
    ) -> CoreResult<()> {
        for record in records {
            let id = record.identifier(entity).map_err(CoreError::from)?;
            values.insert(id.clone());
            if values.len() > self.limits.max_intermediate_values {
                return Err(CoreError::IntermediateResultTooLarge {
                    entity,
                    limit: self.limits.max_intermediate_values,
                });
            }
        }
        Ok(())
    }

    fn fan_out<'a>(
        &self,
        resolver: &'a Arc<dyn EntityResolver>,
        key: &'a str,
        values: &'a [Scalar],
    ) -> impl futures::Stream<Item = (Scalar, Result<Vec<Record>, ResolveError>)> + 'a {
        stream::iter(values.iter().cloned())
            .map(move |value| async move {
                let filter = Filter::single(key, value.clone());
                let result = resolver.list(&filter, None).await;
                (value, result)
            })
            .buffered(self.limits.fan_out_concurrency)
    }

    async fn call_once(
        &self,
        path: &str,
        entity: EntityName,
        resolver: &Arc<dyn EntityResolver>,
        filter: &HopFilter,
    ) -> CoreResult<Vec<Record>> {
        match filter {
            HopFilter::None => {
                let filter = Filter::new();
                resolver
                    .list(&filter, None)
                    .await
                    .map_err(|e| translate(path, entity, &filter, e))
            }
            HopFilter::Literal(id) => resolver
                .get(id)
                .await
                .map_err(|e| translate(path, entity, &Filter::single(entity.identifier_field(), id.as_str()), e)),
            HopFilter::Values { key, values } => {
                let mut records = Vec::new();
                for value in values {
                    let filter = Filter::single(key.as_str(), value.clone());
                    let found = resolver
                        .list(&filter, None)
                        .await
                        .map_err(|e| translate(path, entity, &filter, e))?;
                    records.extend(found);
                }
                Ok(records)
            }
        }
    }
}

/// Sort the terminal records by identifier, then by all fields, and apply
/// the window.
fn finalize(
    entity: EntityName,
    records: HashSet<Record>,
    window: Option<PageWindow>,
) -> CoreResult<Vec<Record>> {
    let mut keyed = records
        .into_iter()
        .map(|record| Ok((record.identifier(entity)?.clone(), record)))
        .collect::<Result<Vec<_>, ResolveError>>()?;
    keyed.sort();
    let sorted: Vec<Record> = keyed.into_iter().map(|(_, record)| record).collect();
    Ok(match window {
        Some(window) => window.slice(sorted),
        None => sorted,
    })
}

fn translate(path: &str, entity: EntityName, filter: &Filter, err: ResolveError) -> CoreError {
    match err {
        ResolveError::UnsupportedFilter(key) => {
            debug!(path = %path, entity = %entity, key = %key, "unsupported filter");
            CoreError::UnrecognisedQueryParameter
        }
        other => {
            error!(
                path = %path,
                entity = %entity,
                filter = ?filter,
                error = %other,
                "resolver failed while combining"
            );
            CoreError::BadRequest
        }
    }
}
