//! The closed set of entity names and the registry that maps each one to
//! its resolver and identifier field.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::CoreError;
use crate::resolver::EntityResolver;

/// Number of entities exposed by the API.
pub const ENTITY_COUNT: usize = 21;

/// Every entity the API can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityName {
    Variants,
    Namings,
    Contexts,
    Effects,
    Evidences,
    NucPositionalMutations,
    AaPositionalChanges,
    AaChangeGroups,
    NucAnnotations,
    Proteins,
    ProteinRegions,
    AaResidueChanges,
    AaResidues,
    AaResiduesRef,
    AaResiduesAlt,
    Sequences,
    HostSamples,
    NucMutations,
    AaChanges,
    Epitopes,
    Assays,
}

impl EntityName {
    pub const ALL: [EntityName; ENTITY_COUNT] = [
        EntityName::Variants,
        EntityName::Namings,
        EntityName::Contexts,
        EntityName::Effects,
        EntityName::Evidences,
        EntityName::NucPositionalMutations,
        EntityName::AaPositionalChanges,
        EntityName::AaChangeGroups,
        EntityName::NucAnnotations,
        EntityName::Proteins,
        EntityName::ProteinRegions,
        EntityName::AaResidueChanges,
        EntityName::AaResidues,
        EntityName::AaResiduesRef,
        EntityName::AaResiduesAlt,
        EntityName::Sequences,
        EntityName::HostSamples,
        EntityName::NucMutations,
        EntityName::AaChanges,
        EntityName::Epitopes,
        EntityName::Assays,
    ];

    /// Path segment and endpoint name.
    pub fn as_str(self) -> &'static str {
        match self {
            EntityName::Variants => "variants",
            EntityName::Namings => "namings",
            EntityName::Contexts => "contexts",
            EntityName::Effects => "effects",
            EntityName::Evidences => "evidences",
            EntityName::NucPositionalMutations => "nuc_positional_mutations",
            EntityName::AaPositionalChanges => "aa_positional_changes",
            EntityName::AaChangeGroups => "aa_change_groups",
            EntityName::NucAnnotations => "nuc_annotations",
            EntityName::Proteins => "proteins",
            EntityName::ProteinRegions => "protein_regions",
            EntityName::AaResidueChanges => "aa_residue_changes",
            EntityName::AaResidues => "aa_residues",
            EntityName::AaResiduesRef => "aa_residues_ref",
            EntityName::AaResiduesAlt => "aa_residues_alt",
            EntityName::Sequences => "sequences",
            EntityName::HostSamples => "host_samples",
            EntityName::NucMutations => "nuc_mutations",
            EntityName::AaChanges => "aa_changes",
            EntityName::Epitopes => "epitopes",
            EntityName::Assays => "assays",
        }
    }

    /// Field that identifies a record of this entity and that other
    /// entities filter by.
    pub fn identifier_field(self) -> &'static str {
        match self {
            EntityName::Variants => "variant_id",
            EntityName::Namings => "naming_id",
            EntityName::Contexts => "context_id",
            EntityName::Effects => "effect_id",
            EntityName::Evidences => "evidence_id",
            EntityName::NucPositionalMutations => "nuc_positional_mutation_id",
            EntityName::AaPositionalChanges => "aa_positional_change_id",
            EntityName::AaChangeGroups => "aa_change_group_id",
            EntityName::NucAnnotations => "nuc_annotation_id",
            EntityName::Proteins => "protein_id",
            EntityName::ProteinRegions => "protein_region_id",
            EntityName::AaResidueChanges => "aa_residue_change_id",
            EntityName::AaResidues | EntityName::AaResiduesRef | EntityName::AaResiduesAlt => {
                "aa_residue_id"
            }
            EntityName::Sequences => "sequence_id",
            EntityName::HostSamples => "host_sample_id",
            EntityName::NucMutations => "nuc_mutation_id",
            EntityName::AaChanges => "aa_change_id",
            EntityName::Epitopes => "epitope_id",
            EntityName::Assays => "assay_id",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or(CoreError::UnrecognisedCommand)
    }
}

/// Immutable registry of one resolver per entity.
///
/// Construction goes through a function called once per [`EntityName`], so
/// a catalog with a missing resolver cannot be built.
pub struct EntityCatalog {
    resolvers: Vec<Arc<dyn EntityResolver>>,
}

impl EntityCatalog {
    pub fn from_fn<F>(mut build: F) -> Self
    where
        F: FnMut(EntityName) -> Arc<dyn EntityResolver>,
    {
        Self {
            resolvers: EntityName::ALL.into_iter().map(&mut build).collect(),
        }
    }

    /// Fallible variant of [`EntityCatalog::from_fn`]; stops at the first error.
    pub fn try_from_fn<F, E>(mut build: F) -> Result<Self, E>
    where
        F: FnMut(EntityName) -> Result<Arc<dyn EntityResolver>, E>,
    {
        let resolvers = EntityName::ALL
            .into_iter()
            .map(&mut build)
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Self { resolvers })
    }

    pub fn resolver_of(&self, name: EntityName) -> &Arc<dyn EntityResolver> {
        &self.resolvers[name.index()]
    }

    pub fn identifier_field_of(&self, name: EntityName) -> &'static str {
        name.identifier_field()
    }

    pub fn entities(&self) -> impl Iterator<Item = (EntityName, &Arc<dyn EntityResolver>)> {
        EntityName::ALL.into_iter().map(move |name| (name, self.resolver_of(name)))
    }
}

impl fmt::Debug for EntityCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCatalog")
            .field("entities", &ENTITY_COUNT)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_all_is_in_discriminant_order() {
        for (i, name) in EntityName::ALL.iter().enumerate() {
            assert_eq!(name.index(), i);
        }
    }

    #[test]
    fn test_names_round_trip_through_from_str() {
        for name in EntityName::ALL {
            assert_eq!(name.as_str().parse::<EntityName>().unwrap(), name);
        }
    }

    #[test_case("variant"; "singular")]
    #[test_case("Variants"; "wrong case")]
    #[test_case(""; "empty")]
    #[test_case("combine"; "reserved word")]
    fn test_unknown_names_are_rejected(input: &str) {
        assert!(matches!(
            input.parse::<EntityName>(),
            Err(CoreError::UnrecognisedCommand)
        ));
    }

    #[test_case(EntityName::Effects, "effect_id")]
    #[test_case(EntityName::AaResiduesRef, "aa_residue_id")]
    #[test_case(EntityName::AaResiduesAlt, "aa_residue_id")]
    #[test_case(EntityName::NucMutations, "nuc_mutation_id")]
    #[test_case(EntityName::Assays, "assay_id")]
    fn test_identifier_fields(name: EntityName, field: &str) {
        assert_eq!(name.identifier_field(), field);
    }

    #[test]
    fn test_serde_uses_path_names() {
        let json = serde_json::to_string(&EntityName::NucPositionalMutations).unwrap();
        assert_eq!(json, "\"nuc_positional_mutations\"");
    }
}
