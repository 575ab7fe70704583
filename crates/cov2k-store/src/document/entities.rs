//! Filter tables of the knowledge-base entities.
//!
//! Each entity lists its filters in evaluation order. The order matters:
//! the first filter supplied by a request decides the order of the result
//! before the final sort.

use cov2k_core::{EntityName, Record, ResolveResult, Scalar};

use crate::translate;

/// Predicate over a record and the value supplied for a filter.
pub type Predicate = fn(&Record, &Scalar) -> ResolveResult<bool>;

/// Predicate over a local record and a record of another store.
pub type ForeignPredicate = fn(&Record, &Record) -> bool;

/// How a filter key selects records of a knowledge-base entity.
#[derive(Debug, Clone, Copy)]
pub enum DocFilter {
    /// Field equality.
    Field(&'static str),
    /// Related to the given id of another entity through the link index.
    /// The key is the other entity's identifier field.
    Linked(EntityName),
    /// Id equals a field of the other entity's record with the given id.
    Reference {
        other: EntityName,
        field: &'static str,
    },
    /// Derived condition on the record itself.
    Computed {
        key: &'static str,
        matches: Predicate,
    },
    /// Condition against records resolved by another store.
    Foreign {
        other: EntityName,
        matches: ForeignPredicate,
    },
}

impl DocFilter {
    pub fn key(&self) -> &'static str {
        match self {
            DocFilter::Field(field) => *field,
            DocFilter::Linked(other)
            | DocFilter::Reference { other, .. }
            | DocFilter::Foreign { other, .. } => other.identifier_field(),
            DocFilter::Computed { key, .. } => *key,
        }
    }
}

/// Filters of a knowledge-base entity, or `None` for entities held by the
/// sequence store.
pub fn filters_for(entity: EntityName) -> Option<Vec<DocFilter>> {
    use DocFilter::{Computed, Field, Foreign, Linked, Reference};
    use EntityName as E;

    let filters = match entity {
        E::Variants => vec![Linked(E::Namings), Linked(E::Effects), Linked(E::Contexts)],
        E::Namings => vec![Linked(E::Variants), Field("organization"), Field("v_class")],
        E::Contexts => vec![
            Linked(E::Variants),
            Linked(E::AaPositionalChanges),
            Linked(E::NucPositionalMutations),
            Field("owner"),
            Field("rule_description"),
        ],
        E::Effects => vec![
            Linked(E::Variants),
            Linked(E::AaPositionalChanges),
            Linked(E::Evidences),
            Linked(E::AaChangeGroups),
            Field("type"),
            Field("lv"),
            Field("method"),
        ],
        E::Evidences => vec![
            Linked(E::Effects),
            Field("citation"),
            Field("type"),
            Field("uri"),
            Field("publisher"),
        ],
        E::NucPositionalMutations => vec![
            Linked(E::Contexts),
            Linked(E::NucAnnotations),
            Computed {
                key: "nuc_mutation_id",
                matches: same_nuc_mutation,
            },
            Field("reference"),
            Field("position"),
            Field("alternative"),
            Field("type"),
            Field("length"),
        ],
        E::AaPositionalChanges => vec![
            Linked(E::Contexts),
            Linked(E::Effects),
            Field("protein_id"),
            Linked(E::AaChangeGroups),
            Computed {
                key: "aa_residue_change_id",
                matches: has_residue_change,
            },
            Foreign {
                other: E::Epitopes,
                matches: change_within_epitope,
            },
            Computed {
                key: "aa_change_id",
                matches: same_aa_change,
            },
            Field("reference"),
            Field("position"),
            Field("alternative"),
            Field("type"),
            Field("length"),
        ],
        E::AaChangeGroups => vec![Linked(E::AaPositionalChanges), Linked(E::Effects)],
        E::NucAnnotations => vec![
            Linked(E::Proteins),
            Computed {
                key: "nuc_positional_mutation_id",
                matches: annotation_covers_mutation,
            },
            Field("name"),
            Field("start_on_ref"),
            Field("stop_on_ref"),
        ],
        E::Proteins => vec![
            Linked(E::NucAnnotations),
            Reference {
                other: E::ProteinRegions,
                field: "protein_id",
            },
            Computed {
                key: "aa_positional_change_id",
                matches: protein_of_positional_change,
            },
            Computed {
                key: "aa_change_id",
                matches: protein_of_change,
            },
            Foreign {
                other: E::Epitopes,
                matches: protein_of_epitope,
            },
            Field("aa_length"),
            Field("aa_sequence"),
        ],
        E::ProteinRegions => vec![
            Field("protein_id"),
            Field("name"),
            Field("type"),
            Field("category"),
            Field("start_on_protein"),
            Field("stop_on_protein"),
        ],
        E::AaResidueChanges => vec![
            Computed {
                key: "aa_positional_change_id",
                matches: residue_change_of_change,
            },
            Computed {
                key: "aa_residue_id",
                matches: residue_change_involves,
            },
            Field("reference"),
            Field("alternative"),
            Field("grantham_distance"),
            Field("type"),
        ],
        E::AaResidues => residue_filters(residue_in_change),
        E::AaResiduesRef => residue_filters(residue_is_reference),
        E::AaResiduesAlt => residue_filters(residue_is_alternative),
        E::Sequences | E::HostSamples | E::NucMutations | E::AaChanges | E::Epitopes | E::Assays => {
            return None
        }
    };
    Some(filters)
}

/// Collection holding the records of `entity`. The three residue views
/// share one collection.
pub fn collection_of(entity: EntityName) -> EntityName {
    match entity {
        EntityName::AaResiduesRef | EntityName::AaResiduesAlt => EntityName::AaResidues,
        other => other,
    }
}

fn residue_filters(by_change: Predicate) -> Vec<DocFilter> {
    let mut filters = vec![DocFilter::Computed {
        key: "aa_residue_change_id",
        matches: by_change,
    }];
    filters.extend(
        [
            "molecular_weight",
            "isoelectric_point",
            "hydrophobicity",
            "potential_side_chain_h_bonds",
            "polarity",
            "r_group_structure",
            "charge",
            "essentiality",
            "side_chain_flexibility",
            "chemical_group_in_the_side_chain",
        ]
        .map(DocFilter::Field),
    );
    filters
}

fn text_of(record: &Record, field: &str) -> Option<String> {
    record.get(field).filter(|v| !v.is_null()).map(Scalar::to_string)
}

fn field_eq(record: &Record, field: &str, expected: &str) -> bool {
    text_of(record, field).is_some_and(|v| v.eq_ignore_ascii_case(expected))
}

fn int_of(record: &Record, field: &str) -> Option<i64> {
    record.get(field).and_then(Scalar::as_i64)
}

fn same_nuc_mutation(record: &Record, value: &Scalar) -> ResolveResult<bool> {
    let mutation = translate::parse_nuc_mutation(&value.to_string(), "nuc_mutation_id")?;
    Ok(field_eq(record, "nuc_positional_mutation_id", &mutation.id()))
}

fn has_residue_change(record: &Record, value: &Scalar) -> ResolveResult<bool> {
    let (reference, alternative) = translate::parse_residue_change(&value.to_string())?;
    Ok(field_eq(record, "reference", &reference.to_string())
        && field_eq(record, "alternative", &alternative.to_string()))
}

fn same_aa_change(record: &Record, value: &Scalar) -> ResolveResult<bool> {
    let value = value.to_string();
    translate::parse_aa_change(&value, "aa_change_id")?;
    Ok(field_eq(record, "aa_positional_change_id", value.trim()))
}

fn change_within_epitope(change: &Record, epitope: &Record) -> bool {
    let same_protein = text_of(epitope, "protein_id")
        .is_some_and(|protein| field_eq(change, "protein_id", &protein));
    match (
        int_of(change, "position"),
        int_of(epitope, "epitope_start"),
        int_of(epitope, "epitope_stop"),
    ) {
        (Some(position), Some(start), Some(stop)) => same_protein && start < position && position < stop,
        _ => false,
    }
}

fn annotation_covers_mutation(record: &Record, value: &Scalar) -> ResolveResult<bool> {
    let mutation = translate::parse_nuc_mutation(&value.to_string(), "nuc_positional_mutation_id")?;
    Ok(match (int_of(record, "start_on_ref"), int_of(record, "stop_on_ref")) {
        (Some(start), Some(stop)) => start <= mutation.position && mutation.position <= stop,
        _ => false,
    })
}

fn protein_named_by(record: &Record, value: &Scalar, kind: &'static str) -> ResolveResult<bool> {
    let value = value.to_string();
    translate::parse_aa_change(&value, kind)?;
    Ok(translate::aa_change_protein(value.trim())
        .is_some_and(|protein| field_eq(record, "protein_id", protein)))
}

fn protein_of_positional_change(record: &Record, value: &Scalar) -> ResolveResult<bool> {
    protein_named_by(record, value, "aa_positional_change_id")
}

fn protein_of_change(record: &Record, value: &Scalar) -> ResolveResult<bool> {
    protein_named_by(record, value, "aa_change_id")
}

fn protein_of_epitope(protein: &Record, epitope: &Record) -> bool {
    text_of(epitope, "protein_id").is_some_and(|id| field_eq(protein, "protein_id", &id))
}

fn residue_change_of_change(record: &Record, value: &Scalar) -> ResolveResult<bool> {
    let change = translate::parse_aa_change(&value.to_string(), "aa_positional_change_id")?;
    Ok(field_eq(record, "reference", &change.reference)
        && field_eq(record, "alternative", &change.alternative))
}

fn residue_change_involves(record: &Record, value: &Scalar) -> ResolveResult<bool> {
    let residue = value.to_string();
    Ok(field_eq(record, "reference", &residue) || field_eq(record, "alternative", &residue))
}

fn residue_in_change(record: &Record, value: &Scalar) -> ResolveResult<bool> {
    let (reference, alternative) = translate::parse_residue_change(&value.to_string())?;
    Ok(field_eq(record, "aa_residue_id", &reference.to_string())
        || field_eq(record, "aa_residue_id", &alternative.to_string()))
}

fn residue_is_reference(record: &Record, value: &Scalar) -> ResolveResult<bool> {
    let (reference, _) = translate::parse_residue_change(&value.to_string())?;
    Ok(field_eq(record, "aa_residue_id", &reference.to_string()))
}

fn residue_is_alternative(record: &Record, value: &Scalar) -> ResolveResult<bool> {
    let (_, alternative) = translate::parse_residue_change(&value.to_string())?;
    Ok(field_eq(record, "aa_residue_id", &alternative.to_string()))
}
