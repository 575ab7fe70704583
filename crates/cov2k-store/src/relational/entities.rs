use cov2k_core::{EntityName, Record, ResolveError, ResolveResult, Scalar};
use rusqlite::types::Value;

use super::{SqlFilter, SqlTable};
use crate::translate;

/// Query definition of a sequence-store entity, or `None` for entities
/// held by the knowledge base.
pub fn table_for(entity: EntityName) -> Option<&'static SqlTable> {
    match entity {
        EntityName::Sequences => Some(&SEQUENCES),
        EntityName::HostSamples => Some(&HOST_SAMPLES),
        EntityName::NucMutations => Some(&NUC_MUTATIONS),
        EntityName::AaChanges => Some(&AA_CHANGES),
        EntityName::Epitopes => Some(&EPITOPES),
        EntityName::Assays => Some(&ASSAYS),
        _ => None,
    }
}

const fn filter(key: &'static str, clause: &'static str, bind: super::Binder) -> SqlFilter {
    SqlFilter { key, clause, bind }
}

/// Epitopes sharing cell type, MHC class and allele with the given epitope.
const SAME_ASSAY: &str = "AND (e.cell_type, coalesce(e.mhc_class, ''), coalesce(e.mhc_allele, '')) = \
     (SELECT cell_type, coalesce(mhc_class, ''), coalesce(mhc_allele, '') FROM epitope WHERE epitope_id = ?)";

static SEQUENCES: SqlTable = SqlTable {
    entity: EntityName::Sequences,
    select: "SELECT s.sequence_id, s.accession_id, s.source_database, s.length, s.n_percentage, \
             s.gc_percentage FROM sequence s WHERE 1 = 1",
    group_by: None,
    order_by: "s.sequence_id",
    by_id: filter("sequence_id", "AND s.sequence_id = ?", bind_int),
    filters: &[
        filter(
            "nuc_mutation_id",
            "AND s.sequence_id IN (SELECT sequence_id FROM nucleotide_variant \
             WHERE upper(reference) = ? AND position = ? AND upper(alternative) = ?)",
            bind_nuc_mutation,
        ),
        filter(
            "aa_change_id",
            "AND s.sequence_id IN (SELECT sequence_id FROM aminoacid_variant \
             WHERE protein = ? AND upper(reference) = ? AND position = ? AND upper(alternative) = ?)",
            bind_aa_change,
        ),
        filter("host_sample_id", "AND s.host_sample_id = ?", bind_int),
        filter("accession_id", "AND s.accession_id LIKE ?", bind_text),
        filter("source_database", "AND s.source_database LIKE ?", bind_text),
        filter("length", "AND s.length = ?", bind_int),
        filter("n_percentage", "AND s.n_percentage = ?", bind_float),
        filter("gc_percentage", "AND s.gc_percentage = ?", bind_float),
    ],
    post: None,
};

static HOST_SAMPLES: SqlTable = SqlTable {
    entity: EntityName::HostSamples,
    select: "SELECT h.host_sample_id, h.continent, h.country, h.region, h.collection_date, \
             h.host_species FROM host_sample h WHERE 1 = 1",
    group_by: None,
    order_by: "h.host_sample_id",
    by_id: filter("host_sample_id", "AND h.host_sample_id = ?", bind_int),
    filters: &[
        filter(
            "sequence_id",
            "AND h.host_sample_id IN (SELECT host_sample_id FROM sequence WHERE sequence_id = ?)",
            bind_int,
        ),
        filter("continent", "AND h.continent LIKE ?", bind_text),
        filter("country", "AND h.country LIKE ?", bind_text),
        filter("region", "AND h.region LIKE ?", bind_text),
        filter("collection_date", "AND h.collection_date = ?", bind_text),
        filter("host_species", "AND lower(h.host_species) = lower(?)", bind_text),
    ],
    post: None,
};

const NUC_MUTATION_MATCH: &str =
    "AND upper(n.reference) = ? AND n.position = ? AND upper(n.alternative) = ?";

static NUC_MUTATIONS: SqlTable = SqlTable {
    entity: EntityName::NucMutations,
    select: "SELECT DISTINCT upper(n.reference || n.position || n.alternative) AS nuc_mutation_id, \
             upper(n.reference) AS reference, n.position AS position, \
             upper(n.alternative) AS alternative, n.type AS type, n.length AS length \
             FROM nucleotide_variant n WHERE 1 = 1",
    group_by: None,
    order_by: "nuc_mutation_id, length, type",
    by_id: filter("nuc_mutation_id", NUC_MUTATION_MATCH, bind_nuc_mutation),
    filters: &[
        filter("sequence_id", "AND n.sequence_id = ?", bind_int),
        filter("nuc_positional_mutation_id", NUC_MUTATION_MATCH, bind_nuc_mutation),
        filter("reference", "AND upper(n.reference) = ?", bind_upper),
        filter("position", "AND n.position = ?", bind_int),
        filter("alternative", "AND upper(n.alternative) = ?", bind_upper),
        filter("type", "AND upper(n.type) = ?", bind_upper),
        filter("length", "AND n.length = ?", bind_int),
    ],
    post: None,
};

const AA_CHANGE_MATCH: &str = "AND a.protein = ? AND upper(a.reference) = ? AND a.position = ? \
     AND upper(a.alternative) = ?";

static AA_CHANGES: SqlTable = SqlTable {
    entity: EntityName::AaChanges,
    select: "SELECT DISTINCT coalesce(p.short, a.protein) || ':' || upper(a.reference) || \
             a.position || upper(a.alternative) AS aa_change_id, \
             coalesce(p.short, a.protein) AS protein_id, upper(a.reference) AS reference, \
             a.position AS position, upper(a.alternative) AS alternative, a.type AS type, \
             a.length AS length FROM aminoacid_variant a \
             LEFT JOIN protein_alias p ON p.storage = a.protein WHERE 1 = 1",
    group_by: None,
    order_by: "aa_change_id, length, type",
    by_id: filter("aa_change_id", AA_CHANGE_MATCH, bind_aa_change),
    filters: &[
        filter("sequence_id", "AND a.sequence_id = ?", bind_int),
        filter("protein_id", "AND a.protein = ?", bind_protein),
        filter("aa_positional_change_id", AA_CHANGE_MATCH, bind_aa_change),
        filter("reference", "AND upper(a.reference) = ?", bind_upper),
        filter("position", "AND a.position = ?", bind_int),
        filter("alternative", "AND upper(a.alternative) = ?", bind_upper),
        filter("type", "AND upper(a.type) = ?", bind_upper),
        filter("length", "AND a.length = ?", bind_int),
    ],
    post: None,
};

static EPITOPES: SqlTable = SqlTable {
    entity: EntityName::Epitopes,
    select: "SELECT e.epitope_id, e.protein_name AS protein_id, e.host_species, e.epitope_start, \
             e.epitope_stop FROM epitope e WHERE 1 = 1",
    group_by: None,
    order_by: "e.epitope_id",
    by_id: filter("epitope_id", "AND e.epitope_id = ?", bind_int),
    filters: &[
        filter("assay_id", SAME_ASSAY, bind_int),
        filter("protein_id", "AND e.protein_name = ?", bind_protein),
        filter(
            "aa_positional_change_id",
            "AND e.protein_name = ? AND e.epitope_start < ? AND e.epitope_stop > ?",
            bind_change_span,
        ),
        filter("host_species", "AND lower(e.host_species) = lower(?)", bind_text),
        filter("epitope_start", "AND e.epitope_start = ?", bind_int),
        filter("epitope_stop", "AND e.epitope_stop = ?", bind_int),
    ],
    post: Some(epitope_row),
};

// One assay per distinct (cell type, MHC class, allele); its id is the
// lowest epitope id of the group.
static ASSAYS: SqlTable = SqlTable {
    entity: EntityName::Assays,
    select: "SELECT MIN(e.epitope_id) AS assay_id, e.cell_type AS assay_type, \
             e.mhc_class AS mhc_class, e.mhc_allele AS hla_restriction FROM epitope e WHERE 1 = 1",
    group_by: Some("e.cell_type, e.mhc_class, e.mhc_allele"),
    order_by: "assay_id",
    by_id: filter("assay_id", SAME_ASSAY, bind_int),
    filters: &[
        filter("epitope_id", SAME_ASSAY, bind_int),
        filter("assay_type", "AND e.cell_type LIKE ?", bind_text),
        filter("mhc_class", "AND upper(e.mhc_class) = ?", bind_upper),
        filter("hla_restriction", "AND e.mhc_allele LIKE ?", bind_text),
    ],
    post: None,
};

fn bind_int(key: &'static str, value: &Scalar) -> ResolveResult<Vec<Value>> {
    value
        .as_i64()
        .map(|i| vec![Value::Integer(i)])
        .ok_or_else(|| {
            ResolveError::invalid_identifier(
                key,
                value.to_string(),
                format!("The given {key} is not a valid integer."),
            )
        })
}

fn bind_float(key: &'static str, value: &Scalar) -> ResolveResult<Vec<Value>> {
    value
        .as_f64()
        .map(|f| vec![Value::Real(f)])
        .ok_or_else(|| {
            ResolveError::invalid_identifier(
                key,
                value.to_string(),
                format!("The given {key} is not a valid number."),
            )
        })
}

fn bind_text(_key: &'static str, value: &Scalar) -> ResolveResult<Vec<Value>> {
    Ok(vec![Value::Text(value.to_string())])
}

fn bind_upper(_key: &'static str, value: &Scalar) -> ResolveResult<Vec<Value>> {
    Ok(vec![Value::Text(value.to_string().to_ascii_uppercase())])
}

fn bind_protein(_key: &'static str, value: &Scalar) -> ResolveResult<Vec<Value>> {
    let storage = translate::protein_filter_value(value.to_string().trim());
    Ok(vec![Value::Text(storage.to_string())])
}

fn bind_nuc_mutation(key: &'static str, value: &Scalar) -> ResolveResult<Vec<Value>> {
    let mutation = translate::parse_nuc_mutation(&value.to_string(), key)?;
    Ok(vec![
        Value::Text(mutation.reference),
        Value::Integer(mutation.position),
        Value::Text(mutation.alternative),
    ])
}

fn bind_aa_change(key: &'static str, value: &Scalar) -> ResolveResult<Vec<Value>> {
    let change = translate::parse_aa_change(&value.to_string(), key)?;
    Ok(vec![
        Value::Text(change.protein),
        Value::Text(change.reference),
        Value::Integer(change.position),
        Value::Text(change.alternative),
    ])
}

fn bind_change_span(key: &'static str, value: &Scalar) -> ResolveResult<Vec<Value>> {
    let change = translate::parse_aa_change(&value.to_string(), key)?;
    Ok(vec![
        Value::Text(change.protein),
        Value::Integer(change.position),
        Value::Integer(change.position),
    ])
}

fn short_protein(storage: Option<Scalar>) -> String {
    let storage = storage.map(|s| s.to_string()).unwrap_or_default();
    translate::storage_to_short(&storage)
        .map(str::to_string)
        .unwrap_or(storage)
}

fn epitope_row(mut record: Record) -> Record {
    let short = short_protein(record.remove("protein_id"));
    record.insert("protein_id", short);
    record
}
