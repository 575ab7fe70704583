//! Identifier translation between the public API and the sequence store.
//!
//! The API names proteins by short names (`S`, `NSP12`, `ORF8`) while the
//! sequence store uses long protein names (`Spike (surface glycoprotein)`).
//! Amino-acid changes on the ORF1a/ORF1ab/ORF1b polyproteins are stored
//! against the mature non-structural protein, so their positions are
//! remapped on the way in.

use cov2k_core::{ResolveError, ResolveResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// Storage name used for proteins the sequence store does not know.
/// Matches nothing.
pub const UNKNOWN_PROTEIN: &str = "_";

static AA_CHANGE: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^([A-Z][A-Z0-9]*):([A-Z\-\*]*)([\d/]+)([A-Z\-\*]+)$"));

static NUC_MUTATION: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^([A-Z\-\*]*)([\d/]+)([A-Z\-\*]+)$"));

/// (short name, storage name). Several short names may share a storage name.
const SHORT_TO_STORAGE: &[(&str, &str)] = &[
    ("NSP11", "NSP11"),
    ("NSP13", "NSP13 (helicase)"),
    ("NSP5", "NSP5 (3C-like proteinase)"),
    ("NSP12", "NSP12 (RNA-dependent RNA polymerase)"),
    ("ORF1AB", "ORF1ab polyprotein"),
    ("NS7B", "NS7b (ORF7b)"),
    ("ORF7B", "NS7b (ORF7b)"),
    ("N", "N (nucleocapsid phosphoprotein)"),
    ("ORF1A", "ORF1a polyprotein"),
    ("NSP10", "NSP10"),
    ("NSP16", "NSP16 (2'-O-ribose methyltransferase)"),
    ("NSP14", "NSP14 (3'-to-5' exonuclease)"),
    ("NSP1", "NSP1 (leader protein)"),
    ("NSP7", "NSP7"),
    ("NSP3", "NSP3"),
    ("NSP2", "NSP2"),
    ("NSP9", "NSP9"),
    ("NSP6", "NSP6"),
    ("NSP4", "NSP4"),
    ("NSP8", "NSP8"),
    ("NS7A", "NS7a (ORF7a protein)"),
    ("ORF7A", "NS7a (ORF7a protein)"),
    ("NS8", "NS8 (ORF8 protein)"),
    ("ORF8", "NS8 (ORF8 protein)"),
    ("NS6", "NS6 (ORF6 protein)"),
    ("ORF6", "NS6 (ORF6 protein)"),
    ("ORF10", "ORF10 protein"),
    ("NSP15", "NSP15 (endoRNAse)"),
    ("S", "Spike (surface glycoprotein)"),
    ("NS3", "NS3 (ORF3a protein)"),
    ("ORF3A", "NS3 (ORF3a protein)"),
    ("M", "M (membrane glycoprotein)"),
    ("E", "E (envelope protein)"),
];

/// Canonical short name of every storage name.
const STORAGE_TO_SHORT: &[(&str, &str)] = &[
    ("NSP11", "NSP11"),
    ("NSP13 (helicase)", "NSP13"),
    ("NSP5 (3C-like proteinase)", "NSP5"),
    ("NSP12 (RNA-dependent RNA polymerase)", "NSP12"),
    ("ORF1ab polyprotein", "ORF1AB"),
    ("NS7b (ORF7b)", "NS7B"),
    ("N (nucleocapsid phosphoprotein)", "N"),
    ("ORF1a polyprotein", "ORF1A"),
    ("NSP10", "NSP10"),
    ("NSP16 (2'-O-ribose methyltransferase)", "NSP16"),
    ("NSP14 (3'-to-5' exonuclease)", "NSP14"),
    ("NSP1 (leader protein)", "NSP1"),
    ("NSP7", "NSP7"),
    ("NSP3", "NSP3"),
    ("NSP2", "NSP2"),
    ("NSP9", "NSP9"),
    ("NSP6", "NSP6"),
    ("NSP4", "NSP4"),
    ("NSP8", "NSP8"),
    ("NS7a (ORF7a protein)", "NS7A"),
    ("NS8 (ORF8 protein)", "NS8"),
    ("NS6 (ORF6 protein)", "NS6"),
    ("ORF10 protein", "ORF10"),
    ("NSP15 (endoRNAse)", "NSP15"),
    ("Spike (surface glycoprotein)", "S"),
    ("NS3 (ORF3a protein)", "NS3"),
    ("M (membrane glycoprotein)", "M"),
    ("E (envelope protein)", "E"),
];

/// Inclusive polyprotein ranges of the mature proteins of ORF1a/ORF1ab.
const ORF1AB_RANGES: &[(i64, i64, &str)] = &[
    (1, 180, "NSP1"),
    (181, 818, "NSP2"),
    (819, 2763, "NSP3"),
    (2764, 3263, "NSP4"),
    (3264, 3569, "NSP5"),
    (3570, 3859, "NSP6"),
    (3860, 3942, "NSP7"),
    (3943, 4140, "NSP8"),
    (4141, 4253, "NSP9"),
    (4254, 4392, "NSP10"),
    (4393, 5324, "NSP12"),
    (5325, 5925, "NSP13"),
    (5926, 6452, "NSP14"),
    (6453, 6798, "NSP15"),
    (6799, 7096, "NSP16"),
];

/// Inclusive ORF1b ranges. NSP12 starts 9 residues before ORF1b.
const ORF1B_RANGES: &[(i64, i64, &str)] = &[
    (1, 923, "NSP12"),
    (924, 1524, "NSP13"),
    (1525, 2051, "NSP14"),
    (2052, 2397, "NSP15"),
    (2398, 2695, "NSP16"),
];

/// Storage name for a short protein name, case-insensitive.
pub fn short_to_storage(short: &str) -> Option<&'static str> {
    let short = short.to_ascii_uppercase();
    SHORT_TO_STORAGE
        .iter()
        .find(|(s, _)| *s == short)
        .map(|(_, storage)| *storage)
}

/// Canonical short name for a storage protein name.
pub fn storage_to_short(storage: &str) -> Option<&'static str> {
    STORAGE_TO_SHORT
        .iter()
        .find(|(s, _)| *s == storage)
        .map(|(_, short)| *short)
}

/// Every (storage name, short name) pair, one per storage name.
pub fn protein_aliases() -> &'static [(&'static str, &'static str)] {
    STORAGE_TO_SHORT
}

/// Storage name for a short name, or [`UNKNOWN_PROTEIN`].
pub fn protein_filter_value(short: &str) -> &'static str {
    short_to_storage(short).unwrap_or(UNKNOWN_PROTEIN)
}

/// Mature protein and local position for a polyprotein coordinate.
pub fn remap_polyprotein(protein: &str, position: i64) -> Option<(&'static str, i64)> {
    match protein.to_ascii_uppercase().as_str() {
        "ORF1A" | "ORF1AB" => ORF1AB_RANGES
            .iter()
            .find(|(start, stop, _)| (*start..=*stop).contains(&position))
            .map(|(start, _, nsp)| (*nsp, position - start + 1)),
        "ORF1B" => ORF1B_RANGES
            .iter()
            .find(|(start, stop, _)| (*start..=*stop).contains(&position))
            .map(|(start, _, nsp)| match *nsp {
                "NSP12" => (*nsp, position + 9),
                _ => (*nsp, position - start + 1),
            }),
        _ => None,
    }
}

/// An amino-acid change in sequence-store coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AaChange {
    /// Storage protein name, or [`UNKNOWN_PROTEIN`].
    pub protein: String,
    pub reference: String,
    pub position: i64,
    pub alternative: String,
}

/// A nucleotide mutation, upper-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NucMutation {
    pub reference: String,
    pub position: i64,
    pub alternative: String,
}

impl NucMutation {
    pub fn id(&self) -> String {
        format!("{}{}{}", self.reference, self.position, self.alternative)
    }
}

fn not_syntactically_valid(kind: &'static str, value: &str) -> ResolveError {
    ResolveError::invalid_identifier(
        kind,
        value,
        format!("The given {kind} is not syntactically valid."),
    )
}

fn compiled(regex: &'static Lazy<Result<Regex, regex::Error>>) -> ResolveResult<&'static Regex> {
    Lazy::force(regex)
        .as_ref()
        .map_err(|e| ResolveError::Backend(format!("identifier pattern: {e}")))
}

/// Parse `PROTEIN:REFposALT` (e.g. `S:D614G`, `ORF1AB:P4715L`).
///
/// `kind` names the parameter in the rejection message.
pub fn parse_aa_change(value: &str, kind: &'static str) -> ResolveResult<AaChange> {
    let upper = value.trim().to_ascii_uppercase();
    let captures = compiled(&AA_CHANGE)?
        .captures(&upper)
        .ok_or_else(|| not_syntactically_valid(kind, value))?;

    let protein = &captures[1];
    let position: i64 = captures[3]
        .parse()
        .map_err(|_| not_syntactically_valid(kind, value))?;

    let (storage, position) = match remap_polyprotein(protein, position) {
        Some((nsp, local)) => (protein_filter_value(nsp), local),
        None => (protein_filter_value(protein), position),
    };

    Ok(AaChange {
        protein: storage.to_string(),
        reference: captures[2].to_string(),
        position,
        alternative: captures[4].to_string(),
    })
}

/// Short protein name of an amino-acid change id, without validating the rest.
pub fn aa_change_protein(value: &str) -> Option<&str> {
    value.split_once(':').map(|(protein, _)| protein)
}

/// Parse `REFposALT` (e.g. `A23403G`).
pub fn parse_nuc_mutation(value: &str, kind: &'static str) -> ResolveResult<NucMutation> {
    let upper = value.trim().to_ascii_uppercase();
    let captures = compiled(&NUC_MUTATION)?
        .captures(&upper)
        .ok_or_else(|| not_syntactically_valid(kind, value))?;
    let position = captures[2]
        .parse()
        .map_err(|_| not_syntactically_valid(kind, value))?;
    Ok(NucMutation {
        reference: captures[1].to_string(),
        position,
        alternative: captures[3].to_string(),
    })
}

/// Split a residue change id (`DG`) into its reference and alternative residues.
pub fn parse_residue_change(value: &str) -> ResolveResult<(char, char)> {
    let mut chars = value.trim().chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some(reference), Some(alternative), None) => Ok((
            reference.to_ascii_uppercase(),
            alternative.to_ascii_uppercase(),
        )),
        _ => Err(ResolveError::invalid_identifier(
            "aa_residue_change_id",
            value,
            "The given aa_residue_change_id is not valid. A valud aa_residue_change_id is made of two AA residue letters.",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("S", Some("Spike (surface glycoprotein)"))]
    #[test_case("orf8", Some("NS8 (ORF8 protein)"))]
    #[test_case("NS8", Some("NS8 (ORF8 protein)"))]
    #[test_case("ORF1B", None)]
    #[test_case("XYZ", None)]
    fn test_short_to_storage(short: &str, expected: Option<&str>) {
        assert_eq!(short_to_storage(short), expected);
    }

    #[test]
    fn test_reverse_map_uses_canonical_names() {
        assert_eq!(storage_to_short("NS8 (ORF8 protein)"), Some("NS8"));
        assert_eq!(storage_to_short("NS7b (ORF7b)"), Some("NS7B"));
        assert_eq!(storage_to_short("Spike (surface glycoprotein)"), Some("S"));
        assert_eq!(storage_to_short("nope"), None);
    }

    #[test]
    fn test_protein_aliases_cover_every_storage_name() {
        let aliases = protein_aliases();
        for (_, storage) in SHORT_TO_STORAGE {
            assert_eq!(aliases.iter().filter(|(s, _)| s == storage).count(), 1, "{storage}");
        }
    }

    #[test]
    fn test_every_storage_name_round_trips() {
        for (_, storage) in SHORT_TO_STORAGE {
            let short = storage_to_short(storage).unwrap();
            assert_eq!(short_to_storage(short), Some(*storage));
        }
    }

    #[test_case("ORF1AB", 4715, Some(("NSP12", 323)))]
    #[test_case("ORF1A", 1, Some(("NSP1", 1)))]
    #[test_case("ORF1A", 3263, Some(("NSP4", 500)))]
    #[test_case("ORF1B", 314, Some(("NSP12", 323)))]
    #[test_case("ORF1B", 924, Some(("NSP13", 1)))]
    #[test_case("ORF1AB", 9000, None)]
    #[test_case("S", 614, None)]
    fn test_remap_polyprotein(protein: &str, position: i64, expected: Option<(&str, i64)>) {
        assert_eq!(remap_polyprotein(protein, position), expected);
    }

    #[test]
    fn test_parse_spike_change() {
        let change = parse_aa_change("s:d614g", "aa_change_id").unwrap();
        assert_eq!(change.protein, "Spike (surface glycoprotein)");
        assert_eq!(change.reference, "D");
        assert_eq!(change.position, 614);
        assert_eq!(change.alternative, "G");
    }

    #[test]
    fn test_parse_accepts_alphanumeric_proteins() {
        let change = parse_aa_change("NSP12:P323L", "aa_change_id").unwrap();
        assert_eq!(change.protein, "NSP12 (RNA-dependent RNA polymerase)");

        let remapped = parse_aa_change("ORF1AB:P4715L", "aa_change_id").unwrap();
        assert_eq!(remapped, change);
    }

    #[test]
    fn test_parse_deletion_and_unknown_protein() {
        let deletion = parse_aa_change("S:HV69-", "aa_change_id").unwrap();
        assert_eq!(deletion.reference, "HV");
        assert_eq!(deletion.alternative, "-");

        let unknown = parse_aa_change("FOO:A1B", "aa_change_id").unwrap();
        assert_eq!(unknown.protein, UNKNOWN_PROTEIN);

        let unresolved = parse_aa_change("ORF1B:A5000B", "aa_change_id").unwrap();
        assert_eq!(unresolved.protein, UNKNOWN_PROTEIN);
    }

    #[test_case("D614G", "aa_change_id")]
    #[test_case("S:614", "aa_positional_change_id")]
    #[test_case(":D614G", "aa_change_id")]
    fn test_parse_aa_change_rejects(value: &str, kind: &'static str) {
        let err = parse_aa_change(value, kind).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("The given {kind} is not syntactically valid.")
        );
    }

    #[test]
    fn test_parse_nuc_mutation() {
        let mutation = parse_nuc_mutation("a23403g", "nuc_mutation_id").unwrap();
        assert_eq!(mutation.id(), "A23403G");
        assert!(parse_nuc_mutation("23403", "nuc_mutation_id").is_err());
        let err = parse_nuc_mutation("S:D614G", "nuc_positional_mutation_id").unwrap_err();
        assert_eq!(
            err.to_string(),
            "The given nuc_positional_mutation_id is not syntactically valid."
        );
    }

    #[test]
    fn test_parse_residue_change() {
        assert_eq!(parse_residue_change("dg").unwrap(), ('D', 'G'));
        assert!(parse_residue_change("D").is_err());
        assert!(parse_residue_change("DGA").is_err());
    }
}
