//! Chains across the knowledge base and the sequence store.

use std::sync::Arc;

use cov2k_core::{ChainDriver, CoreError, EntityName, Filter, PageWindow, Record};
use cov2k_store::{build_catalog, KnowledgeBase, SqlitePool};

const KB: &str = r#"{
    "collections": {
        "variants": [{"variant_id": "v1"}, {"variant_id": "v2"}],
        "effects": [
            {"effect_id": "e1", "type": "infectivity", "lv": "higher", "method": "in vitro"},
            {"effect_id": "e2", "type": "binding", "lv": "lower", "method": "in silico"}
        ],
        "evidences": [
            {"evidence_id": "ev1", "citation": "Korber 2020", "type": "paper", "uri": null, "publisher": "Cell"}
        ],
        "aa_positional_changes": [
            {"aa_positional_change_id": "S:D614G", "protein_id": "S", "reference": "D", "position": 614, "alternative": "G", "type": "SUB", "length": 1},
            {"aa_positional_change_id": "N:R203K", "protein_id": "N", "reference": "R", "position": 203, "alternative": "K", "type": "SUB", "length": 1}
        ],
        "proteins": [
            {"protein_id": "S", "aa_length": 1273, "aa_sequence": "MFVFL"},
            {"protein_id": "N", "aa_length": 419, "aa_sequence": "MSDNG"}
        ],
        "protein_regions": [
            {"protein_region_id": "RBD", "name": "receptor binding domain", "type": "domain", "category": "functional", "protein_id": "S", "start_on_protein": 319, "stop_on_protein": 541}
        ],
        "aa_residue_changes": [
            {"aa_residue_change_id": "DG", "reference": "D", "alternative": "G", "grantham_distance": 94, "type": "radical"}
        ],
        "aa_residues": [
            {"aa_residue_id": "D", "charge": "negative"},
            {"aa_residue_id": "G", "charge": "neutral"}
        ]
    },
    "links": [
        {"from": "variants", "to": "aa_positional_changes", "pairs": [["v1", "S:D614G"], ["v2", "N:R203K"]]},
        {"from": "effects", "to": "aa_positional_changes", "pairs": [["e1", "S:D614G"], ["e2", "N:R203K"]]},
        {"from": "effects", "to": "evidences", "pairs": [["e1", "ev1"]]}
    ]
}"#;

const SEQUENCES: &str = r#"
INSERT INTO host_sample VALUES (1, 'Europe', 'Italy', NULL, '2021-03-01', 'Homo sapiens');
INSERT INTO sequence VALUES (10, 'EPI_ISL_1001', 'GISAID', 29870, 0.1, 38.0, 1);
INSERT INTO sequence VALUES (11, 'EPI_ISL_1002', 'GISAID', 29850, 0.0, 37.9, 1);
INSERT INTO aminoacid_variant VALUES (10, 'Spike (surface glycoprotein)', 'D', 614, 'G', 'SUB', 1);
INSERT INTO aminoacid_variant VALUES (11, 'N (nucleocapsid phosphoprotein)', 'R', 203, 'K', 'SUB', 1);
INSERT INTO epitope VALUES (1, 'Spike (surface glycoprotein)', 'Homo sapiens', 600, 620, 'T cell', 'I', 'HLA-A*02:01');
"#;

fn driver() -> ChainDriver {
    let kb = KnowledgeBase::from_json_str(KB).unwrap();
    let pool = SqlitePool::memory().unwrap();
    pool.execute_script(SEQUENCES).unwrap();
    let catalog = build_catalog(Arc::new(kb), pool).unwrap();
    ChainDriver::new(Arc::new(catalog))
}

fn ids(records: &[Record], entity: EntityName) -> Vec<String> {
    records
        .iter()
        .map(|r| r.identifier(entity).unwrap().to_string())
        .collect()
}

fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[tokio::test]
async fn test_sequences_carrying_a_change() {
    let driver = driver();
    let found = driver
        .combine("sequences/aa_changes/S:D614G", &[], None)
        .await
        .unwrap();
    assert_eq!(ids(&found, EntityName::Sequences), ["10"]);

    let changes = driver.combine("aa_changes/sequences/11", &[], None).await.unwrap();
    assert_eq!(ids(&changes, EntityName::AaChanges), ["N:R203K"]);
}

#[tokio::test]
async fn test_unsupported_hop_is_unrecognised_parameter() {
    let driver = driver();
    // positional changes carry no variant_id filter
    let err = driver
        .combine("sequences/aa_positional_changes/variants/v1", &[], None)
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::UnrecognisedQueryParameter);
}

#[tokio::test]
async fn test_knowledge_base_chain_with_query_filter() {
    let driver = driver();
    let found = driver
        .combine(
            "evidences/effects/aa_positional_changes",
            &params(&[("protein_id", "S")]),
            Some(PageWindow::default()),
        )
        .await
        .unwrap();
    assert_eq!(ids(&found, EntityName::Evidences), ["ev1"]);
}

#[tokio::test]
async fn test_epitope_filters_cross_stores() {
    let driver = driver();
    let changes = driver
        .combine("aa_positional_changes/epitopes/1", &[], None)
        .await
        .unwrap();
    assert_eq!(ids(&changes, EntityName::AaPositionalChanges), ["S:D614G"]);

    let proteins = driver.combine("proteins/epitopes/1", &[], None).await.unwrap();
    assert_eq!(ids(&proteins, EntityName::Proteins), ["S"]);

    let epitopes = driver
        .combine("epitopes/aa_positional_changes/S:D614G", &[], None)
        .await
        .unwrap();
    assert_eq!(ids(&epitopes, EntityName::Epitopes), ["1"]);
}

#[tokio::test]
async fn test_residue_views() {
    let driver = driver();
    let catalog = driver.catalog();

    let both = catalog
        .resolver_of(EntityName::AaResidues)
        .list(&Filter::single("aa_residue_change_id", "DG"), None)
        .await
        .unwrap();
    assert_eq!(ids(&both, EntityName::AaResidues), ["D", "G"]);

    let reference = driver
        .combine("aa_residues_ref/aa_residue_changes/aa_positional_changes/S:D614G", &[], None)
        .await
        .unwrap();
    assert_eq!(ids(&reference, EntityName::AaResiduesRef), ["D"]);

    let err = catalog
        .resolver_of(EntityName::AaResiduesAlt)
        .list(&Filter::single("aa_residue_change_id", "D"), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("two AA residue letters"));
}

#[tokio::test]
async fn test_proteins_by_region_and_change() {
    let driver = driver();
    let by_region = driver.combine("proteins/protein_regions/RBD", &[], None).await.unwrap();
    assert_eq!(ids(&by_region, EntityName::Proteins), ["S"]);

    let by_change = driver
        .combine("proteins", &params(&[("aa_change_id", "N:R203K")]), None)
        .await
        .unwrap();
    assert_eq!(ids(&by_change, EntityName::Proteins), ["N"]);
}

#[tokio::test]
async fn test_invalid_identifier_inside_chain_is_opaque() {
    let driver = driver();
    let err = driver
        .combine("sequences/aa_changes/D614G", &[], None)
        .await
        .unwrap_err();
    assert_eq!(err, CoreError::BadRequest);
    assert_eq!(err.status(), 400);
}

#[tokio::test]
async fn test_bundled_sample_data_loads() {
    let kb = KnowledgeBase::from_json_str(include_str!("../../../data/knowledge_base.sample.json")).unwrap();
    let pool = SqlitePool::memory().unwrap();
    pool.execute_script(include_str!("../../../data/sequences.sample.sql")).unwrap();
    let driver = ChainDriver::new(Arc::new(build_catalog(Arc::new(kb), pool).unwrap()));

    let variants = driver
        .combine("variants/effects/aa_positional_changes/S:N501Y", &[], None)
        .await
        .unwrap();
    assert_eq!(ids(&variants, EntityName::Variants), ["B.1.1.7"]);

    let sequences = driver
        .combine("sequences/aa_changes/ORF1AB:P4715L", &[], None)
        .await
        .unwrap();
    assert_eq!(ids(&sequences, EntityName::Sequences), ["2"]);
}
