//! Schema management and migrations

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::translate;

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 2;

/// Sequence-store data tables, in dependency order.
pub const TABLES: [&str; 5] = [
    "host_sample",
    "sequence",
    "nucleotide_variant",
    "aminoacid_variant",
    "epitope",
];

pub fn apply_migrations(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version < SCHEMA_VERSION {
        info!(from = current_version, to = SCHEMA_VERSION, "Applying schema migrations");
    }
    if current_version < 1 {
        apply_migration_v1(conn)?;
    }
    if current_version < 2 {
        apply_migration_v2(conn)?;
    }
    sync_protein_aliases(conn)
}

pub fn current_version(conn: &Connection) -> StoreResult<i32> {
    let version: Option<i32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))?;
    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, version: i32) -> StoreResult<()> {
    conn.execute("INSERT INTO schema_migrations (version) VALUES (?)", [version])?;
    Ok(())
}

/// Migration v1: sequence, variant and epitope tables
fn apply_migration_v1(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| StoreError::Schema(format!("Failed to apply v1 schema: {}", e)))?;
    record_migration(conn, 1)?;
    info!("Migration v1 applied");
    Ok(())
}

/// Migration v2: protein short names for labelling amino-acid changes
fn apply_migration_v2(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(SCHEMA_V2)
        .map_err(|e| StoreError::Schema(format!("Failed to apply v2 schema: {}", e)))?;
    record_migration(conn, 2)?;
    info!("Migration v2 applied");
    Ok(())
}

/// Rewrite `protein_alias` from the built-in protein name table.
fn sync_protein_aliases(conn: &Connection) -> StoreResult<()> {
    conn.execute("DELETE FROM protein_alias", [])?;
    let mut insert = conn.prepare_cached("INSERT INTO protein_alias (storage, short) VALUES (?, ?)")?;
    for (storage, short) in translate::protein_aliases() {
        insert.execute([*storage, *short])?;
    }
    debug!(aliases = translate::protein_aliases().len(), "Protein aliases synced");
    Ok(())
}

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS host_sample (
    host_sample_id INTEGER PRIMARY KEY,
    continent TEXT,
    country TEXT,
    region TEXT,
    collection_date TEXT,
    host_species TEXT
);

CREATE TABLE IF NOT EXISTS sequence (
    sequence_id INTEGER PRIMARY KEY,
    accession_id TEXT NOT NULL,
    source_database TEXT,
    length INTEGER,
    n_percentage REAL,
    gc_percentage REAL,
    host_sample_id INTEGER REFERENCES host_sample(host_sample_id)
);

CREATE INDEX IF NOT EXISTS idx_sequence_host_sample ON sequence(host_sample_id);
CREATE INDEX IF NOT EXISTS idx_sequence_accession ON sequence(accession_id);

-- reference/alternative are stored upper-case
CREATE TABLE IF NOT EXISTS nucleotide_variant (
    sequence_id INTEGER NOT NULL REFERENCES sequence(sequence_id) ON DELETE CASCADE,
    reference TEXT NOT NULL,
    position INTEGER NOT NULL,
    alternative TEXT NOT NULL,
    type TEXT,
    length INTEGER
);

CREATE INDEX IF NOT EXISTS idx_nuc_variant_sequence ON nucleotide_variant(sequence_id);
CREATE INDEX IF NOT EXISTS idx_nuc_variant_change ON nucleotide_variant(position, reference, alternative);

-- protein holds the storage protein name, e.g. 'Spike (surface glycoprotein)'
CREATE TABLE IF NOT EXISTS aminoacid_variant (
    sequence_id INTEGER NOT NULL REFERENCES sequence(sequence_id) ON DELETE CASCADE,
    protein TEXT NOT NULL,
    reference TEXT NOT NULL,
    position INTEGER NOT NULL,
    alternative TEXT NOT NULL,
    type TEXT,
    length INTEGER
);

CREATE INDEX IF NOT EXISTS idx_aa_variant_sequence ON aminoacid_variant(sequence_id);
CREATE INDEX IF NOT EXISTS idx_aa_variant_change ON aminoacid_variant(protein, position, reference, alternative);

CREATE TABLE IF NOT EXISTS epitope (
    epitope_id INTEGER PRIMARY KEY,
    protein_name TEXT NOT NULL,
    host_species TEXT,
    epitope_start INTEGER,
    epitope_stop INTEGER,
    cell_type TEXT,
    mhc_class TEXT,
    mhc_allele TEXT
);

CREATE INDEX IF NOT EXISTS idx_epitope_protein ON epitope(protein_name);
"#;

const SCHEMA_V2: &str = r#"
CREATE TABLE IF NOT EXISTS protein_alias (
    storage TEXT PRIMARY KEY,
    short TEXT NOT NULL
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();
        apply_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, 2);
    }

    #[test]
    fn test_v1_database_is_upgraded() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .unwrap();
        apply_migration_v1(&conn).unwrap();

        apply_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), 2);
        let short: String = conn
            .query_row(
                "SELECT short FROM protein_alias WHERE storage = 'NS8 (ORF8 protein)'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(short, "NS8");
    }

    #[test]
    fn test_protein_aliases_are_refreshed() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();
        conn.execute("UPDATE protein_alias SET short = 'X'", []).unwrap();
        conn.execute("INSERT INTO protein_alias VALUES ('stale', 'Y')", []).unwrap();

        apply_migrations(&conn).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM protein_alias", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count as usize, translate::protein_aliases().len());
        let spike: String = conn
            .query_row(
                "SELECT short FROM protein_alias WHERE storage = 'Spike (surface glycoprotein)'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(spike, "S");
    }

    #[test]
    fn test_tables_exist() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        for table in TABLES {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }
}
