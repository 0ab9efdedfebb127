//! Schema definitions and migration runner for SurrealDB.
//!
//! The user table name is configurable, so migration DDL is templated on
//! it. Table names are validated before they are spliced into DDL.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS table_name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_table_version ON TABLE _migration \
    COLUMNS table_name, version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    /// DDL with `{table}` standing in for the user table name.
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "user_table",
    sql: USER_TABLE_V1,
}];

// -----------------------------------------------------------------------
// Schema v1
// -----------------------------------------------------------------------

// No unique index on username or email: duplicates are allowed.
const USER_TABLE_V1: &str = "\
DEFINE TABLE IF NOT EXISTS {table} SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS username ON TABLE {table} TYPE string;
DEFINE FIELD IF NOT EXISTS password_hash ON TABLE {table} TYPE string;
DEFINE FIELD IF NOT EXISTS email ON TABLE {table} TYPE string;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Check that `table` can be used verbatim as a SurrealQL table name.
pub fn validate_table_name(table: &str) -> Result<(), DbError> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    // `_migration` is reserved for bookkeeping.
    if !valid || table == "_migration" {
        return Err(DbError::InvalidTable(table.to_string()));
    }
    Ok(())
}

/// Run all pending migrations for the user table named `table`.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum recorded
/// for this table. All DEFINE statements are idempotent so re-running
/// is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>, table: &str) -> Result<(), DbError> {
    validate_table_name(table)?;

    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query(
            "SELECT version FROM _migration WHERE table_name = $table \
             ORDER BY version DESC LIMIT 1",
        )
        .bind(("table", table.to_string()))
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                table,
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            let sql = migration.sql.replace("{table}", table);
            db.query(&sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            db.query(
                "CREATE _migration SET table_name = $table, \
                 version = $version, name = $name",
            )
            .bind(("table", table.to_string()))
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                table,
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}
