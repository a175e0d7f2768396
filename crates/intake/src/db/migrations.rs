//! Versioned schema migrations.
//!
//! Applied migrations are tracked in a `_migrations` table and pending
//! ones run in order when the store is opened. Conditional kinds let the
//! same list upgrade both fresh files and databases written by earlier
//! releases (no `skills`/`message_id` columns, composite unique key).

use rusqlite::Connection;

use super::error::DatabaseError;

struct Migration {
    version: u32,
    description: &'static str,
    sql: &'static str,
    kind: MigrationKind,
}

enum MigrationKind {
    /// Execute the SQL directly.
    Standard,
    /// ALTER TABLE ADD COLUMN: skip if column already exists.
    AddColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Run only if the table's stored DDL contains `fragment`
    /// (whitespace-insensitive, case-insensitive).
    TableDefinitionContains {
        table: &'static str,
        fragment: &'static str,
    },
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "create_contacts_table",
        sql: include_str!("sql/001_create_contacts.sql"),
        kind: MigrationKind::Standard,
    },
    Migration {
        version: 2,
        description: "add_skills_to_contacts",
        sql: include_str!("sql/002_add_skills.sql"),
        kind: MigrationKind::AddColumn {
            table: "contacts",
            column: "skills",
        },
    },
    Migration {
        version: 3,
        description: "add_message_id_to_contacts",
        sql: include_str!("sql/003_add_message_id.sql"),
        kind: MigrationKind::AddColumn {
            table: "contacts",
            column: "message_id",
        },
    },
    Migration {
        version: 4,
        description: "drop_composite_unique_from_contacts",
        sql: include_str!("sql/004_drop_composite_unique.sql"),
        kind: MigrationKind::TableDefinitionContains {
            table: "contacts",
            fragment: "UNIQUE(email_sender,email_date,name)",
        },
    },
    Migration {
        version: 5,
        description: "create_contact_indexes",
        sql: include_str!("sql/005_create_contact_indexes.sql"),
        kind: MigrationKind::Standard,
    },
];

/// Runs all pending migrations on the given connection.
pub fn run_all(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _migrations",
        [],
        |r| r.get(0),
    )?;

    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        log::info!(
            "Running migration v{}: {}",
            migration.version,
            migration.description
        );

        let should_run = match &migration.kind {
            MigrationKind::Standard => true,
            MigrationKind::AddColumn { table, column } => !column_exists(conn, table, column)?,
            MigrationKind::TableDefinitionContains { table, fragment } => {
                table_definition_contains(conn, table, fragment)?
            }
        };

        if should_run {
            conn.execute_batch(migration.sql)
                .map_err(|e| DatabaseError::Migration {
                    version: migration.version,
                    reason: e.to_string(),
                })?;
        } else {
            log::info!(
                "Skipping migration v{} (condition not met)",
                migration.version
            );
        }

        conn.execute(
            "INSERT INTO _migrations (version, description) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.description],
        )?;
    }

    Ok(())
}

fn validate_identifier(table: &str) -> Result<(), DatabaseError> {
    if table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(DatabaseError::Migration {
            version: 0,
            reason: format!("Invalid table name: {}", table),
        })
    }
}

/// Checks whether a column exists on a table using `PRAGMA table_info`.
fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    validate_identifier(table)?;
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let exists = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .any(|r| r.map(|name| name == column).unwrap_or(false));
    Ok(exists)
}

fn table_definition_contains(
    conn: &Connection,
    table: &str,
    fragment: &str,
) -> Result<bool, DatabaseError> {
    validate_identifier(table)?;
    let mut stmt =
        conn.prepare("SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    let mut rows = stmt.query_map([table], |row| row.get::<_, Option<String>>(0))?;
    let sql = match rows.next() {
        Some(row) => row?.unwrap_or_default(),
        None => return Ok(false),
    };

    let squash = |s: &str| -> String {
        s.chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase()
    };
    Ok(squash(&sql).contains(&squash(fragment)))
}
