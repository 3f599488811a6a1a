//! Database backup and restore
//!
//! A backup is plain SQL: one `TRUNCATE`, one `INSERT ... json_populate_record`
//! per row and a `setval` per table. Restore only accepts statements of
//! those three shapes and runs them in a single transaction.

use serde::Serialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};

/// Business tables in foreign-key order. `users` is never part of a backup.
const BACKUP_TABLES: &[&str] = &[
    "medicines",
    "customers",
    "suppliers",
    "inbounds",
    "sales",
    "stock_adjustments",
    "purchase_returns",
    "sales_returns",
    "stock_movements",
];

#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub connected: bool,
}

#[derive(Debug, Serialize)]
pub struct RestoreSummary {
    pub statements: usize,
}

/// Maintenance service
#[derive(Clone)]
pub struct MaintenanceService {
    db: PgPool,
}

impl MaintenanceService {
    /// Create a new MaintenanceService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn database_status(&self) -> DatabaseStatus {
        let connected = sqlx::query("SELECT 1").execute(&self.db).await.is_ok();
        DatabaseStatus { connected }
    }

    /// Dump every business table inside one repeatable-read snapshot
    pub async fn backup(&self) -> AppResult<String> {
        let mut tx = self.db.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let mut dump = String::from("-- pharmacy ledger backup\n");
        dump.push_str(&format!(
            "TRUNCATE TABLE {} RESTART IDENTITY CASCADE;\n",
            BACKUP_TABLES.join(", ")
        ));

        let mut rows_total = 0usize;
        for table in BACKUP_TABLES {
            let rows = sqlx::query_scalar::<_, String>(&format!(
                "SELECT row_to_json(t)::text FROM {table} t ORDER BY t.id"
            ))
            .fetch_all(&mut *tx)
            .await?;

            rows_total += rows.len();
            for row in &rows {
                dump.push_str(&insert_statement(table, row));
                dump.push('\n');
            }
        }

        for table in BACKUP_TABLES {
            dump.push_str(&setval_statement(table));
            dump.push('\n');
        }

        tx.commit().await?;
        tracing::info!(rows = rows_total, bytes = dump.len(), "Backup generated");
        Ok(dump)
    }

    /// Execute a backup script. Any rejected or failing statement rolls back all of it.
    pub async fn restore(&self, script: &str) -> AppResult<RestoreSummary> {
        let statements = split_statements(script);
        if statements.is_empty() {
            return Err(AppError::BadRequest("Restore script is empty".to_string()));
        }
        for (index, statement) in statements.iter().enumerate() {
            if !is_allowed(statement) {
                tracing::warn!(index, "Restore rejected a disallowed statement");
                return Err(AppError::BadRequest(format!(
                    "Statement {} is not allowed in a restore script",
                    index + 1
                )));
            }
        }

        let mut tx = self.db.begin().await?;
        for statement in &statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        tracing::info!(statements = statements.len(), "Database restored");
        Ok(RestoreSummary {
            statements: statements.len(),
        })
    }
}

fn insert_statement(table: &str, row_json: &str) -> String {
    format!(
        "INSERT INTO {table} SELECT * FROM json_populate_record(NULL::{table}, '{}');",
        row_json.replace('\'', "''")
    )
}

fn setval_statement(table: &str) -> String {
    format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
         COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false);"
    )
}

/// Split a script on `;` outside single-quoted strings and double-quoted
/// identifiers. `--` comments are dropped; blank statements are skipped.
pub fn split_statements(script: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = script.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(c) = chars.next() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    // a doubled quote stays inside the literal
                    if chars.peek() == Some(&q) {
                        current.push(q);
                        chars.next();
                    } else {
                        quote = None;
                    }
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    current.push(c);
                }
                '-' if chars.peek() == Some(&'-') => {
                    for skipped in chars.by_ref() {
                        if skipped == '\n' {
                            current.push('\n');
                            break;
                        }
                    }
                }
                ';' => {
                    push_statement(&mut statements, &current);
                    current.clear();
                }
                _ => current.push(c),
            },
        }
    }
    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

/// Accept only what `backup` emits, and only for tables in `BACKUP_TABLES`
fn is_allowed(statement: &str) -> bool {
    is_truncate(statement) || is_row_insert(statement) || is_setval(statement)
}

fn normalize(statement: &str) -> String {
    statement
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn is_backup_table(name: &str) -> bool {
    BACKUP_TABLES.contains(&name)
}

fn is_truncate(statement: &str) -> bool {
    let normalized = normalize(statement);
    let Some(rest) = normalized.strip_prefix("truncate table ") else {
        return false;
    };
    let rest = rest.strip_suffix(" cascade").unwrap_or(rest);
    let tables = rest.strip_suffix(" restart identity").unwrap_or(rest);
    tables.split(',').all(|table| is_backup_table(table.trim()))
}

fn is_row_insert(statement: &str) -> bool {
    let Some(rest) = statement.strip_prefix("INSERT INTO ") else {
        return false;
    };
    let Some((table, _)) = rest.split_once(' ') else {
        return false;
    };
    if !is_backup_table(table) {
        return false;
    }
    let head = format!("INSERT INTO {table} SELECT * FROM json_populate_record(NULL::{table}, '");
    let Some(literal) = statement
        .strip_prefix(head.as_str())
        .and_then(|rest| rest.strip_suffix("')"))
    else {
        return false;
    };
    // every quote inside the literal must be escaped
    !literal.replace("''", "").contains('\'')
}

fn is_setval(statement: &str) -> bool {
    let normalized = normalize(statement.trim_end_matches(';'));
    BACKUP_TABLES.iter().any(|table| {
        normalize(setval_statement(table).trim_end_matches(';')) == normalized
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_outside_quotes_only() {
        let script = "-- header; with semicolon\n\
                      TRUNCATE TABLE medicines;\n\
                      INSERT INTO customers SELECT * FROM json_populate_record(NULL::customers, '{\"name\":\"王;五\"}');\n\
                      ;  ;\n\
                      SELECT setval('x', 1)";
        let statements = split_statements(script);
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0], "TRUNCATE TABLE medicines");
        assert!(statements[1].contains("王;五"));
        assert_eq!(statements[2], "SELECT setval('x', 1)");
    }

    #[test]
    fn doubled_quotes_stay_in_literal() {
        let statements = split_statements("INSERT INTO t VALUES ('it''s; fine');SELECT 1");
        assert_eq!(statements[0], "INSERT INTO t VALUES ('it''s; fine')");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn generated_insert_survives_splitting() {
        let row = r#"{"id":1,"name":"O'Brien; Ltd","contact":"--","phone":""}"#;
        let statement = insert_statement("suppliers", row);
        let split = split_statements(&statement);
        assert_eq!(split.len(), 1);
        assert_eq!(format!("{};", split[0]), statement);
        assert!(is_allowed(&split[0]));
    }

    #[test]
    fn allow_list_rejects_other_statements() {
        assert!(is_allowed("truncate   table medicines restart identity cascade"));
        assert!(is_allowed(&setval_statement("sales")));
        assert!(!is_allowed("DROP TABLE medicines"));
        assert!(!is_allowed("UPDATE users SET role = 'admin'"));
        assert!(!is_allowed("SELECT * FROM users"));
        assert!(!is_allowed("DELETE FROM sales"));
    }

    #[test]
    fn allow_list_rejects_tables_outside_backup() {
        assert!(!is_allowed("TRUNCATE TABLE users CASCADE"));
        assert!(!is_allowed("TRUNCATE TABLE medicines, users"));
        assert!(!is_allowed(&insert_statement("users", r#"{"id":1,"role":"admin"}"#)));
        assert!(!is_allowed(
            "SELECT setval(pg_get_serial_sequence('users', 'id'), 1, false)"
        ));
    }

    #[test]
    fn allow_list_rejects_extra_clauses() {
        let setval = setval_statement("sales");
        let padded = format!("{}, pg_sleep(60)", setval.trim_end_matches(';'));
        assert!(!is_allowed(&padded));

        let escaped = "INSERT INTO sales SELECT * FROM json_populate_record(NULL::sales, \
                       '{}'), pg_sleep(60), ('x')";
        assert!(!is_allowed(escaped));
        assert!(!is_allowed(
            "INSERT INTO sales SELECT * FROM json_populate_record(NULL::sales, '{}') RETURNING *"
        ));
    }

    #[test]
    fn backup_truncate_is_accepted() {
        let truncate = format!(
            "TRUNCATE TABLE {} RESTART IDENTITY CASCADE",
            BACKUP_TABLES.join(", ")
        );
        assert!(is_allowed(&truncate));
        for table in BACKUP_TABLES {
            let setval = setval_statement(table);
            assert!(is_allowed(setval.trim_end_matches(';')));
        }
    }

    #[test]
    fn blank_script_has_no_statements() {
        assert!(split_statements("  -- only a comment\n ; \n").is_empty());
    }
}
