// ABOUTME: In-process emulation of the employee stored procedures on SQLite
// ABOUTME: Lets the data-access layer and console be tested without a SQL Server

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::TempDir;

use super::session::{CallOutput, DbError, Procedure, Row, Session, SessionProvider, Value};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const SCHEMA: &str = r#"
    CREATE TABLE employees (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        role TEXT NOT NULL,
        salary TEXT NOT NULL,
        deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT,
        deleted_at TEXT
    );
"#;

const FULL_COLUMNS: &str =
    "id, name, role, salary, deleted, created_at, updated_at, deleted_at";

pub(crate) struct EmulatedProvider {
    _dir: TempDir,
    path: PathBuf,
    offline: AtomicBool,
}

impl EmulatedProvider {
    pub(crate) fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("employees.db");
        let conn = Connection::open(&path).expect("open emulated database");
        conn.execute_batch(SCHEMA).expect("create emulated schema");
        Self {
            _dir: dir,
            path,
            offline: AtomicBool::new(false),
        }
    }

    /// Make every following `open` fail like an unreachable server
    pub(crate) fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    /// Break the procedures by removing the table they work on
    pub(crate) fn drop_table(&self) {
        let conn = Connection::open(&self.path).expect("open emulated database");
        conn.execute_batch("DROP TABLE employees")
            .expect("drop employees table");
    }
}

#[async_trait]
impl SessionProvider for EmulatedProvider {
    type Session = EmulatedSession;

    async fn open(&self) -> Result<EmulatedSession, DbError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(DbError::Connection("connection refused".to_string()));
        }
        let conn = Connection::open(&self.path).map_err(|e| DbError::Connection(e.to_string()))?;
        conn.execute_batch("BEGIN")
            .map_err(|e| DbError::Connection(e.to_string()))?;
        Ok(EmulatedSession { conn })
    }
}

pub(crate) struct EmulatedSession {
    conn: Connection,
}

#[async_trait]
impl Session for EmulatedSession {
    async fn call(&mut self, procedure: &Procedure, args: &[Value]) -> Result<CallOutput, DbError> {
        if args.len() != procedure.inputs {
            return Err(DbError::remote(
                procedure.name,
                format!("expected {} arguments, got {}", procedure.inputs, args.len()),
            ));
        }
        let params: Vec<SqlValue> = args.iter().map(sql_value).collect();
        let now = SqlValue::Text(Local::now().naive_local().format(TIMESTAMP_FORMAT).to_string());
        let name = procedure.name;

        let mut output = CallOutput::default();
        match name {
            "create_employee" => {
                let mut insert = params;
                insert.push(now);
                self.execute(
                    name,
                    "INSERT INTO employees (name, role, salary, created_at) VALUES (?1, ?2, ?3, ?4)",
                    &insert,
                )?;
                output.out_params.push(Value::Int(self.conn.last_insert_rowid()));
            }
            "list_active_employees" => {
                output.rows = self.select(
                    name,
                    "SELECT id, name, role, salary, created_at, updated_at FROM employees WHERE deleted = 0 ORDER BY id",
                    &params,
                )?;
            }
            "list_all_employees" => {
                output.rows = self.select(
                    name,
                    &format!("SELECT {} FROM employees ORDER BY id", FULL_COLUMNS),
                    &params,
                )?;
            }
            "soft_delete_employee" => {
                let mut update = params;
                update.push(now);
                self.execute(
                    name,
                    "UPDATE employees SET deleted = 1, deleted_at = ?2, updated_at = ?2 WHERE id = ?1",
                    &update,
                )?;
            }
            "restore_employee" => {
                let mut update = params;
                update.push(now);
                self.execute(
                    name,
                    "UPDATE employees SET deleted = 0, deleted_at = NULL, updated_at = ?2 WHERE id = ?1",
                    &update,
                )?;
            }
            "update_employee" => {
                let mut update = params;
                update.push(now);
                self.execute(
                    name,
                    "UPDATE employees SET name = ?2, role = ?3, salary = ?4, updated_at = ?5 WHERE id = ?1",
                    &update,
                )?;
            }
            "find_employee_by_id" => {
                output.rows = self.select(
                    name,
                    &format!("SELECT {} FROM employees WHERE id = ?1", FULL_COLUMNS),
                    &params,
                )?;
            }
            "list_deleted_employees" => {
                output.rows = self.select(
                    name,
                    "SELECT id, name, role, deleted_at FROM employees WHERE deleted = 1 ORDER BY deleted_at DESC, id",
                    &params,
                )?;
            }
            "physical_delete_employee" => {
                self.execute(name, "DELETE FROM employees WHERE id = ?1", &params)?;
            }
            _ => return Err(DbError::remote(name, "procedure does not exist")),
        }
        Ok(output)
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| DbError::remote("COMMIT", e))
    }
}

impl EmulatedSession {
    fn execute(&self, procedure: &str, sql: &str, params: &[SqlValue]) -> Result<(), DbError> {
        self.conn
            .execute(sql, params_from_iter(params.iter()))
            .map_err(|e| DbError::remote(procedure, e))?;
        Ok(())
    }

    fn select(&self, procedure: &str, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, DbError> {
        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| DbError::remote(procedure, e))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt
            .query(params_from_iter(params.iter()))
            .map_err(|e| DbError::remote(procedure, e))?;

        let mut result = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DbError::remote(procedure, e))? {
            let mut values = Vec::with_capacity(columns.len());
            for (index, column) in columns.iter().enumerate() {
                let raw = row
                    .get_ref(index)
                    .map_err(|e| DbError::remote(procedure, e))?;
                values.push(column_value(column, raw).map_err(|e| DbError::remote(procedure, e))?);
            }
            result.push(Row::new(values));
        }
        Ok(result)
    }
}

fn sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Int(v) => SqlValue::Integer(*v),
        Value::Bool(v) => SqlValue::Integer(i64::from(*v)),
        Value::Decimal(v) => SqlValue::Text(v.to_string()),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Timestamp(v) => SqlValue::Text(v.format(TIMESTAMP_FORMAT).to_string()),
    }
}

/// Recover the SQL Server column types the real procedures would report
fn column_value(column: &str, raw: ValueRef<'_>) -> Result<Value, String> {
    match raw {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(v) if column == "deleted" => Ok(Value::Bool(v != 0)),
        ValueRef::Integer(v) => Ok(Value::Int(v)),
        ValueRef::Real(v) => Decimal::try_from(v)
            .map(Value::Decimal)
            .map_err(|e| e.to_string()),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
            if column == "salary" {
                text.parse::<Decimal>()
                    .map(Value::Decimal)
                    .map_err(|e| e.to_string())
            } else if column.ends_with("_at") {
                NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
                    .map(Value::Timestamp)
                    .map_err(|e| e.to_string())
            } else {
                Ok(Value::Text(text.to_string()))
            }
        }
        ValueRef::Blob(_) => Err(format!("unexpected blob in column {}", column)),
    }
}
