// ABOUTME: Backend-neutral session contract for invoking stored procedures
// ABOUTME: Defines procedure descriptors, parameter/row values and database errors

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Procedure {procedure} failed: {message}")]
    RemoteCall { procedure: String, message: String },
}

impl DbError {
    pub fn remote(procedure: &str, message: impl ToString) -> Self {
        DbError::RemoteCall {
            procedure: procedure.to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, DbError::Connection(_))
    }
}

/// A stored procedure the data-access layer is allowed to call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Procedure {
    pub name: &'static str,
    /// Number of positional input arguments
    pub inputs: usize,
    /// SQL types of the trailing OUTPUT parameters, in order
    pub outputs: &'static [&'static str],
    /// Whether the call must be committed
    pub mutates: bool,
}

/// Parameter or column value exchanged with a procedure
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Bool(bool),
    Decimal(Decimal),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Bool(_) => "bit",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Timestamp(_) => "timestamp",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum RowError {
    #[error("column {0} is missing")]
    Missing(usize),
    #[error("column {index} expected {expected}, got {found}")]
    Mismatch {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

/// One result row, addressed positionally
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn get(&self, index: usize) -> Result<&Value, RowError> {
        self.values.get(index).ok_or(RowError::Missing(index))
    }

    pub fn int(&self, index: usize) -> Result<i64, RowError> {
        match self.get(index)? {
            Value::Int(v) => Ok(*v),
            other => Err(mismatch(index, "integer", other)),
        }
    }

    pub fn text(&self, index: usize) -> Result<String, RowError> {
        match self.get(index)? {
            Value::Text(v) => Ok(v.clone()),
            other => Err(mismatch(index, "text", other)),
        }
    }

    /// Integers are accepted since some servers report whole salaries that way
    pub fn decimal(&self, index: usize) -> Result<Decimal, RowError> {
        match self.get(index)? {
            Value::Decimal(v) => Ok(*v),
            Value::Int(v) => Ok(Decimal::from(*v)),
            other => Err(mismatch(index, "decimal", other)),
        }
    }

    /// Bit columns, or tinyint flags where zero means false
    pub fn flag(&self, index: usize) -> Result<bool, RowError> {
        match self.get(index)? {
            Value::Bool(v) => Ok(*v),
            Value::Int(v) => Ok(*v != 0),
            other => Err(mismatch(index, "bit", other)),
        }
    }

    pub fn timestamp(&self, index: usize) -> Result<NaiveDateTime, RowError> {
        match self.get(index)? {
            Value::Timestamp(v) => Ok(*v),
            other => Err(mismatch(index, "timestamp", other)),
        }
    }

    pub fn opt_timestamp(&self, index: usize) -> Result<Option<NaiveDateTime>, RowError> {
        match self.get(index)? {
            Value::Null => Ok(None),
            Value::Timestamp(v) => Ok(Some(*v)),
            other => Err(mismatch(index, "timestamp", other)),
        }
    }
}

fn mismatch(index: usize, expected: &'static str, found: &Value) -> RowError {
    RowError::Mismatch {
        index,
        expected,
        found: found.kind(),
    }
}

/// Everything a procedure call produced
#[derive(Debug, Clone, Default)]
pub struct CallOutput {
    /// Rows of every result set, in order
    pub rows: Vec<Row>,
    /// Values of the OUTPUT parameters, in declaration order
    pub out_params: Vec<Value>,
}

/// An open, authenticated database session. Dropping it closes the connection
/// and discards any uncommitted work.
#[async_trait]
pub trait Session: Send {
    async fn call(&mut self, procedure: &Procedure, args: &[Value]) -> Result<CallOutput, DbError>;

    async fn commit(&mut self) -> Result<(), DbError>;
}

/// Opens a fresh session per operation
#[async_trait]
pub trait SessionProvider: Send + Sync {
    type Session: Session;

    async fn open(&self) -> Result<Self::Session, DbError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_coerce_integer_columns() {
        let row = Row::new(vec![Value::Int(1), Value::Int(750000), Value::Int(0)]);
        assert_eq!(row.int(0), Ok(1));
        assert_eq!(row.decimal(1), Ok(Decimal::from(750000)));
        assert_eq!(row.flag(2), Ok(false));
    }

    #[test]
    fn accessors_report_mismatch_and_missing() {
        let row = Row::new(vec![Value::Text("Ana".to_string()), Value::Null]);
        assert_eq!(
            row.int(0),
            Err(RowError::Mismatch {
                index: 0,
                expected: "integer",
                found: "text"
            })
        );
        assert_eq!(row.opt_timestamp(1), Ok(None));
        assert!(row.timestamp(1).is_err());
        assert_eq!(row.text(5), Err(RowError::Missing(5)));
    }

    #[test]
    fn remote_error_mentions_procedure() {
        let err = DbError::remote("find_employee_by_id", "timeout");
        assert!(!err.is_connection());
        assert_eq!(err.to_string(), "Procedure find_employee_by_id failed: timeout");
    }
}
