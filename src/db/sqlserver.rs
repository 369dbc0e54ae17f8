// ABOUTME: SQL Server session management using tiberius
// ABOUTME: Opens per-call connections and executes the employee stored procedures

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tiberius::numeric::Numeric;
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use super::session::{CallOutput, DbError, Procedure, Row, Session, SessionProvider, Value};
use crate::config::ConnectionProfile;

pub struct SqlServerSession {
    client: Client<Compat<TcpStream>>,
    schema: String,
}

impl SqlServerSession {
    /// Connect to SQL Server using a connection profile
    pub async fn connect(profile: &ConnectionProfile, schema: &str) -> Result<Self, DbError> {
        let mut config = Config::new();
        config.host(&profile.host);
        config.port(profile.port);
        config.database(&profile.database);
        config.authentication(AuthMethod::sql_server(&profile.username, &profile.password));

        if profile.trust_certificate {
            config.trust_cert();
        }

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        tcp.set_nodelay(true)
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let mut client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        // Mutations stay pending until commit(); a dropped session rolls them back.
        client
            .simple_query("SET IMPLICIT_TRANSACTIONS ON")
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?
            .into_results()
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        log::debug!(
            "Connected to {}:{} database {}",
            profile.host,
            profile.port,
            profile.database
        );

        Ok(Self {
            client,
            schema: schema.to_string(),
        })
    }

    /// Query the server version string
    pub async fn server_version(&mut self) -> Result<String, DbError> {
        let row = self
            .client
            .simple_query("SELECT @@VERSION")
            .await
            .map_err(|e| DbError::remote("@@VERSION", e))?
            .into_row()
            .await
            .map_err(|e| DbError::remote("@@VERSION", e))?
            .ok_or_else(|| DbError::remote("@@VERSION", "no version returned"))?;

        let version: &str = row.get(0).unwrap_or("Unknown");
        Ok(version.to_string())
    }

    /// Run a parameterless T-SQL batch, discarding any results
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), DbError> {
        self.client
            .simple_query(sql)
            .await
            .map_err(|e| DbError::remote("batch", e))?
            .into_results()
            .await
            .map_err(|e| DbError::remote("batch", e))?;
        Ok(())
    }
}

#[async_trait]
impl Session for SqlServerSession {
    async fn call(&mut self, procedure: &Procedure, args: &[Value]) -> Result<CallOutput, DbError> {
        if args.len() != procedure.inputs {
            return Err(DbError::remote(
                procedure.name,
                format!("expected {} arguments, got {}", procedure.inputs, args.len()),
            ));
        }

        let statement = exec_statement(&self.schema, procedure);
        let mut query = Query::new(statement);
        for arg in args {
            bind_value(&mut query, arg);
        }

        let results = query
            .query(&mut self.client)
            .await
            .map_err(|e| DbError::remote(procedure.name, e))?
            .into_results()
            .await
            .map_err(|e| DbError::remote(procedure.name, e))?;

        let mut sets = Vec::with_capacity(results.len());
        for set in results {
            let rows = set
                .into_iter()
                .map(convert_row)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| DbError::remote(procedure.name, e))?;
            sets.push(rows);
        }
        split_output(procedure, sets)
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.client
            .simple_query("IF @@TRANCOUNT > 0 COMMIT TRANSACTION")
            .await
            .map_err(|e| DbError::remote("COMMIT", e))?
            .into_results()
            .await
            .map_err(|e| DbError::remote("COMMIT", e))?;
        Ok(())
    }
}

/// Opens one SQL Server session per data-access call
#[derive(Debug, Clone)]
pub struct SqlServerProvider {
    profile: ConnectionProfile,
    schema: String,
}

impl SqlServerProvider {
    pub fn new(profile: ConnectionProfile, schema: impl Into<String>) -> Self {
        Self {
            profile,
            schema: schema.into(),
        }
    }
}

#[async_trait]
impl SessionProvider for SqlServerProvider {
    type Session = SqlServerSession;

    async fn open(&self) -> Result<SqlServerSession, DbError> {
        SqlServerSession::connect(&self.profile, &self.schema).await
    }
}

/// Bracket-quote an identifier
pub fn quote_ident(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Build the EXEC batch for a procedure, declaring and selecting its OUTPUT variables
fn exec_statement(schema: &str, procedure: &Procedure) -> String {
    let mut arguments: Vec<String> = (1..=procedure.inputs).map(|i| format!("@P{}", i)).collect();
    let outputs: Vec<String> = (1..=procedure.outputs.len())
        .map(|i| format!("@out{}", i))
        .collect();
    arguments.extend(outputs.iter().map(|name| format!("{} OUTPUT", name)));

    let target = format!("{}.{}", quote_ident(schema), quote_ident(procedure.name));
    let exec = if arguments.is_empty() {
        format!("EXEC {};", target)
    } else {
        format!("EXEC {} {};", target, arguments.join(", "))
    };

    if outputs.is_empty() {
        return exec;
    }

    let declarations: Vec<String> = outputs
        .iter()
        .zip(procedure.outputs)
        .map(|(name, sql_type)| format!("DECLARE {} {};", name, sql_type))
        .collect();
    format!(
        "{} {} SELECT {};",
        declarations.join(" "),
        exec,
        outputs.join(", ")
    )
}

/// Separate the procedure's rows from the trailing SELECT of its OUTPUT variables
fn split_output(procedure: &Procedure, mut sets: Vec<Vec<Row>>) -> Result<CallOutput, DbError> {
    let out_params = if procedure.outputs.is_empty() {
        Vec::new()
    } else {
        sets.pop()
            .and_then(|set| set.into_iter().next())
            .ok_or_else(|| DbError::remote(procedure.name, "missing output parameters"))?
            .into_values()
    };

    let rows = sets.into_iter().flatten().collect();
    Ok(CallOutput { rows, out_params })
}

/// tiberius only binds decimals through its own numeric type
fn numeric(value: Decimal) -> Numeric {
    Numeric::new_with_scale(value.mantissa(), value.scale() as u8)
}

fn bind_value(query: &mut Query<'_>, value: &Value) {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Int(v) => query.bind(*v),
        Value::Bool(v) => query.bind(*v),
        Value::Decimal(v) => query.bind(numeric(*v)),
        Value::Text(v) => query.bind(v.clone()),
        Value::Timestamp(v) => query.bind(*v),
    }
}

fn convert_row(row: tiberius::Row) -> Result<Row, String> {
    let mut values = Vec::with_capacity(row.len());
    for data in row {
        values.push(convert_column(&data)?);
    }
    Ok(Row::new(values))
}

fn convert_column(data: &ColumnData<'static>) -> Result<Value, String> {
    let value = match data {
        ColumnData::U8(v) => v.map(|v| Value::Int(i64::from(v))),
        ColumnData::I16(v) => v.map(|v| Value::Int(i64::from(v))),
        ColumnData::I32(v) => v.map(|v| Value::Int(i64::from(v))),
        ColumnData::I64(v) => v.map(Value::Int),
        ColumnData::F32(v) => v.map(|v| float_value(f64::from(v))).transpose()?,
        ColumnData::F64(v) => v.map(float_value).transpose()?,
        ColumnData::Bit(v) => v.map(Value::Bool),
        ColumnData::String(v) => v.as_ref().map(|s| Value::Text(s.to_string())),
        ColumnData::Numeric(_) => Decimal::from_sql(data)
            .map_err(|e| e.to_string())?
            .map(Value::Decimal),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)
                .map_err(|e| e.to_string())?
                .map(Value::Timestamp)
        }
        ColumnData::Date(_) => NaiveDate::from_sql(data)
            .map_err(|e| e.to_string())?
            .map(|date| Value::Timestamp(date.and_time(NaiveTime::MIN))),
        other => return Err(format!("unsupported column type {:?}", other)),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn float_value(v: f64) -> Result<Value, String> {
    Decimal::try_from(v)
        .map(Value::Decimal)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_ARGS: Procedure = Procedure {
        name: "list_active_employees",
        inputs: 0,
        outputs: &[],
        mutates: false,
    };

    const WITH_OUTPUT: Procedure = Procedure {
        name: "create_employee",
        inputs: 3,
        outputs: &["INT"],
        mutates: true,
    };

    #[test]
    fn exec_without_arguments() {
        assert_eq!(
            exec_statement("dbo", &NO_ARGS),
            "EXEC [dbo].[list_active_employees];"
        );
    }

    #[test]
    fn exec_declares_and_selects_outputs() {
        assert_eq!(
            exec_statement("hr", &WITH_OUTPUT),
            "DECLARE @out1 INT; EXEC [hr].[create_employee] @P1, @P2, @P3, @out1 OUTPUT; SELECT @out1;"
        );
    }

    #[test]
    fn salary_binds_as_numeric() {
        let salary = numeric(Decimal::new(120_000_050, 2));
        assert_eq!(salary.value(), 120_000_050);
        assert_eq!(salary.scale(), 2);
        assert_eq!(numeric(Decimal::from(1_200_000)).scale(), 0);

        let mut query = Query::new(exec_statement("dbo", &WITH_OUTPUT));
        bind_value(&mut query, &Value::from("Ana Ruiz"));
        bind_value(&mut query, &Value::from("Analyst"));
        bind_value(&mut query, &Value::Decimal(Decimal::new(15, 1)));
    }

    #[test]
    fn output_only_call_has_no_rows() {
        let sets = vec![vec![Row::new(vec![Value::Int(42)])]];
        let output = split_output(&WITH_OUTPUT, sets).unwrap();
        assert!(output.rows.is_empty());
        assert_eq!(output.out_params, vec![Value::Int(42)]);
    }

    #[test]
    fn every_result_set_contributes_rows() {
        let sets = vec![
            vec![Row::new(vec![Value::Int(1)]), Row::new(vec![Value::Int(2)])],
            Vec::new(),
            vec![Row::new(vec![Value::Int(3)])],
        ];
        let output = split_output(&NO_ARGS, sets).unwrap();
        let ids: Vec<i64> = output.rows.iter().map(|row| row.int(0).unwrap()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(output.out_params.is_empty());
    }

    #[test]
    fn missing_output_row_is_a_remote_call_error() {
        for sets in [Vec::new(), vec![Vec::new()]] {
            match split_output(&WITH_OUTPUT, sets) {
                Err(DbError::RemoteCall { procedure, message }) => {
                    assert_eq!(procedure, "create_employee");
                    assert_eq!(message, "missing output parameters");
                }
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn quote_ident_escapes_brackets() {
        assert_eq!(quote_ident("odd]name"), "[odd]]name]");
    }

    #[test]
    fn convert_column_maps_sql_types() {
        assert_eq!(convert_column(&ColumnData::I32(Some(7))), Ok(Value::Int(7)));
        assert_eq!(convert_column(&ColumnData::Bit(Some(true))), Ok(Value::Bool(true)));
        assert_eq!(convert_column(&ColumnData::I32(None)), Ok(Value::Null));
        assert_eq!(
            convert_column(&ColumnData::String(Some("Ana".into()))),
            Ok(Value::Text("Ana".to_string()))
        );
        assert_eq!(
            convert_column(&ColumnData::F64(Some(1.5))),
            Ok(Value::Decimal(Decimal::new(15, 1)))
        );
    }
}
