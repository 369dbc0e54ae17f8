// ABOUTME: Installs the employee table and stored procedures on SQL Server
// ABOUTME: Renders the bundled T-SQL script for a schema and runs it batch by batch

use super::employees::PROCEDURES;
use super::session::{DbError, Session};
use super::sqlserver::{quote_ident, SqlServerSession};

const PROCEDURES_SQL: &str = include_str!("../../sql/procedures.sql");

/// Schema names are spliced into DDL, so only plain identifiers are accepted
pub fn is_valid_schema(schema: &str) -> bool {
    !schema.is_empty()
        && schema.len() <= 128
        && schema
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !schema.starts_with(|c: char| c.is_ascii_digit())
}

/// Split the script on `GO` separator lines, dropping empty batches
pub fn split_batches(script: &str) -> Vec<String> {
    let mut batches = Vec::new();
    let mut current = String::new();

    for line in script.lines() {
        if line.trim().eq_ignore_ascii_case("GO") {
            push_batch(&mut batches, &mut current);
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    push_batch(&mut batches, &mut current);
    batches
}

fn push_batch(batches: &mut Vec<String>, current: &mut String) {
    let has_code = current
        .lines()
        .any(|line| !line.trim().is_empty() && !line.trim_start().starts_with("--"));
    if has_code {
        batches.push(current.trim().to_string());
    }
    current.clear();
}

/// The install batches for `schema`, in execution order
pub fn render_batches(schema: &str) -> Vec<String> {
    split_batches(&PROCEDURES_SQL.replace("{schema}", &quote_ident(schema)))
}

/// Create the table (if missing) and every procedure, then commit
pub async fn install(session: &mut SqlServerSession, schema: &str) -> Result<usize, DbError> {
    let batches = render_batches(schema);
    for batch in &batches {
        session.execute_batch(batch).await?;
    }
    session.commit().await?;
    log::info!(
        "Installed {} procedures in schema {}",
        PROCEDURES.len(),
        schema
    );
    Ok(batches.len())
}
