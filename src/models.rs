// ABOUTME: Shared data models for the employee records console
// ABOUTME: Employee rows as returned by the stored procedures plus input drafts

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Server-generated employee identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub i64);

impl fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Full employee record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub role: String,
    pub salary: Decimal,
    /// Soft-delete flag
    pub deleted: bool,
    #[serde(rename = "createdAt")]
    pub created_at: NaiveDateTime,
    #[serde(rename = "updatedAt", default)]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(rename = "deletedAt", default)]
    pub deleted_at: Option<NaiveDateTime>,
}

/// Reduced projection returned by the deleted-employees listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedEmployee {
    pub id: EmployeeId,
    pub name: String,
    pub role: String,
    #[serde(rename = "deletedAt", default)]
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DraftError {
    #[error("Name and role are required fields")]
    MissingField,
}

/// The mutable fields of an employee, used for both create and update
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeDraft {
    pub name: String,
    pub role: String,
    pub salary: Decimal,
}

impl EmployeeDraft {
    /// Build a draft, trimming text and rejecting empty name or role
    pub fn new(name: &str, role: &str, salary: Decimal) -> Result<Self, DraftError> {
        let name = name.trim();
        let role = role.trim();
        if name.is_empty() || role.is_empty() {
            return Err(DraftError::MissingField);
        }
        Ok(Self {
            name: name.to_string(),
            role: role.to_string(),
            salary,
        })
    }
}
