// ABOUTME: Fixed text layouts for employee rows
// ABOUTME: Listing lines, the detail view, salary and timestamp formatting

use chrono::NaiveDateTime;
use rust_decimal::Decimal;

use crate::models::{DeletedEmployee, Employee};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Whole currency units with thousands separators, e.g. `$1,200,000`
pub fn salary(amount: Decimal) -> String {
    let rounded = amount.round_dp(0);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let digits = rounded.abs().trunc().to_string();
    let digits = digits.split('.').next().unwrap_or("0");
    format!("${}{}", sign, group_thousands(digits))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

pub fn timestamp(value: Option<NaiveDateTime>, missing: &str) -> String {
    value
        .map(|ts| ts.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| missing.to_string())
}

pub fn status(deleted: bool) -> &'static str {
    if deleted {
        "DELETED"
    } else {
        "ACTIVE"
    }
}

pub fn active_line(employee: &Employee) -> String {
    format!(
        "ID:{:<3} | Name:{:<15} | Role:{:<13} | Salary:{} | Created:{} | Updated:{}",
        employee.id,
        employee.name,
        employee.role,
        salary(employee.salary),
        timestamp(Some(employee.created_at), "-"),
        timestamp(employee.updated_at, "-"),
    )
}

pub fn full_line(employee: &Employee) -> String {
    format!(
        "ID:{:<3} | Name:{:<15} | Role:{:<13} | Salary:{} | {:<9} | Created:{} | Updated:{} | Deleted:{}",
        employee.id,
        employee.name,
        employee.role,
        salary(employee.salary),
        status(employee.deleted),
        timestamp(Some(employee.created_at), "-"),
        timestamp(employee.updated_at, "-"),
        timestamp(employee.deleted_at, "-"),
    )
}

pub fn deleted_line(employee: &DeletedEmployee) -> String {
    format!(
        "ID:{:<3} | Name:{:<15} | Role:{:<13} | Deleted at:{}",
        employee.id,
        employee.name,
        employee.role,
        timestamp(employee.deleted_at, "Date not recorded"),
    )
}

pub fn detail(employee: &Employee) -> Vec<String> {
    vec![
        format!("ID: {}", employee.id),
        format!("Name: {}", employee.name),
        format!("Role: {}", employee.role),
        format!("Salary: {}", salary(employee.salary)),
        format!("Status: {}", status(employee.deleted)),
        format!("Created: {}", timestamp(Some(employee.created_at), "-")),
        format!("Updated: {}", timestamp(employee.updated_at, "-")),
        format!("Deleted: {}", timestamp(employee.deleted_at, "-")),
    ]
}
