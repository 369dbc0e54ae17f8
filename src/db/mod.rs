// ABOUTME: Database module exports for the employee records console
// ABOUTME: Contains the session contract, the SQL Server backend and the employee store

pub mod employees;
pub mod install;
pub mod session;
pub mod sqlserver;

#[cfg(test)]
pub(crate) mod emulated;

pub use employees::EmployeeStore;
pub use session::{DbError, SessionProvider};
pub use sqlserver::{SqlServerProvider, SqlServerSession};
