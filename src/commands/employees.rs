// ABOUTME: Employee commands invoked from the console menu
// ABOUTME: Each command is a terminal action that logs failures and returns an Outcome

use crate::db::{DbError, EmployeeStore, SessionProvider};
use crate::models::{DeletedEmployee, Employee, EmployeeDraft, EmployeeId};
use crate::Outcome;

fn finish<T>(operation: &str, result: Result<T, DbError>) -> Outcome<T> {
    match result {
        Ok(value) => Outcome::Success(value),
        Err(e) => {
            log::warn!("{} failed: {}", operation, e);
            Outcome::Failed(e)
        }
    }
}

/// Register a new employee
pub async fn create_employee<P: SessionProvider>(
    store: &EmployeeStore<P>,
    draft: &EmployeeDraft,
) -> Outcome<EmployeeId> {
    let outcome = finish("create_employee", store.create(draft).await);
    if let Outcome::Success(id) = &outcome {
        log::info!("Created employee {}", id);
    }
    outcome
}

pub async fn list_active_employees<P: SessionProvider>(
    store: &EmployeeStore<P>,
) -> Outcome<Vec<Employee>> {
    finish("list_active_employees", store.list_active().await)
}

pub async fn list_all_employees<P: SessionProvider>(
    store: &EmployeeStore<P>,
) -> Outcome<Vec<Employee>> {
    finish("list_all_employees", store.list_all().await)
}

pub async fn soft_delete_employee<P: SessionProvider>(
    store: &EmployeeStore<P>,
    id: EmployeeId,
) -> Outcome<()> {
    finish("soft_delete_employee", store.soft_delete(id).await)
}

pub async fn restore_employee<P: SessionProvider>(
    store: &EmployeeStore<P>,
    id: EmployeeId,
) -> Outcome<()> {
    finish("restore_employee", store.restore(id).await)
}

pub async fn update_employee<P: SessionProvider>(
    store: &EmployeeStore<P>,
    id: EmployeeId,
    draft: &EmployeeDraft,
) -> Outcome<()> {
    finish("update_employee", store.update(id, draft).await)
}

/// Find one employee; an unknown id yields `Outcome::NotFound`
pub async fn find_employee<P: SessionProvider>(
    store: &EmployeeStore<P>,
    id: EmployeeId,
) -> Outcome<Employee> {
    match finish("find_employee_by_id", store.find(id).await) {
        Outcome::Success(Some(employee)) => Outcome::Success(employee),
        Outcome::Success(None) => Outcome::NotFound,
        Outcome::NotFound => Outcome::NotFound,
        Outcome::Failed(e) => Outcome::Failed(e),
    }
}

pub async fn list_deleted_employees<P: SessionProvider>(
    store: &EmployeeStore<P>,
) -> Outcome<Vec<DeletedEmployee>> {
    finish("list_deleted_employees", store.list_deleted().await)
}

/// Permanently delete an employee. The console asks for confirmation before calling this.
pub async fn physical_delete_employee<P: SessionProvider>(
    store: &EmployeeStore<P>,
    id: EmployeeId,
) -> Outcome<()> {
    let outcome = finish("physical_delete_employee", store.physical_delete(id).await);
    if outcome.is_success() {
        log::info!("Permanently deleted employee {}", id);
    }
    outcome
}
