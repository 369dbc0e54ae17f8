// ABOUTME: Employee data-access layer over the stored procedures
// ABOUTME: Each operation opens its own session, calls one procedure and decodes the rows

use super::session::{CallOutput, DbError, Procedure, Row, RowError, Session, SessionProvider, Value};
use crate::models::{DeletedEmployee, Employee, EmployeeDraft, EmployeeId};

pub const CREATE_EMPLOYEE: Procedure = Procedure {
    name: "create_employee",
    inputs: 3,
    outputs: &["INT"],
    mutates: true,
};

pub const LIST_ACTIVE_EMPLOYEES: Procedure = Procedure {
    name: "list_active_employees",
    inputs: 0,
    outputs: &[],
    mutates: false,
};

pub const LIST_ALL_EMPLOYEES: Procedure = Procedure {
    name: "list_all_employees",
    inputs: 0,
    outputs: &[],
    mutates: false,
};

pub const SOFT_DELETE_EMPLOYEE: Procedure = Procedure {
    name: "soft_delete_employee",
    inputs: 1,
    outputs: &[],
    mutates: true,
};

pub const RESTORE_EMPLOYEE: Procedure = Procedure {
    name: "restore_employee",
    inputs: 1,
    outputs: &[],
    mutates: true,
};

pub const UPDATE_EMPLOYEE: Procedure = Procedure {
    name: "update_employee",
    inputs: 4,
    outputs: &[],
    mutates: true,
};

pub const FIND_EMPLOYEE_BY_ID: Procedure = Procedure {
    name: "find_employee_by_id",
    inputs: 1,
    outputs: &[],
    mutates: false,
};

pub const LIST_DELETED_EMPLOYEES: Procedure = Procedure {
    name: "list_deleted_employees",
    inputs: 0,
    outputs: &[],
    mutates: false,
};

pub const PHYSICAL_DELETE_EMPLOYEE: Procedure = Procedure {
    name: "physical_delete_employee",
    inputs: 1,
    outputs: &[],
    mutates: true,
};

/// Every procedure the store calls
pub const PROCEDURES: [Procedure; 9] = [
    CREATE_EMPLOYEE,
    LIST_ACTIVE_EMPLOYEES,
    LIST_ALL_EMPLOYEES,
    SOFT_DELETE_EMPLOYEE,
    RESTORE_EMPLOYEE,
    UPDATE_EMPLOYEE,
    FIND_EMPLOYEE_BY_ID,
    LIST_DELETED_EMPLOYEES,
    PHYSICAL_DELETE_EMPLOYEE,
];

pub struct EmployeeStore<P> {
    provider: P,
}

impl<P: SessionProvider> EmployeeStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Insert a new employee, returning the identifier assigned by the server
    pub async fn create(&self, draft: &EmployeeDraft) -> Result<EmployeeId, DbError> {
        let output = self
            .invoke(
                &CREATE_EMPLOYEE,
                &[
                    Value::from(draft.name.as_str()),
                    Value::from(draft.role.as_str()),
                    Value::from(draft.salary),
                ],
            )
            .await?;

        match output.out_params.first() {
            Some(Value::Int(id)) => Ok(EmployeeId(*id)),
            Some(other) => Err(DbError::remote(
                CREATE_EMPLOYEE.name,
                format!("new id has type {}", other.kind()),
            )),
            None => Err(DbError::remote(CREATE_EMPLOYEE.name, "no new id returned")),
        }
    }

    /// Employees that are not soft-deleted
    pub async fn list_active(&self) -> Result<Vec<Employee>, DbError> {
        let output = self.invoke(&LIST_ACTIVE_EMPLOYEES, &[]).await?;
        decode_rows(&LIST_ACTIVE_EMPLOYEES, &output.rows, active_employee)
    }

    /// Every employee, soft-deleted ones included
    pub async fn list_all(&self) -> Result<Vec<Employee>, DbError> {
        let output = self.invoke(&LIST_ALL_EMPLOYEES, &[]).await?;
        decode_rows(&LIST_ALL_EMPLOYEES, &output.rows, full_employee)
    }

    pub async fn soft_delete(&self, id: EmployeeId) -> Result<(), DbError> {
        self.invoke(&SOFT_DELETE_EMPLOYEE, &[Value::from(id.0)]).await?;
        Ok(())
    }

    pub async fn restore(&self, id: EmployeeId) -> Result<(), DbError> {
        self.invoke(&RESTORE_EMPLOYEE, &[Value::from(id.0)]).await?;
        Ok(())
    }

    /// Overwrite name, role and salary
    pub async fn update(&self, id: EmployeeId, draft: &EmployeeDraft) -> Result<(), DbError> {
        self.invoke(
            &UPDATE_EMPLOYEE,
            &[
                Value::from(id.0),
                Value::from(draft.name.as_str()),
                Value::from(draft.role.as_str()),
                Value::from(draft.salary),
            ],
        )
        .await?;
        Ok(())
    }

    /// Look up one employee; `Ok(None)` when the id is unknown
    pub async fn find(&self, id: EmployeeId) -> Result<Option<Employee>, DbError> {
        let output = self.invoke(&FIND_EMPLOYEE_BY_ID, &[Value::from(id.0)]).await?;
        output
            .rows
            .last()
            .map(full_employee)
            .transpose()
            .map_err(|e| DbError::remote(FIND_EMPLOYEE_BY_ID.name, e))
    }

    pub async fn list_deleted(&self) -> Result<Vec<DeletedEmployee>, DbError> {
        let output = self.invoke(&LIST_DELETED_EMPLOYEES, &[]).await?;
        decode_rows(&LIST_DELETED_EMPLOYEES, &output.rows, deleted_employee)
    }

    /// Remove the row for good. Callers must have confirmed with the operator first.
    pub async fn physical_delete(&self, id: EmployeeId) -> Result<(), DbError> {
        self.invoke(&PHYSICAL_DELETE_EMPLOYEE, &[Value::from(id.0)])
            .await?;
        Ok(())
    }

    /// One session per call: open, invoke, commit when mutating. The session is
    /// dropped on every return path.
    async fn invoke(&self, procedure: &Procedure, args: &[Value]) -> Result<CallOutput, DbError> {
        let mut session = self.provider.open().await?;
        log::debug!("Calling {}", procedure.name);

        let output = session.call(procedure, args).await?;
        if procedure.mutates {
            session.commit().await?;
        }
        Ok(output)
    }
}

fn decode_rows<T>(
    procedure: &Procedure,
    rows: &[Row],
    decode: fn(&Row) -> Result<T, RowError>,
) -> Result<Vec<T>, DbError> {
    rows.iter()
        .map(decode)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DbError::remote(procedure.name, e))
}

/// (id, name, role, salary, created_at, updated_at)
fn active_employee(row: &Row) -> Result<Employee, RowError> {
    Ok(Employee {
        id: EmployeeId(row.int(0)?),
        name: row.text(1)?,
        role: row.text(2)?,
        salary: row.decimal(3)?,
        deleted: false,
        created_at: row.timestamp(4)?,
        updated_at: row.opt_timestamp(5)?,
        deleted_at: None,
    })
}

/// (id, name, role, salary, deleted, created_at, updated_at, deleted_at)
fn full_employee(row: &Row) -> Result<Employee, RowError> {
    Ok(Employee {
        id: EmployeeId(row.int(0)?),
        name: row.text(1)?,
        role: row.text(2)?,
        salary: row.decimal(3)?,
        deleted: row.flag(4)?,
        created_at: row.timestamp(5)?,
        updated_at: row.opt_timestamp(6)?,
        deleted_at: row.opt_timestamp(7)?,
    })
}

/// (id, name, role, deleted_at)
fn deleted_employee(row: &Row) -> Result<DeletedEmployee, RowError> {
    Ok(DeletedEmployee {
        id: EmployeeId(row.int(0)?),
        name: row.text(1)?,
        role: row.text(2)?,
        deleted_at: row.opt_timestamp(3)?,
    })
}
