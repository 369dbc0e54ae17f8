// ABOUTME: Numbered console menu driving the employee commands
// ABOUTME: Reads choices, coerces input, calls one command per choice and prints the result

use std::io::{self, BufRead, Write};

use super::{parse_id, parse_salary, render, Console};
use crate::commands;
use crate::db::{EmployeeStore, SessionProvider};
use crate::models::{EmployeeDraft, EmployeeId};
use crate::Outcome;

const MENU: &[&str] = &[
    "",
    "===== EMPLOYEE MANAGEMENT SYSTEM =====",
    "--- CRUD operations ---",
    "1) Register new employee",
    "2) View active employees",
    "3) View all employees",
    "4) Delete employee (soft)",
    "5) Restore deleted employee",
    "6) Update employee data",
    "--- Lookups ---",
    "7) Find employee by ID",
    "8) View deleted employees",
    "--- Permanent operations ---",
    "9) Delete employee permanently",
    "--------------------------------------",
    "0) Exit",
];

const INVALID_ID: &str = "The ID must be a valid integer";

enum Step {
    Continue,
    Exit,
}

/// Run the menu until the operator picks 0 or input ends
pub async fn run<P, R, W>(
    store: &EmployeeStore<P>,
    console: &mut Console<R, W>,
    confirm_token: &str,
) -> io::Result<()>
where
    P: SessionProvider,
    R: BufRead,
    W: Write,
{
    loop {
        for line in MENU {
            console.line(line)?;
        }
        let Some(choice) = console.prompt("Select an option: ")? else {
            break;
        };

        let step = match choice.as_str() {
            "1" => register(store, console).await?,
            "2" => show_active(store, console).await?,
            "3" => show_all(store, console).await?,
            "4" => soft_delete(store, console).await?,
            "5" => restore(store, console).await?,
            "6" => update(store, console).await?,
            "7" => find(store, console).await?,
            "8" => show_deleted(store, console).await?,
            "9" => physical_delete(store, console, confirm_token).await?,
            "0" => {
                console.line("Closing the employee management system...")?;
                Step::Exit
            }
            _ => {
                console.line("Unrecognized option. Please select a valid menu option")?;
                Step::Continue
            }
        };

        if let Step::Exit = step {
            break;
        }
    }
    Ok(())
}

/// Prompt for an id; on bad input prints the coercion error and hands back the next step
fn read_id<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    label: &str,
) -> io::Result<Result<EmployeeId, Step>> {
    let Some(text) = console.prompt(label)? else {
        return Ok(Err(Step::Exit));
    };
    match parse_id(&text) {
        Some(id) => Ok(Ok(id)),
        None => {
            console.line(INVALID_ID)?;
            Ok(Err(Step::Continue))
        }
    }
}

/// Prompt for name, role and salary; the draft rejects empty name or role before any database call
fn read_draft<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    labels: [&str; 3],
) -> io::Result<Result<EmployeeDraft, Step>> {
    let Some(name) = console.prompt(labels[0])? else {
        return Ok(Err(Step::Exit));
    };
    let Some(role) = console.prompt(labels[1])? else {
        return Ok(Err(Step::Exit));
    };
    let Some(salary) = console.prompt(labels[2])? else {
        return Ok(Err(Step::Exit));
    };
    let Some(salary) = parse_salary(&salary) else {
        console.line("The salary must be a valid number")?;
        return Ok(Err(Step::Continue));
    };

    match EmployeeDraft::new(&name, &role, salary) {
        Ok(draft) => Ok(Ok(draft)),
        Err(e) => {
            console.line(e)?;
            Ok(Err(Step::Continue))
        }
    }
}

/// Print the success message or the failure for a side-effect-only command
fn report<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    outcome: Outcome<()>,
    success: String,
    failure: &str,
) -> io::Result<Step> {
    match outcome {
        Outcome::Success(()) => console.line(success)?,
        Outcome::NotFound => console.line(format!("{}: employee not found", failure))?,
        Outcome::Failed(e) => console.line(format!("{}: {}", failure, e))?,
    }
    Ok(Step::Continue)
}

async fn register<P, R, W>(store: &EmployeeStore<P>, console: &mut Console<R, W>) -> io::Result<Step>
where
    P: SessionProvider,
    R: BufRead,
    W: Write,
{
    let draft = match read_draft(
        console,
        ["Full name: ", "Role or position: ", "Monthly salary (e.g. 750000): "],
    )? {
        Ok(draft) => draft,
        Err(step) => return Ok(step),
    };

    match commands::create_employee(store, &draft).await {
        Outcome::Success(id) => console.line(format!("Employee created with ID: {}", id))?,
        Outcome::NotFound => console.line("Error creating employee: no id returned")?,
        Outcome::Failed(e) => console.line(format!("Error creating employee: {}", e))?,
    }
    Ok(Step::Continue)
}

async fn show_active<P, R, W>(store: &EmployeeStore<P>, console: &mut Console<R, W>) -> io::Result<Step>
where
    P: SessionProvider,
    R: BufRead,
    W: Write,
{
    let employees = match commands::list_active_employees(store).await {
        Outcome::Failed(e) => {
            console.line(format!("Error listing active employees: {}", e))?;
            return Ok(Step::Continue);
        }
        outcome => outcome.into_option().unwrap_or_default(),
    };

    console.line("\n=== ACTIVE EMPLOYEES ===")?;
    if employees.is_empty() {
        console.line("No active employees found.")?;
    }
    for employee in &employees {
        console.line(render::active_line(employee))?;
    }
    Ok(Step::Continue)
}

async fn show_all<P, R, W>(store: &EmployeeStore<P>, console: &mut Console<R, W>) -> io::Result<Step>
where
    P: SessionProvider,
    R: BufRead,
    W: Write,
{
    let employees = match commands::list_all_employees(store).await {
        Outcome::Failed(e) => {
            console.line(format!("Error listing all employees: {}", e))?;
            return Ok(Step::Continue);
        }
        outcome => outcome.into_option().unwrap_or_default(),
    };

    console.line("\n=== ALL EMPLOYEES ===")?;
    if employees.is_empty() {
        console.line("No employees registered in the database.")?;
    }
    for employee in &employees {
        console.line(render::full_line(employee))?;
    }
    Ok(Step::Continue)
}

async fn soft_delete<P, R, W>(store: &EmployeeStore<P>, console: &mut Console<R, W>) -> io::Result<Step>
where
    P: SessionProvider,
    R: BufRead,
    W: Write,
{
    let id = match read_id(console, "ID of the employee to delete: ")? {
        Ok(id) => id,
        Err(step) => return Ok(step),
    };
    let outcome = commands::soft_delete_employee(store, id).await;
    report(
        console,
        outcome,
        format!("Employee with ID {} has been marked as deleted", id),
        "Error deleting employee",
    )
}

async fn restore<P, R, W>(store: &EmployeeStore<P>, console: &mut Console<R, W>) -> io::Result<Step>
where
    P: SessionProvider,
    R: BufRead,
    W: Write,
{
    let id = match read_id(console, "ID of the employee to restore: ")? {
        Ok(id) => id,
        Err(step) => return Ok(step),
    };
    let outcome = commands::restore_employee(store, id).await;
    report(
        console,
        outcome,
        format!("Employee with ID {} has been restored", id),
        "Error restoring employee",
    )
}

async fn update<P, R, W>(store: &EmployeeStore<P>, console: &mut Console<R, W>) -> io::Result<Step>
where
    P: SessionProvider,
    R: BufRead,
    W: Write,
{
    let id = match read_id(console, "ID of the employee to update: ")? {
        Ok(id) => id,
        Err(step) => return Ok(step),
    };
    console.line(format!("\n--- Enter the new data for employee ID {} ---", id))?;
    let draft = match read_draft(console, ["New name: ", "New role: ", "New salary: "])? {
        Ok(draft) => draft,
        Err(step) => return Ok(step),
    };

    let outcome = commands::update_employee(store, id, &draft).await;
    report(
        console,
        outcome,
        format!("Employee ID {} updated successfully", id),
        "Error updating employee",
    )
}

async fn find<P, R, W>(store: &EmployeeStore<P>, console: &mut Console<R, W>) -> io::Result<Step>
where
    P: SessionProvider,
    R: BufRead,
    W: Write,
{
    let id = match read_id(console, "ID of the employee to find: ")? {
        Ok(id) => id,
        Err(step) => return Ok(step),
    };

    match commands::find_employee(store, id).await {
        Outcome::Success(employee) => {
            console.line(format!("\n=== EMPLOYEE DETAIL ID: {} ===", id))?;
            for line in render::detail(&employee) {
                console.line(line)?;
            }
        }
        Outcome::NotFound => {
            console.line(format!("\n=== EMPLOYEE DETAIL ID: {} ===", id))?;
            console.line(format!("No employee found with ID {}", id))?;
        }
        Outcome::Failed(e) => console.line(format!("Error finding employee: {}", e))?,
    }
    Ok(Step::Continue)
}

async fn show_deleted<P, R, W>(store: &EmployeeStore<P>, console: &mut Console<R, W>) -> io::Result<Step>
where
    P: SessionProvider,
    R: BufRead,
    W: Write,
{
    let employees = match commands::list_deleted_employees(store).await {
        Outcome::Failed(e) => {
            console.line(format!("Error listing deleted employees: {}", e))?;
            return Ok(Step::Continue);
        }
        outcome => outcome.into_option().unwrap_or_default(),
    };

    console.line("\n=== DELETED EMPLOYEES ===")?;
    if employees.is_empty() {
        console.line("No deleted employees found.")?;
    }
    for employee in &employees {
        console.line(render::deleted_line(employee))?;
    }
    Ok(Step::Continue)
}

async fn physical_delete<P, R, W>(
    store: &EmployeeStore<P>,
    console: &mut Console<R, W>,
    confirm_token: &str,
) -> io::Result<Step>
where
    P: SessionProvider,
    R: BufRead,
    W: Write,
{
    let id = match read_id(console, "ID of the employee to delete permanently: ")? {
        Ok(id) => id,
        Err(step) => return Ok(step),
    };

    let warning = format!(
        "WARNING: You are about to permanently delete employee ID {}. \
         This action cannot be undone. Type '{}' to proceed: ",
        id, confirm_token
    );
    let Some(answer) = console.prompt(&warning)? else {
        return Ok(Step::Exit);
    };
    if answer != confirm_token {
        console.line("Operation cancelled")?;
        return Ok(Step::Continue);
    }

    let outcome = commands::physical_delete_employee(store, id).await;
    report(
        console,
        outcome,
        format!(
            "Employee with ID {} has been permanently deleted from the database",
            id
        ),
        "Error permanently deleting employee",
    )
}
