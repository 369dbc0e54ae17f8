// ABOUTME: Entry point for the employee records console
// ABOUTME: Calls the library run function; the exit code is always zero

fn main() {
    if let Err(e) = employee_records_lib::run() {
        eprintln!("{:#}", e);
    }
}
