// ABOUTME: Console boundary: line-based prompts and trivial input coercion
// ABOUTME: Generic over reader/writer so the menu can be driven from tests

pub mod menu;
pub mod render;

use rust_decimal::Decimal;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::models::EmployeeId;

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print `label` and read one trimmed line; `None` once input is exhausted
    pub fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    pub fn line(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

pub fn parse_id(text: &str) -> Option<EmployeeId> {
    text.trim().parse::<i64>().ok().map(EmployeeId)
}

/// Plain or scientific notation, e.g. `750000`, `1200000.50`, `1.2e6`
pub fn parse_salary(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_trims_and_detects_eof() {
        let mut console = Console::new(&b"  7 \n"[..], Vec::new());
        assert_eq!(console.prompt("ID: ").unwrap(), Some("7".to_string()));
        assert_eq!(console.prompt("ID: ").unwrap(), None);
        assert_eq!(String::from_utf8(console.into_output()).unwrap(), "ID: ID: ");
    }

    #[test]
    fn parse_id_accepts_integers_only() {
        assert_eq!(parse_id(" 12 "), Some(EmployeeId(12)));
        assert_eq!(parse_id("1.5"), None);
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id(""), None);
    }

    #[test]
    fn parse_salary_formats() {
        assert_eq!(parse_salary("750000"), Some(Decimal::from(750_000)));
        assert_eq!(parse_salary("1200000.50"), Some(Decimal::new(120_000_050, 2)));
        assert_eq!(parse_salary("1.2e6"), Some(Decimal::from(1_200_000)));
        assert_eq!(parse_salary("a lot"), None);
    }
}
