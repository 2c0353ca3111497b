//! Reading employee rows out of a CSV export

use std::collections::HashMap;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use super::Employee;
use crate::error::StoreError;

/// Rows ready to insert, keyed by the line each record started on
#[derive(Debug, Default)]
pub(crate) struct ParsedRows {
    pub employees: Vec<(usize, Employee)>,
    pub skipped: usize,
}

/// A header row mapped to column positions
struct Header {
    columns: HashMap<String, usize>,
}

impl Header {
    fn from_record(record: &StringRecord) -> Self {
        let columns = record
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').to_string(), i))
            .collect();
        Self { columns }
    }

    fn has(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Value of `column`, `None` when absent or blank
    fn value<'a>(&self, record: &'a StringRecord, column: &str) -> Option<&'a str> {
        self.columns
            .get(column)
            .and_then(|&i| record.get(i))
            .filter(|v| !v.is_empty())
    }
}

fn import_error(e: &csv::Error) -> StoreError {
    StoreError::Import {
        line: e.position().map_or(0, |p| p.line() as usize),
        message: e.to_string(),
    }
}

/// Parse `content`; blank lines and rows without an `EmployeeID` are skipped
pub(crate) fn read_employees(content: &str) -> Result<ParsedRows, StoreError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let header = Header::from_record(reader.headers().map_err(|e| import_error(&e))?);
    if header.columns.is_empty() {
        return Ok(ParsedRows::default());
    }
    for column in ["EmployeeID", "Name"] {
        if !header.has(column) {
            return Err(StoreError::Import {
                line: 1,
                message: format!("missing `{}` column", column),
            });
        }
    }

    let mut rows = ParsedRows::default();
    for record in reader.records() {
        let record = record.map_err(|e| import_error(&e))?;
        let line = record.position().map_or(0, |p| p.line() as usize);

        let Some(employee_id) = header.value(&record, "EmployeeID") else {
            debug!(line, "skipping row without EmployeeID");
            rows.skipped += 1;
            continue;
        };

        let join_date = header.value(&record, "JoinDate").and_then(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|e| warn!(line, value = raw, error = %e, "unparseable JoinDate"))
                .ok()
        });
        let salary_usd = header.value(&record, "SalaryUSD").and_then(|raw| {
            raw.replace([',', '$'], "")
                .parse::<f64>()
                .map_err(|e| warn!(line, value = raw, error = %e, "unparseable SalaryUSD"))
                .ok()
        });

        let employee = Employee {
            employee_id: employee_id.to_string(),
            name: header.value(&record, "Name").unwrap_or_default().to_string(),
            email: header.value(&record, "Email").map(str::to_string),
            phone: header.value(&record, "Phone").map(str::to_string),
            department: header.value(&record, "Department").map(str::to_string),
            position: header.value(&record, "Position").map(str::to_string),
            join_date,
            salary_usd,
        };
        rows.employees.push((line, employee));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_fields_may_span_lines() {
        let content = "EmployeeID,Name,Position\n\
                       EMP004,\"Dana Lee\",\"Staff Engineer,\nPlatform\"\n\
                       EMP005,Eli,Analyst\n";
        let rows = read_employees(content).unwrap();

        assert_eq!(rows.employees.len(), 2);
        let (_, dana) = &rows.employees[0];
        assert_eq!(dana.position.as_deref(), Some("Staff Engineer,\nPlatform"));
        let (line, eli) = &rows.employees[1];
        assert_eq!(eli.employee_id, "EMP005");
        assert_eq!(*line, 4);
    }

    #[test]
    fn test_byte_order_mark_and_empty_input() {
        let rows = read_employees("\u{feff}EmployeeID,Name\nEMP001,Alice\n").unwrap();
        assert_eq!(rows.employees[0].1.name, "Alice");

        let rows = read_employees("").unwrap();
        assert!(rows.employees.is_empty());
        assert_eq!(rows.skipped, 0);
    }

    #[test]
    fn test_salary_formatting_is_stripped() {
        let rows = read_employees("EmployeeID,Name,SalaryUSD\nEMP001,Alice,\"$125,000\"\n").unwrap();
        assert_eq!(rows.employees[0].1.salary_usd, Some(125000.0));
    }
}
