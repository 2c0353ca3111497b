//! SQLite-backed employee store

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, Row};
use tracing::info;

use super::import::read_employees;
use super::{Employee, EmployeeStore};
use crate::error::StoreError;

/// Maximum rows returned by a department listing
const DEPARTMENT_LIMIT: usize = 100;

const COLUMNS: &str =
    "EmployeeID, Name, Email, Phone, Department, Position, JoinDate, SalaryUSD";

/// Employee table in a SQLite database
#[derive(Clone)]
pub struct SqliteEmployeeStore {
    connection: Arc<Mutex<Connection>>,
}

/// Outcome of a CSV import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

impl SqliteEmployeeStore {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// Store backed by a private in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS employees (
                EmployeeID TEXT PRIMARY KEY,
                Name TEXT NOT NULL,
                Email TEXT,
                Phone TEXT,
                Department TEXT,
                Position TEXT,
                JoinDate TEXT,
                SalaryUSD REAL
            );
            CREATE INDEX IF NOT EXISTS idx_employees_name ON employees (Name);
            CREATE INDEX IF NOT EXISTS idx_employees_department ON employees (Department);",
        )?;

        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let connection = self.connection.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = connection.lock().map_err(|_| StoreError::LockPoisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task {
            message: e.to_string(),
        })?
    }

    /// Insert or replace one record
    pub async fn upsert(&self, employee: Employee) -> Result<(), StoreError> {
        self.with_conn(move |conn| {
            upsert_row(conn, &employee)?;
            Ok(())
        })
        .await
    }

    /// Number of stored records
    pub async fn count(&self) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM employees", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await
    }

    /// Replace the table contents with the rows of a CSV file.
    ///
    /// Blank lines and rows without an `EmployeeID` are skipped. Quoted fields
    /// may span lines. Dates must be `YYYY-MM-DD`; unparseable dates and
    /// salaries are stored as NULL.
    pub async fn import_csv(&self, csv_path: &Path) -> Result<ImportReport, StoreError> {
        let content = tokio::fs::read_to_string(csv_path)
            .await
            .map_err(|e| StoreError::Import {
                line: 0,
                message: format!("cannot read {}: {}", csv_path.display(), e),
            })?;

        let report = self.with_conn(move |conn| import_rows(conn, &content)).await?;
        info!(
            imported = report.imported,
            skipped = report.skipped,
            path = %csv_path.display(),
            "imported employee records"
        );
        Ok(report)
    }
}

fn upsert_row(conn: &Connection, employee: &Employee) -> rusqlite::Result<usize> {
    conn.execute(
        &format!("INSERT OR REPLACE INTO employees ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)", COLUMNS),
        params![
            employee.employee_id,
            employee.name,
            employee.email,
            employee.phone,
            employee.department,
            employee.position,
            employee.join_date,
            employee.salary_usd,
        ],
    )
}

fn import_rows(conn: &mut Connection, content: &str) -> Result<ImportReport, StoreError> {
    let rows = read_employees(content)?;

    let tx = conn.transaction()?;
    tx.execute("DELETE FROM employees", [])?;
    for (line, employee) in &rows.employees {
        upsert_row(&tx, employee).map_err(|e| StoreError::Import {
            line: *line,
            message: e.to_string(),
        })?;
    }
    tx.commit()?;

    Ok(ImportReport {
        imported: rows.employees.len(),
        skipped: rows.skipped,
    })
}

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        employee_id: row.get("EmployeeID")?,
        name: row.get("Name")?,
        email: row.get("Email")?,
        phone: row.get("Phone")?,
        department: row.get("Department")?,
        position: row.get("Position")?,
        join_date: row.get("JoinDate")?,
        salary_usd: row.get("SalaryUSD")?,
    })
}

/// Escape LIKE wildcards so the term matches literally
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl EmployeeStore for SqliteEmployeeStore {
    async fn get_employee_by_id(&self, employee_id: &str) -> Result<Option<Employee>, StoreError> {
        let employee_id = employee_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM employees WHERE EmployeeID = ?1",
                COLUMNS
            ))?;
            let mut rows = stmt.query_map([employee_id], employee_from_row)?;
            Ok(rows.next().transpose()?)
        })
        .await
    }

    async fn search_employees(
        &self,
        search_term: &str,
        limit: usize,
    ) -> Result<Vec<Employee>, StoreError> {
        let pattern = like_pattern(search_term);
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM employees
                 WHERE Name LIKE ?1 ESCAPE '\\'
                    OR Email LIKE ?1 ESCAPE '\\'
                    OR Department LIKE ?1 ESCAPE '\\'
                    OR EmployeeID LIKE ?1 ESCAPE '\\'
                 ORDER BY EmployeeID
                 LIMIT ?2",
                COLUMNS
            ))?;
            let rows = stmt.query_map(params![pattern, limit as i64], employee_from_row)?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn employees_by_department(&self, department: &str) -> Result<Vec<Employee>, StoreError> {
        let department = department.trim().to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM employees
                 WHERE Department = ?1 COLLATE NOCASE
                 ORDER BY EmployeeID
                 LIMIT ?2",
                COLUMNS
            ))?;
            let rows = stmt.query_map(
                params![department, DEPARTMENT_LIMIT as i64],
                employee_from_row,
            )?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }
}
