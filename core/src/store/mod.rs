//! Employee record store

mod import;
pub mod sqlite;

pub use sqlite::{ImportReport, SqliteEmployeeStore};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One row of the employee table, keyed by the source column names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(rename = "EmployeeID")]
    pub employee_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Email")]
    pub email: Option<String>,
    #[serde(rename = "Phone")]
    pub phone: Option<String>,
    #[serde(rename = "Department")]
    pub department: Option<String>,
    #[serde(rename = "Position")]
    pub position: Option<String>,
    #[serde(rename = "JoinDate")]
    pub join_date: Option<NaiveDate>,
    #[serde(rename = "SalaryUSD")]
    pub salary_usd: Option<f64>,
}

impl Employee {
    pub fn new(employee_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            name: name.into(),
            email: None,
            phone: None,
            department: None,
            position: None,
            join_date: None,
            salary_usd: None,
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.position = Some(position.into());
        self
    }
}

/// Read access to employee records, as used by the lookup tools
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Exact lookup by id
    async fn get_employee_by_id(&self, employee_id: &str) -> Result<Option<Employee>, StoreError>;

    /// Substring match on name, email, department and id
    async fn search_employees(&self, search_term: &str, limit: usize)
        -> Result<Vec<Employee>, StoreError>;

    /// Case-insensitive exact match on department
    async fn employees_by_department(&self, department: &str) -> Result<Vec<Employee>, StoreError>;
}
