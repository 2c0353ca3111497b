//! Employee lookup tools

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::{StoreError, ToolError};
use crate::store::EmployeeStore;
use crate::tools::schema::{ParamType, ParameterSchema, ParameterSpec, ToolArguments};
use crate::tools::{ToolCatalog, ToolHandler, ToolSpec};

pub const GET_EMPLOYEE_BY_ID: &str = "get_employee_by_id";
pub const SEARCH_EMPLOYEES: &str = "search_employees";
pub const GET_EMPLOYEES_BY_DEPARTMENT: &str = "get_employees_by_department";

/// Default row cap for `search_employees`
pub const DEFAULT_SEARCH_LIMIT: i64 = 10;

fn store_failure(tool: &str, error: StoreError) -> ToolError {
    ToolError::ExecutionFailed {
        name: tool.to_string(),
        message: error.to_string(),
    }
}

fn to_payload<T: Serialize>(tool: &str, value: T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::ExecutionFailed {
        name: tool.to_string(),
        message: e.to_string(),
    })
}

/// Exact lookup by employee id
pub struct GetEmployeeById {
    store: Arc<dyn EmployeeStore>,
}

#[async_trait]
impl ToolHandler for GetEmployeeById {
    async fn call(&self, args: ToolArguments) -> Result<Value, ToolError> {
        let employee_id: String = args.get("employee_id")?;
        let employee_id = employee_id.trim().to_uppercase();

        match self
            .store
            .get_employee_by_id(&employee_id)
            .await
            .map_err(|e| store_failure(GET_EMPLOYEE_BY_ID, e))?
        {
            Some(employee) => to_payload(GET_EMPLOYEE_BY_ID, employee),
            None => Err(ToolError::NoMatch {
                message: format!("Employee {} not found", employee_id),
            }),
        }
    }
}

/// Substring search across name, email, department and id
pub struct SearchEmployees {
    store: Arc<dyn EmployeeStore>,
}

#[async_trait]
impl ToolHandler for SearchEmployees {
    async fn call(&self, args: ToolArguments) -> Result<Value, ToolError> {
        let search_term: String = args.get("search_term")?;
        let limit = args
            .get_optional::<i64>("limit")?
            .unwrap_or(DEFAULT_SEARCH_LIMIT);
        if limit < 1 {
            return Err(ToolError::InvalidParameters {
                name: SEARCH_EMPLOYEES.to_string(),
                message: format!("`limit` must be at least 1, got {}", limit),
            });
        }

        let employees = self
            .store
            .search_employees(search_term.trim(), limit as usize)
            .await
            .map_err(|e| store_failure(SEARCH_EMPLOYEES, e))?;
        to_payload(SEARCH_EMPLOYEES, employees)
    }
}

/// Everyone in one department
pub struct GetEmployeesByDepartment {
    store: Arc<dyn EmployeeStore>,
}

#[async_trait]
impl ToolHandler for GetEmployeesByDepartment {
    async fn call(&self, args: ToolArguments) -> Result<Value, ToolError> {
        let department: String = args.get("department")?;
        let employees = self
            .store
            .employees_by_department(&department)
            .await
            .map_err(|e| store_failure(GET_EMPLOYEES_BY_DEPARTMENT, e))?;
        to_payload(GET_EMPLOYEES_BY_DEPARTMENT, employees)
    }
}

/// The three employee tools, in catalog order
pub fn employee_tools(store: Arc<dyn EmployeeStore>) -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            GET_EMPLOYEE_BY_ID,
            "Get detailed information about a specific employee by their employee ID (e.g., EMP001)",
            ParameterSchema::new().with(ParameterSpec::required(
                "employee_id",
                ParamType::String,
                "The employee ID (e.g., EMP001, EMP002)",
            )),
            Arc::new(GetEmployeeById {
                store: store.clone(),
            }),
        ),
        ToolSpec::new(
            SEARCH_EMPLOYEES,
            "Search for employees by name, email, department, or employee ID",
            ParameterSchema::new()
                .with(ParameterSpec::required(
                    "search_term",
                    ParamType::String,
                    "Text to search for in employee records",
                ))
                .with(
                    ParameterSpec::optional(
                        "limit",
                        ParamType::Integer,
                        "Maximum number of results to return",
                    )
                    .with_default(DEFAULT_SEARCH_LIMIT),
                ),
            Arc::new(SearchEmployees {
                store: store.clone(),
            }),
        ),
        ToolSpec::new(
            GET_EMPLOYEES_BY_DEPARTMENT,
            "Get all employees in a specific department",
            ParameterSchema::new().with(ParameterSpec::required(
                "department",
                ParamType::String,
                "Department name (e.g., Engineering, Marketing, Sales, HR)",
            )),
            Arc::new(GetEmployeesByDepartment { store }),
        ),
    ]
}

impl ToolCatalog {
    /// Catalog holding the employee tools
    pub fn employee_catalog(store: Arc<dyn EmployeeStore>) -> Result<Self, ToolError> {
        Self::with_specs(employee_tools(store))
    }
}
