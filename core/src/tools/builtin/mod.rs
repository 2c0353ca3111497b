//! Built-in tools

pub mod employees;

pub use employees::{employee_tools, GetEmployeeById, GetEmployeesByDepartment, SearchEmployees};
