//! Employee directory.
//!
//! Employee management lives outside this service; the workflows only look
//! employees up. [`InMemoryDirectory`] serves the employees listed in
//! configuration.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::models::Employee;

/// Read access to the employee directory.
#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Looks an employee up by id.
    async fn find(&self, employee_id: &str) -> EngineResult<Option<Employee>>;

    /// Every active employee.
    async fn list_active(&self) -> EngineResult<Vec<Employee>>;

    /// Looks an employee up, failing with `EmployeeNotFound`.
    async fn get(&self, employee_id: &str) -> EngineResult<Employee> {
        self.find(employee_id)
            .await?
            .ok_or_else(|| EngineError::EmployeeNotFound {
                employee_id: employee_id.to_string(),
            })
    }
}

/// A directory held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    employees: RwLock<HashMap<String, Employee>>,
}

impl InMemoryDirectory {
    /// Builds a directory from a list of employees.
    pub fn new(employees: impl IntoIterator<Item = Employee>) -> Self {
        Self {
            employees: RwLock::new(employees.into_iter().map(|e| (e.id.clone(), e)).collect()),
        }
    }

    /// Adds or replaces an employee.
    pub async fn upsert(&self, employee: Employee) {
        self.employees.write().await.insert(employee.id.clone(), employee);
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryDirectory {
    async fn find(&self, employee_id: &str) -> EngineResult<Option<Employee>> {
        Ok(self.employees.read().await.get(employee_id).cloned())
    }

    async fn list_active(&self) -> EngineResult<Vec<Employee>> {
        let mut active: Vec<Employee> = self
            .employees
            .read()
            .await
            .values()
            .filter(|e| e.is_active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EmploymentType, Role};
    use rust_decimal::Decimal;

    fn employee(id: &str, active: bool) -> Employee {
        Employee {
            id: id.to_string(),
            name: id.to_string(),
            employee_code: String::new(),
            department: String::new(),
            designation: String::new(),
            role: Role::Employee,
            employment_type: EmploymentType::Permanent,
            annual_salary: Decimal::from(60000),
            is_active: active,
        }
    }

    #[tokio::test]
    async fn test_unknown_employee_is_reported() {
        let directory = InMemoryDirectory::new(vec![employee("emp_001", true)]);
        assert!(directory.get("emp_001").await.is_ok());
        assert!(matches!(
            directory.get("emp_404").await,
            Err(EngineError::EmployeeNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_active_skips_inactive() {
        let directory = InMemoryDirectory::new(vec![employee("emp_002", true), employee("emp_001", false)]);
        let active = directory.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "emp_002");
    }
}
