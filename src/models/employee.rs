//! Employee model and related types.
//!
//! Employees are owned by the directory collaborator; the engine only reads
//! them and copies display fields into [`EmployeeSnapshot`]s.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The role an account holds in the HR backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// HR staff, treated as administrators by the payroll and leave workflows.
    Hr,
    /// Regular employee.
    Employee,
}

impl Role {
    /// Returns true if the role may perform administrative operations.
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "hr" => Ok(Role::Hr),
            "employee" => Ok(Role::Employee),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// The employment class used by salary rule applicability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    /// Confirmed permanent staff.
    Permanent,
    /// Staff on probation.
    Probation,
    /// Fixed-term contract staff.
    Contractual,
    /// Interns.
    Intern,
}

impl EmploymentType {
    /// The snake_case name used in rule `applicableTo` lists.
    pub fn as_str(self) -> &'static str {
        match self {
            EmploymentType::Permanent => "permanent",
            EmploymentType::Probation => "probation",
            EmploymentType::Contractual => "contractual",
            EmploymentType::Intern => "intern",
        }
    }
}

/// Represents an employee as exposed by the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Human-facing employee code (e.g. "EMP-0042").
    #[serde(default)]
    pub employee_code: String,
    /// Department name.
    #[serde(default)]
    pub department: String,
    /// Job title.
    #[serde(default)]
    pub designation: String,
    /// Account role.
    pub role: Role,
    /// Employment class.
    pub employment_type: EmploymentType,
    /// Gross annual salary.
    pub annual_salary: Decimal,
    /// Whether the employee is currently active.
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Employee {
    /// Returns true if the employee is an administrator account.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Monthly basic salary (`annual / 12`), unrounded.
    pub fn monthly_salary(&self) -> Decimal {
        self.annual_salary / Decimal::from(12)
    }

    /// Copies the display fields into a snapshot.
    pub fn snapshot(&self) -> EmployeeSnapshot {
        EmployeeSnapshot {
            name: self.name.clone(),
            employee_code: self.employee_code.clone(),
            department: self.department.clone(),
            designation: self.designation.clone(),
        }
    }
}

/// Employee display fields frozen into a dependent record at write time.
///
/// Snapshots are never re-synced with the directory: a leave request or a
/// payroll keeps the name and department the employee had when it was made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSnapshot {
    /// Display name.
    pub name: String,
    /// Employee code.
    pub employee_code: String,
    /// Department name.
    pub department: String,
    /// Job title.
    pub designation: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn create_test_employee(role: Role) -> Employee {
        Employee {
            id: "emp_001".to_string(),
            name: "Ayesha Rahman".to_string(),
            employee_code: "EMP-0001".to_string(),
            department: "Engineering".to_string(),
            designation: "Developer".to_string(),
            role,
            employment_type: EmploymentType::Permanent,
            annual_salary: Decimal::from(120000),
            is_active: true,
        }
    }

    #[test]
    fn test_deserialize_employee_defaults_active() {
        let json = r#"{
            "id": "emp_002",
            "name": "Karim",
            "role": "employee",
            "employmentType": "probation",
            "annualSalary": "60000"
        }"#;

        let employee: Employee = serde_json::from_str(json).unwrap();
        assert_eq!(employee.employment_type, EmploymentType::Probation);
        assert!(employee.is_active);
        assert_eq!(employee.department, "");
    }

    #[test]
    fn test_monthly_salary_is_annual_over_twelve() {
        let employee = create_test_employee(Role::Employee);
        assert_eq!(employee.monthly_salary(), Decimal::from(10000));
    }

    #[test]
    fn test_hr_counts_as_admin() {
        assert!(create_test_employee(Role::Hr).is_admin());
        assert!(create_test_employee(Role::Admin).is_admin());
        assert!(!create_test_employee(Role::Employee).is_admin());
    }

    #[test]
    fn test_snapshot_copies_display_fields() {
        let employee = create_test_employee(Role::Employee);
        let snapshot = employee.snapshot();
        assert_eq!(snapshot.name, "Ayesha Rahman");
        assert_eq!(snapshot.department, "Engineering");
        assert_eq!(snapshot.employee_code, "EMP-0001");
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert_eq!(Role::from_str(" hr ").unwrap(), Role::Hr);
        assert!(Role::from_str("owner").is_err());
    }

    #[test]
    fn test_employment_type_serialization() {
        assert_eq!(
            serde_json::to_string(&EmploymentType::Contractual).unwrap(),
            "\"contractual\""
        );
        assert_eq!(EmploymentType::Intern.as_str(), "intern");
    }
}
