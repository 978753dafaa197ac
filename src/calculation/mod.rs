//! Calculation logic for the payroll engine.
//!
//! This module contains the pure salary calculator: attendance and leave day
//! counting, pro-rated basic pay, rule-set components evaluated through a
//! constrained formula parser, salary rule adjustments, the leave deduction
//! applied when unpaid leave is approved, and amounts rendered in words.

mod attendance_summary;
mod basic_pay;
mod components;
mod formula;
mod leave_deduction;
mod salary;
mod salary_rules;
mod words;

pub use attendance_summary::{LeaveDaysResult, count_leave_days, summarize_attendance};
pub use basic_pay::{BasicPayResult, calculate_basic_pay, calculation_method};
pub use components::{ComponentsResult, evaluate_adjustment, evaluate_component, evaluate_rule_set};
pub use formula::{BASIC_TOKEN, evaluate_formula};
pub use leave_deduction::{DEFAULT_LEAVE_DIVISOR, leave_deduction};
pub use salary::{SalaryInput, calculate_salary, net_from_parts};
pub use salary_rules::{RuleBasis, SalaryRulesResult, apply_salary_rules, rule_units};
pub use words::amount_in_words;
