//! Leave deduction for unpaid and half-paid leave.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{LeavePayStatus, round_money};

/// Divisor applied to basic pay to value one leave day.
pub const DEFAULT_LEAVE_DIVISOR: u32 = 30;

/// Amount to deduct from a payroll for an approved leave.
///
/// `basicPay / divisor * totalDays`, halved for half-paid leave and rounded
/// to 2 dp. Paid leave deducts nothing and returns `None`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::leave_deduction;
/// use payroll_engine::models::LeavePayStatus;
/// use rust_decimal::Decimal;
///
/// let amount = leave_deduction(Decimal::from(30000), 2, LeavePayStatus::Unpaid, 30);
/// assert_eq!(amount, Some(Decimal::from(2000)));
/// ```
pub fn leave_deduction(
    basic_pay: Decimal,
    total_days: i64,
    pay_status: LeavePayStatus,
    divisor: u32,
) -> Option<Decimal> {
    let factor = match pay_status {
        LeavePayStatus::Paid => return None,
        LeavePayStatus::Unpaid => Decimal::ONE,
        LeavePayStatus::HalfPaid => dec!(0.5),
    };
    let divisor = Decimal::from(divisor.max(1));
    Some(round_money(
        basic_pay / divisor * Decimal::from(total_days) * factor,
    ))
}
