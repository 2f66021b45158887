use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::CashflowError;
use crate::types::{Money, Rate, MAX_MONEY_INPUT};
use crate::CashflowResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Longest loan term the model accepts (30 years of monthly payments).
pub const MAX_TERM_MONTHS: u32 = 360;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Static terms of an amortizing term loan. Immutable for the life of a
/// projection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtParameters {
    /// Principal outstanding at month 0
    pub loan_amount: Money,
    /// Annual nominal interest rate (0.06 = 6%)
    pub interest_rate: Rate,
    /// Term in months
    pub term_months: u32,
    /// Level payment due each month from month 1
    pub monthly_payment: Money,
}

/// Interest, principal, and opening balance for a single month of the loan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtService {
    pub interest_expense: Money,
    pub principal_payment: Money,
    pub remaining_balance: Money,
}

// ---------------------------------------------------------------------------
// Loan setup
// ---------------------------------------------------------------------------

impl DebtParameters {
    /// Build loan terms, deriving the level monthly payment from the standard
    /// annuity formula (straight division of principal at zero interest).
    pub fn new(loan_amount: Money, interest_rate: Rate, term_months: u32) -> CashflowResult<Self> {
        if loan_amount <= Decimal::ZERO {
            return Err(CashflowError::InvalidInput {
                field: "loan_amount".into(),
                reason: format!("Loan amount must be positive, got {loan_amount}"),
            });
        }
        if loan_amount > MAX_MONEY_INPUT {
            return Err(CashflowError::InvalidInput {
                field: "loan_amount".into(),
                reason: format!("Loan amount must not exceed {MAX_MONEY_INPUT}, got {loan_amount}"),
            });
        }
        if interest_rate < Decimal::ZERO || interest_rate > Decimal::ONE {
            return Err(CashflowError::InvalidInput {
                field: "interest_rate".into(),
                reason: format!("Rate must be between 0 and 1, got {interest_rate}"),
            });
        }
        if term_months == 0 || term_months > MAX_TERM_MONTHS {
            return Err(CashflowError::InvalidInput {
                field: "term_months".into(),
                reason: format!("Term must be between 1 and {MAX_TERM_MONTHS} months, got {term_months}"),
            });
        }

        let monthly_rate = interest_rate / MONTHS_PER_YEAR;
        let n = Decimal::from(term_months);

        let monthly_payment = if monthly_rate.is_zero() {
            loan_amount / n
        } else {
            let factor = (Decimal::ONE + monthly_rate).powi(term_months as i64);
            loan_amount * (monthly_rate * factor) / (factor - Decimal::ONE)
        };

        Ok(DebtParameters {
            loan_amount,
            interest_rate,
            term_months,
            monthly_payment,
        })
    }

    /// Periodic rate applied each month.
    pub fn monthly_rate(&self) -> Rate {
        self.interest_rate / MONTHS_PER_YEAR
    }
}

// ---------------------------------------------------------------------------
// Monthly service
// ---------------------------------------------------------------------------

/// Recompute one month's debt service from the closed-form present-value
/// identity, with no carried schedule state.
///
/// The opening balance of month `m` equals the PV of the payments still due
/// (`term - m + 1` of them); the prior month's balance is the same expression
/// one payment longer, or the original principal at month 1. Recomputing from
/// the closed form keeps every month independently addressable and immune to
/// accumulation drift. Month 0 is the opening snapshot: the full principal
/// on the books with nothing due.
pub fn calculate_debt_service(debt: Option<&DebtParameters>, month: u32) -> DebtService {
    let Some(debt) = debt else {
        return DebtService::default();
    };

    if month == 0 {
        return DebtService {
            interest_expense: Decimal::ZERO,
            principal_payment: Decimal::ZERO,
            remaining_balance: debt.loan_amount,
        };
    }

    if month > debt.term_months {
        return DebtService::default();
    }

    let monthly_rate = debt.monthly_rate();
    let months_remaining = debt.term_months as i64 - month as i64 + 1;

    if months_remaining <= 0 {
        return DebtService::default();
    }

    // Zero-rate loans amortize linearly; the PV identity divides by the rate.
    if monthly_rate.is_zero() {
        let paid_down = debt.monthly_payment * Decimal::from(month - 1);
        return DebtService {
            interest_expense: Decimal::ZERO,
            principal_payment: debt.monthly_payment,
            remaining_balance: (debt.loan_amount - paid_down).max(Decimal::ZERO),
        };
    }

    let remaining_balance = annuity_pv(debt.monthly_payment, monthly_rate, months_remaining);

    let prev_balance = if month > 1 {
        annuity_pv(debt.monthly_payment, monthly_rate, months_remaining + 1)
    } else {
        debt.loan_amount
    };

    let interest_expense = prev_balance * monthly_rate;
    let principal_payment = debt.monthly_payment - interest_expense;

    DebtService {
        interest_expense,
        principal_payment,
        remaining_balance,
    }
}

/// Present value of `periods` level payments of `payment` at `rate` per
/// period: `payment * (1 - (1+r)^-n) / r`.
fn annuity_pv(payment: Money, rate: Rate, periods: i64) -> Money {
    let discount = Decimal::ONE / (Decimal::ONE + rate).powi(periods);
    payment * (Decimal::ONE - discount) / rate
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
