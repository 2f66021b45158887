use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Money;
use crate::working_capital::DAYS_PER_MONTH;

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Liquidity and margin ratios for a single projected month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeriodMetrics {
    pub current_ratio: Decimal,
    pub quick_ratio: Decimal,
    /// How many days the cash balance covers operating spend
    pub days_cash_on_hand: Decimal,
    /// EBIT over revenue, in percent
    pub operating_margin: Decimal,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Derive period ratios from one month's balances.
///
/// Total over all inputs: an AP that is not positive is replaced by 1 before
/// dividing (an epsilon, not a real liability), zero OPEX or revenue
/// short-circuit their ratios to zero rather than failing, and a ratio that
/// outruns `Decimal` range pins at the range edge.
pub fn calculate_period_metrics(
    revenue: Money,
    ebit: Money,
    ar: Money,
    inventory: Money,
    ap: Money,
    cash_balance: Money,
    opex: Money,
) -> PeriodMetrics {
    let current_assets = ar + inventory + cash_balance;
    let current_liabilities = if ap > Decimal::ZERO { ap } else { Decimal::ONE };

    let current_ratio = clamped_ratio(current_assets, current_liabilities);
    let quick_ratio = clamped_ratio(current_assets - inventory, current_liabilities);

    let days_cash_on_hand = if opex > Decimal::ZERO {
        clamped_ratio(cash_balance * DAYS_PER_MONTH, opex)
    } else {
        Decimal::ZERO
    };

    let operating_margin = if revenue > Decimal::ZERO {
        clamped_ratio(ebit * dec!(100), revenue)
    } else {
        Decimal::ZERO
    };

    PeriodMetrics {
        current_ratio,
        quick_ratio,
        days_cash_on_hand,
        operating_margin,
    }
}

/// Division pinned at the `Decimal` range edge instead of overflowing when
/// the denominator is many orders smaller than the numerator.
pub(crate) fn clamped_ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    numerator.checked_div(denominator).unwrap_or_else(|| {
        if numerator < Decimal::ZERO {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
