use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The model runs on a 30-day month / 360-day year convention.
pub const DAYS_PER_MONTH: Decimal = dec!(30);

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Dollar balances implied by day-denominated working-capital terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WcComponents {
    /// Accounts receivable
    pub ar: Money,
    /// Inventory at cost
    pub inventory: Money,
    /// Accounts payable
    pub ap: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Convert day terms into dollar balances: AR from the revenue run-rate,
/// inventory and AP from the cost run-rate.
///
/// Pure arithmetic, no validation — day counts are unsigned and the engine
/// owns input checks.
pub fn calculate_wc_components(
    revenue: Money,
    cogs_pct: Rate,
    ar_days: u32,
    ap_days: u32,
    inventory_days: u32,
) -> WcComponents {
    let cogs = revenue * cogs_pct;

    // Multiply before dividing: days/30 of a daily run-rate, kept exact for
    // whole-dollar inputs.
    let ar = revenue * Decimal::from(ar_days) / DAYS_PER_MONTH;
    let inventory = cogs * Decimal::from(inventory_days) / DAYS_PER_MONTH;
    let ap = cogs * Decimal::from(ap_days) / DAYS_PER_MONTH;

    WcComponents { ar, inventory, ap }
}

/// Net working capital: (AR + inventory) - AP.
pub fn calculate_working_capital(ar: Money, inventory: Money, ap: Money) -> Money {
    (ar + inventory) - ap
}

/// Period-over-period working-capital movement. With no prior period the
/// current balance is the baseline and is returned whole.
pub fn calculate_delta_wc(current: Money, previous: Option<Money>) -> Money {
    match previous {
        Some(prev) => current - prev,
        None => current,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
