use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::debt::{calculate_debt_service, DebtParameters};
use crate::error::CashflowError;
use crate::metrics::{calculate_period_metrics, clamped_ratio};
use crate::types::{with_metadata, ComputationOutput, Money, Rate, MAX_MONEY_INPUT};
use crate::working_capital::{
    calculate_delta_wc, calculate_wc_components, calculate_working_capital,
};
use crate::CashflowResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Compounded COGS can never consume 95% or more of revenue.
pub const COGS_PCT_CAP: Decimal = dec!(0.95);

/// Hard ceiling on the projection horizon.
pub const MAX_PROJECTION_MONTHS: u32 = 360;

/// Past this horizon the monthly recurrence is stretched well beyond the
/// simplification it was built on; runs still succeed but carry a warning.
const HORIZON_WARNING_MONTHS: u32 = 120;

/// Coverage floor under which debt service is flagged.
const DSCR_MINIMUM: Decimal = dec!(1);

/// Ceiling on any compounded driver. Holding the per-month series under
/// 1e22 keeps working capital, coverage, and accumulated cash inside
/// `Decimal` range across the longest run.
const COMPOUNDED_DRIVER_CAP: Decimal = dec!(10_000_000_000_000_000_000_000);

/// Longest accepted day term for AR, AP, and inventory.
pub const MAX_DAY_TERMS: u32 = 365;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Base-month business parameters for one projection run. Owned by the
/// caller; the engine reads them and holds nothing between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInputs {
    /// Revenue in the baseline month
    pub revenue: Money,
    /// COGS as a fraction of revenue at month 0
    pub cogs_pct: Rate,
    /// Monthly compounding growth of the COGS ratio
    #[serde(default)]
    pub cogs_increase: Rate,
    /// Operating expenses in the baseline month
    pub opex: Money,
    /// Monthly compounding OPEX inflation
    #[serde(default)]
    pub opex_increase: Rate,
    /// Corporate tax rate
    pub tax_rate: Rate,
    /// Days of revenue outstanding as receivables
    pub ar_days: u32,
    /// Days of cost financed by suppliers
    pub ap_days: u32,
    /// Days of cost held as stock
    pub inventory_days: u32,
    /// Capital expenditure per month
    pub capex: Money,
    /// Depreciation add-back per month
    pub depreciation: Money,
    /// Monthly compounding revenue growth
    #[serde(default)]
    pub price_increase: Rate,
    /// Cash on hand at month 0
    #[serde(default)]
    pub opening_cash: Money,
}

// ---------------------------------------------------------------------------
// Output structs
// ---------------------------------------------------------------------------

/// One projected month. Month 0 is the as-is baseline; growth, deltas, and
/// debt service only begin at month 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthRecord {
    pub month: u32,
    pub revenue: Money,
    pub cogs: Money,
    pub ebit: Money,
    pub interest_expense: Money,
    pub ebit_after_interest: Money,
    pub ebit_after_tax: Money,
    pub ar: Money,
    pub inventory: Money,
    pub ap: Money,
    pub wc: Money,
    pub delta_wc: Money,
    pub delta_ar: Money,
    pub delta_inventory: Money,
    pub delta_ap: Money,
    pub fcf: Money,
    pub principal_payment: Money,
    pub fcf_after_debt: Money,
    pub debt_balance: Money,
    /// `None` whenever no debt service is due this month — never a zero
    /// sentinel
    pub dscr: Option<Decimal>,
    pub cash_balance: Money,
    /// Cash conversion cycle in days; constant across a run
    pub ccc: i64,
    /// Percent of revenue left after COGS
    pub gross_margin: Decimal,
    pub current_ratio: Decimal,
    pub quick_ratio: Decimal,
    pub days_cash_on_hand: Decimal,
    /// EBIT over revenue, in percent
    pub operating_margin: Decimal,
}

/// Aggregates over a full projection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_months: u32,
    pub ccc: i64,
    pub final_cash_balance: Money,
    pub lowest_cash_balance: Money,
    /// First month whose closing cash is negative
    pub first_cash_deficit_month: Option<u32>,
    /// Sum of fcf across every row, baseline included
    pub cumulative_fcf: Money,
    pub ending_debt_balance: Money,
    /// Tightest coverage seen across months with debt service due
    pub minimum_dscr: Option<Decimal>,
}

/// Complete engine output: the month series plus run aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub months: Vec<MonthRecord>,
    pub summary: ProjectionSummary,
}

#[derive(Serialize)]
struct RunAssumptions<'a> {
    inputs: &'a ProjectionInputs,
    num_months: u32,
    debt: Option<&'a DebtParameters>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project the business month by month from the baseline snapshot.
///
/// Produces `num_months + 1` records, indexed 0..=num_months. Month 0 is the
/// steady-state baseline: growth factors are at `(1+x)^0`, working-capital
/// deltas are zero by definition, debt shows its undrawn principal, and cash
/// stays at `opening_cash`. Each later month compounds the drivers, recomputes
/// balances, and accumulates `fcf_after_debt` into cash.
pub fn build_monthly_projection(
    inputs: &ProjectionInputs,
    num_months: u32,
    debt: Option<&DebtParameters>,
) -> CashflowResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(inputs, num_months)?;

    if num_months > HORIZON_WARNING_MONTHS {
        warnings.push(format!(
            "Horizon of {num_months} months stretches the monthly recurrence well past its \
             design intent; treat late months as directional"
        ));
    }

    let ccc = inputs.ar_days as i64 + inputs.inventory_days as i64 - inputs.ap_days as i64;
    let tax_factor = Decimal::ONE - inputs.tax_rate;

    // Carry-forward state; the month-0 iteration seeds it with the baseline
    let mut prior_wc = Decimal::ZERO;
    let mut prior_ar = Decimal::ZERO;
    let mut prior_inventory = Decimal::ZERO;
    let mut prior_ap = Decimal::ZERO;
    let mut cash_balance = inputs.opening_cash;

    // Run aggregates, folded as the loop advances
    let mut lowest_cash = inputs.opening_cash;
    let mut first_cash_deficit_month: Option<u32> = None;
    let mut cumulative_fcf = Decimal::ZERO;
    let mut ending_debt_balance = Decimal::ZERO;
    let mut minimum_dscr: Option<Decimal> = None;

    // First-occurrence warning markers
    let mut cogs_cap_month: Option<u32> = None;
    let mut low_dscr: Option<(u32, Decimal)> = None;

    let mut months: Vec<MonthRecord> = Vec::with_capacity(num_months as usize + 1);

    for month in 0..=num_months {
        // -------------------------------------------------------------------
        // Compounding drivers (month 0 sits at the base values)
        // -------------------------------------------------------------------
        let revenue =
            compound(inputs.revenue, inputs.price_increase, month, "price_increase")?;

        // Overflow in the raw ratio is moot; the cap clamps it either way
        let mut cogs_pct = (Decimal::ONE + inputs.cogs_increase)
            .checked_powi(month as i64)
            .and_then(|factor| inputs.cogs_pct.checked_mul(factor))
            .unwrap_or(COGS_PCT_CAP);
        if cogs_pct > COGS_PCT_CAP {
            cogs_pct = COGS_PCT_CAP;
            if cogs_cap_month.is_none() {
                cogs_cap_month = Some(month);
            }
        }

        let opex = compound(inputs.opex, inputs.opex_increase, month, "opex_increase")?;

        // -------------------------------------------------------------------
        // Debt service (accrues from month 1; month 0 reports the undrawn
        // principal with nothing due)
        // -------------------------------------------------------------------
        let debt_service = calculate_debt_service(debt, month);

        // -------------------------------------------------------------------
        // Profitability
        // -------------------------------------------------------------------
        let cogs = revenue * cogs_pct;
        let ebit = revenue - cogs - opex;
        let ebit_after_interest = ebit - debt_service.interest_expense;
        let ebit_after_tax = ebit_after_interest * tax_factor;

        let gross_margin = if revenue > Decimal::ZERO {
            (revenue - cogs) / revenue * dec!(100)
        } else {
            Decimal::ZERO
        };

        // -------------------------------------------------------------------
        // Working capital (current revenue/cost run-rates, fixed day terms)
        // -------------------------------------------------------------------
        let components = calculate_wc_components(
            revenue,
            cogs_pct,
            inputs.ar_days,
            inputs.ap_days,
            inputs.inventory_days,
        );
        let wc = calculate_working_capital(components.ar, components.inventory, components.ap);

        // Month 0 is a snapshot of a business already at steady state, not a
        // transition, so its deltas are zero by definition
        let (delta_wc, delta_ar, delta_inventory, delta_ap) = if month == 0 {
            (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
        } else {
            (
                calculate_delta_wc(wc, Some(prior_wc)),
                components.ar - prior_ar,
                components.inventory - prior_inventory,
                components.ap - prior_ap,
            )
        };

        // -------------------------------------------------------------------
        // Free cash flow and the cash carry
        // -------------------------------------------------------------------
        // NOPAT here is ebit_after_interest taxed inline, kept as its own
        // term rather than a read of the ebit_after_tax line
        let fcf = ebit_after_interest * tax_factor + inputs.depreciation
            - inputs.capex
            - delta_wc;
        let fcf_after_debt = fcf - debt_service.principal_payment;

        if month > 0 {
            cash_balance += fcf_after_debt;
        }

        let total_service = debt_service.interest_expense + debt_service.principal_payment;
        let dscr = if debt.is_some() && month > 0 && total_service > Decimal::ZERO {
            Some(clamped_ratio(fcf, total_service))
        } else {
            None
        };

        let metrics = calculate_period_metrics(
            revenue,
            ebit,
            components.ar,
            components.inventory,
            components.ap,
            cash_balance,
            opex,
        );

        // -------------------------------------------------------------------
        // Aggregates and warning markers
        // -------------------------------------------------------------------
        cumulative_fcf += fcf;
        ending_debt_balance = debt_service.remaining_balance;
        if cash_balance < lowest_cash {
            lowest_cash = cash_balance;
        }
        if cash_balance < Decimal::ZERO && first_cash_deficit_month.is_none() {
            first_cash_deficit_month = Some(month);
        }
        if let Some(ratio) = dscr {
            minimum_dscr = Some(match minimum_dscr {
                Some(current) if current <= ratio => current,
                _ => ratio,
            });
            if ratio < DSCR_MINIMUM && low_dscr.is_none() {
                low_dscr = Some((month, ratio));
            }
        }

        months.push(MonthRecord {
            month,
            revenue,
            cogs,
            ebit,
            interest_expense: debt_service.interest_expense,
            ebit_after_interest,
            ebit_after_tax,
            ar: components.ar,
            inventory: components.inventory,
            ap: components.ap,
            wc,
            delta_wc,
            delta_ar,
            delta_inventory,
            delta_ap,
            fcf,
            principal_payment: debt_service.principal_payment,
            fcf_after_debt,
            debt_balance: debt_service.remaining_balance,
            dscr,
            cash_balance,
            ccc,
            gross_margin,
            current_ratio: metrics.current_ratio,
            quick_ratio: metrics.quick_ratio,
            days_cash_on_hand: metrics.days_cash_on_hand,
            operating_margin: metrics.operating_margin,
        });

        // Advance carry-forward state
        prior_wc = wc;
        prior_ar = components.ar;
        prior_inventory = components.inventory;
        prior_ap = components.ap;
    }

    if let Some(m) = cogs_cap_month {
        warnings.push(format!(
            "COGS ratio reached the 95% cap at month {m} and is clamped from there on"
        ));
    }
    if let Some(m) = first_cash_deficit_month {
        warnings.push(format!("Cash balance turns negative at month {m}"));
    }
    if let Some((m, ratio)) = low_dscr {
        warnings.push(format!(
            "DSCR {ratio:.2} falls below the {DSCR_MINIMUM:.1} coverage minimum at month {m}"
        ));
    }

    let summary = ProjectionSummary {
        total_months: num_months,
        ccc,
        final_cash_balance: cash_balance,
        lowest_cash_balance: lowest_cash,
        first_cash_deficit_month,
        cumulative_fcf,
        ending_debt_balance,
        minimum_dscr,
    };

    let output = ProjectionOutput { months, summary };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Monthly Cash Flow Projection with Working Capital and Debt Service",
        &RunAssumptions {
            inputs,
            num_months,
            debt,
        },
        warnings,
        elapsed,
        output,
    ))
}

/// Compound a baseline driver out to `month` at a monthly growth rate,
/// failing on the growth field instead of panicking once the series escapes
/// the supported range.
fn compound(base: Money, rate: Rate, month: u32, field: &str) -> CashflowResult<Money> {
    (Decimal::ONE + rate)
        .checked_powi(month as i64)
        .and_then(|factor| base.checked_mul(factor))
        .filter(|value| *value <= COMPOUNDED_DRIVER_CAP)
        .ok_or_else(|| CashflowError::InvalidInput {
            field: field.into(),
            reason: format!("Compounded growth leaves the supported range at month {month}"),
        })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(inputs: &ProjectionInputs, num_months: u32) -> CashflowResult<()> {
    if num_months == 0 || num_months > MAX_PROJECTION_MONTHS {
        return Err(CashflowError::InvalidInput {
            field: "num_months".into(),
            reason: format!(
                "Must be between 1 and {MAX_PROJECTION_MONTHS} months, got {num_months}"
            ),
        });
    }

    validate_rate("cogs_pct", inputs.cogs_pct)?;
    validate_rate("tax_rate", inputs.tax_rate)?;

    validate_money("revenue", inputs.revenue)?;
    validate_money("opex", inputs.opex)?;
    validate_money("capex", inputs.capex)?;
    validate_money("depreciation", inputs.depreciation)?;
    validate_money("opening_cash", inputs.opening_cash)?;

    validate_days("ar_days", inputs.ar_days)?;
    validate_days("ap_days", inputs.ap_days)?;
    validate_days("inventory_days", inputs.inventory_days)?;

    validate_growth("price_increase", inputs.price_increase)?;
    validate_growth("cogs_increase", inputs.cogs_increase)?;
    validate_growth("opex_increase", inputs.opex_increase)?;

    Ok(())
}

fn validate_rate(field: &str, value: Rate) -> CashflowResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(CashflowError::InvalidInput {
            field: field.into(),
            reason: format!("Rate must be between 0 and 1, got {value}"),
        });
    }
    Ok(())
}

fn validate_money(field: &str, value: Money) -> CashflowResult<()> {
    if value < Decimal::ZERO {
        return Err(CashflowError::InvalidInput {
            field: field.into(),
            reason: format!("Value must be non-negative, got {value}"),
        });
    }
    if value > MAX_MONEY_INPUT {
        return Err(CashflowError::InvalidInput {
            field: field.into(),
            reason: format!("Value must not exceed {MAX_MONEY_INPUT}, got {value}"),
        });
    }
    Ok(())
}

fn validate_days(field: &str, value: u32) -> CashflowResult<()> {
    if value > MAX_DAY_TERMS {
        return Err(CashflowError::InvalidInput {
            field: field.into(),
            reason: format!("Day terms must be {MAX_DAY_TERMS} days or fewer, got {value}"),
        });
    }
    Ok(())
}

fn validate_growth(field: &str, value: Rate) -> CashflowResult<()> {
    if value <= dec!(-1) {
        return Err(CashflowError::InvalidInput {
            field: field.into(),
            reason: format!("Growth must be greater than -100%, got {value}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
