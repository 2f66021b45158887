use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::debt::DebtParameters;
use crate::error::CashflowError;
use crate::projection::{build_monthly_projection, ProjectionInputs, ProjectionOutput};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::CashflowResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Days added to (conservative) or shaved off (aggressive) collections.
const AR_SHIFT_DAYS: u32 = 10;
/// Supplier terms lost under the conservative posture.
const CONSERVATIVE_AP_CUT_DAYS: u32 = 5;
/// Supplier terms gained under the aggressive posture.
const AGGRESSIVE_AP_GAIN_DAYS: u32 = 10;
const CONSERVATIVE_INVENTORY_SCALE: Decimal = dec!(1.15);
const AGGRESSIVE_INVENTORY_SCALE: Decimal = dec!(0.85);

/// Monthly growth rates swept by the capacity analysis when the caller does
/// not supply a grid.
pub const DEFAULT_GROWTH_RATES: [Decimal; 10] = [
    dec!(0),
    dec!(0.02),
    dec!(0.03),
    dec!(0.04),
    dec!(0.05),
    dec!(0.06),
    dec!(0.08),
    dec!(0.10),
    dec!(0.12),
    dec!(0.15),
];

// ---------------------------------------------------------------------------
// Scenario kinds
// ---------------------------------------------------------------------------

/// Named working-capital postures applied on top of a base parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    /// Unmodified copy of the base parameters
    Base,
    /// Customers pay slower, suppliers squeeze, stock builds up
    Conservative,
    /// Collections tighten, payables stretch, stock runs lean
    Aggressive,
    /// Caller-chosen day terms, replacing the base terms outright
    Custom {
        ar_days: u32,
        ap_days: u32,
        inventory_days: u32,
    },
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScenarioKind::Base => "base",
            ScenarioKind::Conservative => "conservative",
            ScenarioKind::Aggressive => "aggressive",
            ScenarioKind::Custom { .. } => "custom",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// Adjustments
// ---------------------------------------------------------------------------

/// Produce an independent parameter set with the scenario's working-capital
/// posture applied. The base record is never touched, and re-applying a kind
/// to an already-adjusted record compounds rather than converging.
pub fn apply_scenario_adjustments(
    base: &ProjectionInputs,
    kind: &ScenarioKind,
) -> ProjectionInputs {
    let mut adjusted = base.clone();

    match kind {
        ScenarioKind::Base => {}
        ScenarioKind::Conservative => {
            adjusted.ar_days = base.ar_days.saturating_add(AR_SHIFT_DAYS);
            adjusted.ap_days = base.ap_days.saturating_sub(CONSERVATIVE_AP_CUT_DAYS);
            adjusted.inventory_days =
                scale_days(base.inventory_days, CONSERVATIVE_INVENTORY_SCALE);
        }
        ScenarioKind::Aggressive => {
            adjusted.ar_days = base.ar_days.saturating_sub(AR_SHIFT_DAYS);
            adjusted.ap_days = base.ap_days.saturating_add(AGGRESSIVE_AP_GAIN_DAYS);
            adjusted.inventory_days =
                scale_days(base.inventory_days, AGGRESSIVE_INVENTORY_SCALE);
        }
        ScenarioKind::Custom {
            ar_days,
            ap_days,
            inventory_days,
        } => {
            adjusted.ar_days = *ar_days;
            adjusted.ap_days = *ap_days;
            adjusted.inventory_days = *inventory_days;
        }
    }

    adjusted
}

/// Day counts are whole days; scaling truncates toward zero.
fn scale_days(days: u32, factor: Decimal) -> u32 {
    (Decimal::from(days) * factor)
        .trunc()
        .to_u32()
        .unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Scenario comparison
// ---------------------------------------------------------------------------

/// One scenario's adjusted inputs and full projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRun {
    pub name: String,
    pub kind: ScenarioKind,
    pub inputs: ProjectionInputs,
    pub projection: ProjectionOutput,
}

/// Side-by-side row against the base scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparisonRow {
    pub name: String,
    pub ccc: i64,
    pub ccc_vs_base: i64,
    pub final_cash_balance: Money,
    pub cash_vs_base: Money,
    pub total_fcf: Money,
    pub fcf_vs_base: Money,
}

/// Full comparison output: every run plus the summary grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparisonOutput {
    pub runs: Vec<ScenarioRun>,
    pub comparison: Vec<ScenarioComparisonRow>,
}

/// Run the projection once per scenario kind and line the outcomes up
/// against the base case.
///
/// The base scenario is always part of the set (prepended when the caller
/// leaves it out) so the `*_vs_base` columns have a reference point.
pub fn compare_scenarios(
    base_inputs: &ProjectionInputs,
    num_months: u32,
    debt: Option<&DebtParameters>,
    kinds: &[ScenarioKind],
) -> CashflowResult<ComputationOutput<ScenarioComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if kinds.is_empty() {
        return Err(CashflowError::InsufficientData(
            "At least one scenario required".into(),
        ));
    }

    let mut ordered: Vec<ScenarioKind> = kinds.to_vec();
    if !ordered.contains(&ScenarioKind::Base) {
        ordered.insert(0, ScenarioKind::Base);
    }

    let mut runs: Vec<ScenarioRun> = Vec::with_capacity(ordered.len());
    for kind in &ordered {
        let adjusted = apply_scenario_adjustments(base_inputs, kind);
        let projection = build_monthly_projection(&adjusted, num_months, debt)?;

        for w in &projection.warnings {
            warnings.push(format!("{kind}: {w}"));
        }

        runs.push(ScenarioRun {
            name: kind.to_string(),
            kind: kind.clone(),
            inputs: adjusted,
            projection: projection.result,
        });
    }

    let base_idx = ordered
        .iter()
        .position(|k| *k == ScenarioKind::Base)
        .unwrap_or(0);
    let base_ccc = runs[base_idx].projection.summary.ccc;
    let base_cash = runs[base_idx].projection.summary.final_cash_balance;
    let base_fcf = runs[base_idx].projection.summary.cumulative_fcf;

    let comparison = runs
        .iter()
        .map(|run| {
            let summary = &run.projection.summary;
            ScenarioComparisonRow {
                name: run.name.clone(),
                ccc: summary.ccc,
                ccc_vs_base: summary.ccc - base_ccc,
                final_cash_balance: summary.final_cash_balance,
                cash_vs_base: summary.final_cash_balance - base_cash,
                total_fcf: summary.cumulative_fcf,
                fcf_vs_base: summary.cumulative_fcf - base_fcf,
            }
        })
        .collect();

    let output = ScenarioComparisonOutput { runs, comparison };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Working Capital Scenario Comparison",
        &serde_json::json!({
            "num_scenarios": ordered.len(),
            "num_months": num_months,
            "has_debt": debt.is_some(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Growth capacity
// ---------------------------------------------------------------------------

/// Outcome of one growth rate in the capacity sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthRunway {
    pub growth_rate: Rate,
    pub lowest_cash_balance: Money,
    pub first_cash_deficit_month: Option<u32>,
    /// Months survivable at this rate: the full horizon, or the month before
    /// cash first goes negative
    pub runway_months: u32,
}

/// Growth sweep results plus the sustainable ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthCapacityOutput {
    pub runways: Vec<GrowthRunway>,
    /// Highest tested rate whose cash balance never dips negative; `None`
    /// when every tested rate (including zero) runs dry
    pub max_sustainable_growth: Option<Rate>,
}

/// Sweep candidate monthly growth rates and find the fastest the business
/// can grow without running out of cash.
///
/// Growth consumes cash through working capital before it returns it through
/// profit, so the ceiling is finite even for profitable parameter sets. Rates
/// are swept in ascending order after deduplication.
pub fn analyze_growth_capacity(
    base_inputs: &ProjectionInputs,
    num_months: u32,
    debt: Option<&DebtParameters>,
    candidate_rates: &[Rate],
) -> CashflowResult<ComputationOutput<GrowthCapacityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if candidate_rates.is_empty() {
        return Err(CashflowError::InsufficientData(
            "At least one candidate growth rate required".into(),
        ));
    }

    let mut rates = candidate_rates.to_vec();
    rates.sort();
    rates.dedup();

    let mut runways: Vec<GrowthRunway> = Vec::with_capacity(rates.len());
    let mut max_sustainable_growth: Option<Rate> = None;

    for rate in rates {
        let mut test_inputs = base_inputs.clone();
        test_inputs.price_increase = rate;

        let projection = build_monthly_projection(&test_inputs, num_months, debt)?;
        let summary = &projection.result.summary;

        let runway_months = match summary.first_cash_deficit_month {
            None => num_months,
            Some(month) => month.saturating_sub(1),
        };

        if summary.lowest_cash_balance >= Decimal::ZERO {
            max_sustainable_growth = Some(rate);
        }

        runways.push(GrowthRunway {
            growth_rate: rate,
            lowest_cash_balance: summary.lowest_cash_balance,
            first_cash_deficit_month: summary.first_cash_deficit_month,
            runway_months,
        });
    }

    if max_sustainable_growth.is_none() {
        warnings.push(
            "No tested growth rate keeps the cash balance positive across the horizon".into(),
        );
    }

    let output = GrowthCapacityOutput {
        runways,
        max_sustainable_growth,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Maximum Sustainable Growth and Cash Runway Analysis",
        &serde_json::json!({
            "num_rates": output.runways.len(),
            "num_months": num_months,
            "has_debt": debt.is_some(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_inputs() -> ProjectionInputs {
        ProjectionInputs {
            revenue: dec!(100000),
            cogs_pct: dec!(0.60),
            cogs_increase: Decimal::ZERO,
            opex: dec!(20000),
            opex_increase: Decimal::ZERO,
            tax_rate: dec!(0.25),
            ar_days: 45,
            ap_days: 30,
            inventory_days: 60,
            capex: dec!(5000),
            depreciation: dec!(4000),
            price_increase: dec!(0.10),
            opening_cash: dec!(100000),
        }
    }

    #[test]
    fn test_conservative_posture() {
        let adjusted = apply_scenario_adjustments(&sample_inputs(), &ScenarioKind::Conservative);

        assert_eq!(adjusted.ar_days, 55, "collections slip 10 days");
        assert_eq!(adjusted.ap_days, 25, "suppliers pull 5 days of terms");
        assert_eq!(adjusted.inventory_days, 69, "stock swells 15%");
    }

    #[test]
    fn test_aggressive_posture() {
        let adjusted = apply_scenario_adjustments(&sample_inputs(), &ScenarioKind::Aggressive);

        assert_eq!(adjusted.ar_days, 35);
        assert_eq!(adjusted.ap_days, 40);
        assert_eq!(adjusted.inventory_days, 51, "60 * 0.85 exactly");
    }

    #[test]
    fn test_base_kind_is_plain_copy() {
        let base = sample_inputs();
        let adjusted = apply_scenario_adjustments(&base, &ScenarioKind::Base);

        assert_eq!(adjusted.ar_days, base.ar_days);
        assert_eq!(adjusted.ap_days, base.ap_days);
        assert_eq!(adjusted.inventory_days, base.inventory_days);
        assert_eq!(adjusted.revenue, base.revenue);
    }

    #[test]
    fn test_custom_kind_replaces_day_terms() {
        let adjusted = apply_scenario_adjustments(
            &sample_inputs(),
            &ScenarioKind::Custom {
                ar_days: 20,
                ap_days: 40,
                inventory_days: 10,
            },
        );

        assert_eq!(adjusted.ar_days, 20);
        assert_eq!(adjusted.ap_days, 40);
        assert_eq!(adjusted.inventory_days, 10);
        assert_eq!(adjusted.revenue, dec!(100000), "only day terms move");
    }

    #[test]
    fn test_day_terms_clamp_at_zero() {
        let mut base = sample_inputs();
        base.ar_days = 5;
        base.ap_days = 3;

        let aggressive = apply_scenario_adjustments(&base, &ScenarioKind::Aggressive);
        assert_eq!(aggressive.ar_days, 0, "cannot collect in negative days");

        let conservative = apply_scenario_adjustments(&base, &ScenarioKind::Conservative);
        assert_eq!(conservative.ap_days, 0);
    }

    #[test]
    fn test_scaled_inventory_truncates_to_whole_days() {
        let mut base = sample_inputs();
        base.inventory_days = 3;

        let aggressive = apply_scenario_adjustments(&base, &ScenarioKind::Aggressive);
        assert_eq!(aggressive.inventory_days, 2, "3 * 0.85 = 2.55 truncates");

        base.inventory_days = 1;
        let aggressive = apply_scenario_adjustments(&base, &ScenarioKind::Aggressive);
        assert_eq!(aggressive.inventory_days, 0);
    }

    #[test]
    fn test_reapplying_adjustments_compounds() {
        let base = sample_inputs();
        let once = apply_scenario_adjustments(&base, &ScenarioKind::Conservative);
        let twice = apply_scenario_adjustments(&once, &ScenarioKind::Conservative);

        // Offsets stack relative to whatever they are applied to; the second
        // application moves the terms again rather than converging
        assert_eq!(twice.ar_days, 65);
        assert_eq!(twice.ap_days, 20);
        assert_eq!(twice.inventory_days, 79, "69 * 1.15 = 79.35 truncates");

        assert_ne!(twice.ar_days, once.ar_days);
    }

    #[test]
    fn test_comparison_always_carries_base() {
        let output = compare_scenarios(
            &sample_inputs(),
            12,
            None,
            &[ScenarioKind::Conservative, ScenarioKind::Aggressive],
        )
        .unwrap();
        let result = &output.result;

        assert_eq!(result.runs.len(), 3);
        assert_eq!(result.runs[0].name, "base");
        assert_eq!(result.comparison[0].cash_vs_base, Decimal::ZERO);
        assert_eq!(result.comparison[0].fcf_vs_base, Decimal::ZERO);
    }

    #[test]
    fn test_comparison_orders_postures_around_base() {
        let output = compare_scenarios(
            &sample_inputs(),
            12,
            None,
            &[ScenarioKind::Conservative, ScenarioKind::Aggressive],
        )
        .unwrap();
        let rows = &output.result.comparison;

        let base = &rows[0];
        let conservative = &rows[1];
        let aggressive = &rows[2];

        // Conservative ties up more cash in working capital, aggressive
        // releases it
        assert!(conservative.final_cash_balance < base.final_cash_balance);
        assert!(aggressive.final_cash_balance > base.final_cash_balance);
        assert!(conservative.cash_vs_base < Decimal::ZERO);
        assert!(aggressive.cash_vs_base > Decimal::ZERO);

        // CCC moves with the day terms: 55 + 69 - 25 and 35 + 51 - 40
        assert_eq!(conservative.ccc, 99);
        assert_eq!(aggressive.ccc, 46);
        assert_eq!(conservative.ccc_vs_base, 24);
        assert_eq!(aggressive.ccc_vs_base, -29);
    }

    #[test]
    fn test_comparison_row_arithmetic_is_consistent() {
        let output = compare_scenarios(
            &sample_inputs(),
            6,
            None,
            &[ScenarioKind::Base, ScenarioKind::Conservative],
        )
        .unwrap();
        let result = &output.result;

        let base_cash = result.comparison[0].final_cash_balance;
        for (row, run) in result.comparison.iter().zip(result.runs.iter()) {
            assert_eq!(row.final_cash_balance, run.projection.summary.final_cash_balance);
            assert_eq!(row.cash_vs_base, row.final_cash_balance - base_cash);
            assert_eq!(row.total_fcf, run.projection.summary.cumulative_fcf);
        }
    }

    #[test]
    fn test_empty_scenario_list_rejected() {
        let result = compare_scenarios(&sample_inputs(), 12, None, &[]);
        match result.unwrap_err() {
            CashflowError::InsufficientData(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_growth_capacity_finds_the_ceiling() {
        let output = analyze_growth_capacity(
            &sample_inputs(),
            12,
            None,
            &DEFAULT_GROWTH_RATES,
        )
        .unwrap();
        let result = &output.result;

        assert_eq!(result.runways.len(), DEFAULT_GROWTH_RATES.len());
        assert_eq!(
            result.max_sustainable_growth,
            Some(dec!(0.12)),
            "12%/mo holds for a year on these terms; 15%/mo runs dry"
        );

        // Zero growth never strains working capital here
        let flat = &result.runways[0];
        assert_eq!(flat.growth_rate, Decimal::ZERO);
        assert_eq!(flat.first_cash_deficit_month, None);
        assert_eq!(flat.runway_months, 12);

        // 15%/mo ties up cash faster than profit replaces it
        let hot = result
            .runways
            .iter()
            .find(|r| r.growth_rate == dec!(0.15))
            .expect("0.15 is in the default grid");
        assert_eq!(hot.first_cash_deficit_month, Some(11));
        assert_eq!(hot.runway_months, 10);
        assert!(hot.lowest_cash_balance < Decimal::ZERO);
    }

    #[test]
    fn test_growth_capacity_sorts_and_dedups_rates() {
        let output = analyze_growth_capacity(
            &sample_inputs(),
            6,
            None,
            &[dec!(0.05), dec!(0), dec!(0.05), dec!(0.02)],
        )
        .unwrap();
        let rates: Vec<Rate> = output
            .result
            .runways
            .iter()
            .map(|r| r.growth_rate)
            .collect();

        assert_eq!(rates, vec![dec!(0), dec!(0.02), dec!(0.05)]);
    }

    #[test]
    fn test_growth_capacity_when_nothing_is_sustainable() {
        // CapEx outruns NOPAT plus depreciation, so even a flat business
        // bleeds cash from month 1
        let mut inputs = sample_inputs();
        inputs.capex = dec!(25000);
        inputs.opening_cash = dec!(1000);
        inputs.price_increase = Decimal::ZERO;

        let output =
            analyze_growth_capacity(&inputs, 12, None, &[dec!(0), dec!(0.05)]).unwrap();

        assert_eq!(output.result.max_sustainable_growth, None);
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("No tested growth rate")));
    }

    #[test]
    fn test_growth_capacity_requires_rates() {
        let result = analyze_growth_capacity(&sample_inputs(), 12, None, &[]);
        assert!(result.is_err());
    }
}
