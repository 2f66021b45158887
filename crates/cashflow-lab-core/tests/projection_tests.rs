use cashflow_lab_core::debt::DebtParameters;
use cashflow_lab_core::projection::{build_monthly_projection, ProjectionInputs};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

// ===========================================================================
// Fixtures
// ===========================================================================

/// A distributor at steady state: 100k/month revenue, 60% COGS, paid in 45
/// days, paying in 30, carrying 60 days of stock.
fn distributor() -> ProjectionInputs {
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

/// Services business with nothing on the shelf and little owed to suppliers.
fn services_firm() -> ProjectionInputs {
    ProjectionInputs {
        revenue: dec!(80000),
        cogs_pct: dec!(0.30),
        cogs_increase: Decimal::ZERO,
        opex: dec!(35000),
        opex_increase: Decimal::ZERO,
        tax_rate: dec!(0.21),
        ar_days: 30,
        ap_days: 15,
        inventory_days: 0,
        capex: dec!(2000),
        depreciation: dec!(1500),
        price_increase: dec!(0.03),
        opening_cash: dec!(50000),
    }
}

// ===========================================================================
// Baseline month and ratios
// ===========================================================================

#[test]
fn test_baseline_month_balances_and_ratios() {
    let output = build_monthly_projection(&distributor(), 12, None).unwrap();
    let m0 = &output.result.months[0];

    // 1.5 months of revenue in AR, 2 months of cost on the shelf, 1 month
    // of cost owed to suppliers
    assert_eq!(m0.ar, dec!(150000));
    assert_eq!(m0.inventory, dec!(120000));
    assert_eq!(m0.ap, dec!(60000));
    assert_eq!(m0.wc, dec!(210000));

    // CA = 150k + 120k + 100k cash = 370k over AP
    assert_eq!(m0.current_ratio, dec!(370000) / dec!(60000));
    assert_eq!(m0.quick_ratio, dec!(250000) / dec!(60000));

    // 100k cash / 20k OPEX * 30 days
    assert_eq!(m0.days_cash_on_hand, dec!(150));
    assert_eq!(m0.operating_margin, dec!(20));
    assert_eq!(m0.gross_margin, dec!(40));
}

#[test]
fn test_zero_inventory_collapses_quick_into_current() {
    let output = build_monthly_projection(&services_firm(), 12, None).unwrap();

    for record in &output.result.months {
        assert_eq!(record.inventory, Decimal::ZERO);
        assert_eq!(record.delta_inventory, Decimal::ZERO);
        assert_eq!(
            record.quick_ratio, record.current_ratio,
            "nothing to strip out at month {}",
            record.month
        );
    }

    // CCC with no stock is just the payment-terms gap
    assert_eq!(output.result.summary.ccc, 15);
}

// ===========================================================================
// Growth and the cash lifecycle
// ===========================================================================

#[test]
fn test_yearlong_growth_run_compounds_and_reconciles() {
    let inputs = distributor();
    let output = build_monthly_projection(&inputs, 12, None).unwrap();
    let months = &output.result.months;

    // 100k * 1.1^12 at the end of the year
    let expected_final_revenue = dec!(100000) * dec!(1.1).powi(12);
    assert_eq!(months[12].revenue, expected_final_revenue);

    // Cash walks forward one month at a time from the opening balance
    let mut cash = inputs.opening_cash;
    for record in &months[1..] {
        cash += record.fcf_after_debt;
        assert_eq!(record.cash_balance, cash, "walk diverged at month {}", record.month);
    }
    assert_eq!(output.result.summary.final_cash_balance, cash);
}

#[test]
fn test_negative_working_capital_releases_cash_under_growth() {
    // Supplier-financed retailer: collects fast, pays slow
    let mut inputs = distributor();
    inputs.ar_days = 10;
    inputs.inventory_days = 5;
    inputs.ap_days = 60;

    let output = build_monthly_projection(&inputs, 6, None).unwrap();
    let months = &output.result.months;

    // (10 + 0.6*5 - 0.6*60) / 30 of monthly revenue, below zero
    assert!(months[0].wc < Decimal::ZERO);
    assert_eq!(output.result.summary.ccc, -45);

    // Growing the float is a cash source, so every growth month's delta
    // pushes FCF up instead of down
    for record in &months[1..] {
        assert!(record.delta_wc < Decimal::ZERO, "month {}", record.month);
        let fcf_before_wc = record.ebit_after_interest * dec!(0.75)
            + inputs.depreciation
            - inputs.capex;
        assert!(record.fcf > fcf_before_wc);
    }
}

#[test]
fn test_engine_is_stateless_across_runs() {
    let inputs = distributor();
    let loan = DebtParameters::new(dec!(50000), dec!(0.06), 60).unwrap();

    let first = build_monthly_projection(&inputs, 24, Some(&loan)).unwrap();
    let second = build_monthly_projection(&inputs, 24, Some(&loan)).unwrap();

    // Nothing carries over between calls; identical inputs give identical
    // series
    assert_eq!(
        serde_json::to_value(&first.result).unwrap(),
        serde_json::to_value(&second.result).unwrap()
    );
}

// ===========================================================================
// Debt across its full life
// ===========================================================================

#[test]
fn test_loan_retires_inside_a_longer_projection() {
    // 12-month interest-free loan inside an 18-month run
    let inputs = distributor();
    let loan = DebtParameters::new(dec!(24000), Decimal::ZERO, 12).unwrap();
    let output = build_monthly_projection(&inputs, 18, Some(&loan)).unwrap();
    let months = &output.result.months;

    assert_eq!(months[0].debt_balance, dec!(24000), "undrawn at the baseline");

    for record in &months[1..=12] {
        assert_eq!(record.principal_payment, dec!(2000));
        assert_eq!(record.interest_expense, Decimal::ZERO);
        assert_eq!(
            record.debt_balance,
            dec!(24000) - dec!(2000) * Decimal::from(record.month - 1),
            "linear paydown at month {}",
            record.month
        );
        assert!(record.dscr.is_some());
    }

    for record in &months[13..] {
        assert_eq!(record.principal_payment, Decimal::ZERO);
        assert_eq!(record.interest_expense, Decimal::ZERO);
        assert_eq!(record.debt_balance, Decimal::ZERO);
        assert_eq!(record.dscr, None);
        assert_eq!(record.fcf, record.fcf_after_debt);
    }

    assert_eq!(output.result.summary.ending_debt_balance, Decimal::ZERO);
}

#[test]
fn test_amortizing_loan_splits_service_and_tracks_coverage() {
    let inputs = distributor();
    let loan = DebtParameters::new(dec!(50000), dec!(0.06), 60).unwrap();
    let output = build_monthly_projection(&inputs, 12, Some(&loan)).unwrap();
    let months = &output.result.months;

    // First month: interest on the full principal at 0.5%/month
    assert_eq!(months[1].interest_expense, dec!(250));
    assert_eq!(
        months[1].principal_payment,
        loan.monthly_payment - dec!(250)
    );

    // The split drifts toward principal as the balance falls
    assert!(months[12].interest_expense < months[1].interest_expense);
    assert!(months[12].principal_payment > months[1].principal_payment);

    // Coverage is FCF over the level payment, every serviced month
    for record in &months[1..] {
        let total = record.interest_expense + record.principal_payment;
        assert_eq!(record.dscr, Some(record.fcf / total));
    }

    let min_dscr = months[1..]
        .iter()
        .filter_map(|m| m.dscr)
        .min()
        .unwrap();
    assert_eq!(output.result.summary.minimum_dscr, Some(min_dscr));
}

#[test]
fn test_interest_reduces_profit_but_not_ebit() {
    let inputs = distributor();
    let loan = DebtParameters::new(dec!(50000), dec!(0.06), 60).unwrap();

    let unlevered = build_monthly_projection(&inputs, 6, None).unwrap();
    let levered = build_monthly_projection(&inputs, 6, Some(&loan)).unwrap();

    for (u, l) in unlevered.result.months[1..]
        .iter()
        .zip(levered.result.months[1..].iter())
    {
        assert_eq!(u.ebit, l.ebit, "EBIT sits above the financing line");
        assert!(l.ebit_after_interest < u.ebit_after_interest);
        assert!(l.fcf < u.fcf);
    }
}
