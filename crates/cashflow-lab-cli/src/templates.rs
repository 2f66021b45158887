//! Built-in starting points for common business profiles. Each template is
//! a complete run request, so `templates --show <key>` output can be saved
//! and passed back through `--input` unchanged.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use cashflow_lab_core::projection::ProjectionInputs;

use crate::commands::{DebtSpec, ProjectionRequest};

pub const KEYS: [&str; 4] = ["typical", "retail", "saas", "manufacturing"];

pub struct Template {
    pub key: &'static str,
    pub label: &'static str,
    pub request: ProjectionRequest,
}

pub fn catalog() -> Vec<Template> {
    vec![
        Template {
            key: "typical",
            label: "Typical Business",
            request: request(
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
                    capex: dec!(3000),
                    depreciation: dec!(3000),
                    price_increase: dec!(0.02),
                    opening_cash: dec!(100000),
                },
                DebtSpec {
                    loan_amount: dec!(50000),
                    interest_rate: dec!(0.06),
                    term_months: 60,
                    monthly_payment: None,
                },
            ),
        },
        Template {
            key: "retail",
            label: "Retail Store",
            request: request(
                ProjectionInputs {
                    revenue: dec!(150000),
                    cogs_pct: dec!(0.65),
                    cogs_increase: Decimal::ZERO,
                    opex: dec!(30000),
                    opex_increase: Decimal::ZERO,
                    tax_rate: dec!(0.25),
                    ar_days: 15,
                    ap_days: 30,
                    inventory_days: 90,
                    capex: dec!(3000),
                    depreciation: dec!(3000),
                    price_increase: dec!(0.02),
                    opening_cash: dec!(75000),
                },
                DebtSpec {
                    loan_amount: dec!(50000),
                    interest_rate: dec!(0.065),
                    term_months: 84,
                    monthly_payment: None,
                },
            ),
        },
        Template {
            key: "saas",
            label: "SaaS Startup",
            request: request(
                ProjectionInputs {
                    revenue: dec!(80000),
                    cogs_pct: dec!(0.20),
                    cogs_increase: Decimal::ZERO,
                    opex: dec!(50000),
                    opex_increase: Decimal::ZERO,
                    tax_rate: dec!(0.25),
                    ar_days: 60,
                    ap_days: 30,
                    inventory_days: 0,
                    capex: dec!(5000),
                    depreciation: dec!(5000),
                    price_increase: dec!(0.03),
                    opening_cash: dec!(200000),
                },
                DebtSpec {
                    loan_amount: dec!(100000),
                    interest_rate: dec!(0.08),
                    term_months: 48,
                    monthly_payment: None,
                },
            ),
        },
        Template {
            key: "manufacturing",
            label: "Manufacturing",
            request: request(
                ProjectionInputs {
                    revenue: dec!(250000),
                    cogs_pct: dec!(0.70),
                    cogs_increase: Decimal::ZERO,
                    opex: dec!(35000),
                    opex_increase: Decimal::ZERO,
                    tax_rate: dec!(0.25),
                    ar_days: 60,
                    ap_days: 45,
                    inventory_days: 75,
                    capex: dec!(10000),
                    depreciation: dec!(10000),
                    price_increase: dec!(0.02),
                    opening_cash: dec!(150000),
                },
                DebtSpec {
                    loan_amount: dec!(200000),
                    interest_rate: dec!(0.055),
                    term_months: 120,
                    monthly_payment: None,
                },
            ),
        },
    ]
}

pub fn by_key(name: &str) -> Option<Template> {
    let key = name.to_lowercase();
    catalog().into_iter().find(|t| t.key == key)
}

fn request(inputs: ProjectionInputs, debt: DebtSpec) -> ProjectionRequest {
    ProjectionRequest {
        inputs,
        debt: Some(debt),
        num_months: Some(12),
    }
}
