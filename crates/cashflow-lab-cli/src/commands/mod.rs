pub mod compare;
pub mod export;
pub mod growth;
pub mod project;
pub mod templates;

use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cashflow_lab_core::debt::DebtParameters;
use cashflow_lab_core::projection::ProjectionInputs;
use cashflow_lab_core::scenario::ScenarioKind;
use cashflow_lab_core::CashflowResult;

use crate::input;

const DEFAULT_NUM_MONTHS: u32 = 12;

/// Loan terms as they appear in input files and templates. The monthly
/// payment is derived from the annuity formula unless the record carries
/// its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebtSpec {
    pub loan_amount: Decimal,
    pub interest_rate: Decimal,
    pub term_months: u32,
    #[serde(default)]
    pub monthly_payment: Option<Decimal>,
}

impl DebtSpec {
    pub fn into_parameters(self) -> CashflowResult<DebtParameters> {
        match self.monthly_payment {
            Some(monthly_payment) => Ok(DebtParameters {
                loan_amount: self.loan_amount,
                interest_rate: self.interest_rate,
                term_months: self.term_months,
                monthly_payment,
            }),
            None => DebtParameters::new(self.loan_amount, self.interest_rate, self.term_months),
        }
    }
}

/// One full run request as carried by input files, piped JSON, and
/// templates: the business parameters plus optional loan and horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionRequest {
    #[serde(flatten)]
    pub inputs: ProjectionInputs,
    #[serde(default)]
    pub debt: Option<DebtSpec>,
    #[serde(default)]
    pub num_months: Option<u32>,
}

/// Business parameters shared by every projection-running subcommand.
#[derive(Args)]
pub struct BusinessArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Start from a built-in template (see `cfl templates`)
    #[arg(long)]
    pub template: Option<String>,

    /// Projection horizon in months
    #[arg(long)]
    pub months: Option<u32>,

    /// Baseline monthly revenue
    #[arg(long)]
    pub revenue: Option<Decimal>,

    /// COGS as a fraction of revenue (0.60 = 60%)
    #[arg(long)]
    pub cogs_pct: Option<Decimal>,

    /// Monthly growth of the COGS ratio
    #[arg(long, allow_hyphen_values = true)]
    pub cogs_increase: Option<Decimal>,

    /// Baseline monthly operating expenses
    #[arg(long)]
    pub opex: Option<Decimal>,

    /// Monthly OPEX inflation
    #[arg(long, allow_hyphen_values = true)]
    pub opex_increase: Option<Decimal>,

    /// Corporate tax rate (0.25 = 25%)
    #[arg(long)]
    pub tax_rate: Option<Decimal>,

    /// Days of revenue outstanding as receivables
    #[arg(long)]
    pub ar_days: Option<u32>,

    /// Days of cost financed by suppliers
    #[arg(long)]
    pub ap_days: Option<u32>,

    /// Days of cost held as stock
    #[arg(long)]
    pub inventory_days: Option<u32>,

    /// Monthly capital expenditure
    #[arg(long)]
    pub capex: Option<Decimal>,

    /// Monthly depreciation add-back
    #[arg(long)]
    pub depreciation: Option<Decimal>,

    /// Monthly revenue growth (0.02 = 2%)
    #[arg(long, allow_hyphen_values = true)]
    pub price_increase: Option<Decimal>,

    /// Cash on hand at month 0
    #[arg(long)]
    pub opening_cash: Option<Decimal>,

    /// Loan principal (needs --interest-rate and --term-months)
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Annual loan interest rate (0.06 = 6%)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Loan term in months
    #[arg(long)]
    pub term_months: Option<u32>,
}

/// Fully resolved run: business inputs, optional loan, horizon.
pub struct ResolvedRun {
    pub inputs: ProjectionInputs,
    pub debt: Option<DebtParameters>,
    pub num_months: u32,
}

/// Resolve the run request: input file first, then piped stdin, then a
/// template, then individual flags. `--months` and the loan flags override
/// whatever the source carries.
pub fn resolve_run(args: &BusinessArgs) -> Result<ResolvedRun, Box<dyn std::error::Error>> {
    let request: ProjectionRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(piped) = input::stdin::read_piped()? {
        piped
    } else if let Some(ref name) = args.template {
        crate::templates::by_key(name)
            .ok_or_else(|| {
                format!(
                    "Unknown template '{}'. Available templates: {}",
                    name,
                    crate::templates::KEYS.join(", ")
                )
            })?
            .request
    } else {
        ProjectionRequest {
            inputs: ProjectionInputs {
                revenue: args
                    .revenue
                    .ok_or("--revenue is required (or provide --input)")?,
                cogs_pct: args
                    .cogs_pct
                    .ok_or("--cogs-pct is required (or provide --input)")?,
                cogs_increase: args.cogs_increase.unwrap_or_default(),
                opex: args.opex.ok_or("--opex is required (or provide --input)")?,
                opex_increase: args.opex_increase.unwrap_or_default(),
                tax_rate: args
                    .tax_rate
                    .ok_or("--tax-rate is required (or provide --input)")?,
                ar_days: args
                    .ar_days
                    .ok_or("--ar-days is required (or provide --input)")?,
                ap_days: args
                    .ap_days
                    .ok_or("--ap-days is required (or provide --input)")?,
                inventory_days: args
                    .inventory_days
                    .ok_or("--inventory-days is required (or provide --input)")?,
                capex: args.capex.ok_or("--capex is required (or provide --input)")?,
                depreciation: args
                    .depreciation
                    .ok_or("--depreciation is required (or provide --input)")?,
                price_increase: args.price_increase.unwrap_or_default(),
                opening_cash: args.opening_cash.unwrap_or_default(),
            },
            debt: None,
            num_months: None,
        }
    };

    let debt_spec = match (args.loan_amount, args.interest_rate, args.term_months) {
        (None, None, None) => request.debt,
        (Some(loan_amount), Some(interest_rate), Some(term_months)) => Some(DebtSpec {
            loan_amount,
            interest_rate,
            term_months,
            monthly_payment: None,
        }),
        _ => {
            return Err(
                "--loan-amount, --interest-rate, and --term-months must be provided together"
                    .into(),
            )
        }
    };

    let debt = debt_spec.map(DebtSpec::into_parameters).transpose()?;
    let num_months = args
        .months
        .or(request.num_months)
        .unwrap_or(DEFAULT_NUM_MONTHS);

    Ok(ResolvedRun {
        inputs: request.inputs,
        debt,
        num_months,
    })
}

/// Map scenario names from the command line to kinds.
pub fn parse_scenarios(
    names: &[String],
) -> Result<Vec<ScenarioKind>, Box<dyn std::error::Error>> {
    names.iter().map(|name| parse_scenario(name)).collect()
}

fn parse_scenario(name: &str) -> Result<ScenarioKind, Box<dyn std::error::Error>> {
    match name.to_lowercase().as_str() {
        "base" => Ok(ScenarioKind::Base),
        "conservative" => Ok(ScenarioKind::Conservative),
        "aggressive" => Ok(ScenarioKind::Aggressive),
        other => Err(format!(
            "Unknown scenario '{}'. Available scenarios: base, conservative, aggressive",
            other
        )
        .into()),
    }
}
