pub mod debt;
pub mod error;
pub mod metrics;
pub mod projection;
pub mod scenario;
pub mod types;
pub mod working_capital;

pub use error::CashflowError;
pub use types::*;

/// Standard result type for all cashflow-lab operations
pub type CashflowResult<T> = Result<T, CashflowError>;
