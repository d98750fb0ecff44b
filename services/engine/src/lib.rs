//! Trading engine
//!
//! Pure, synchronous accounting core: calculation primitives, the CFD
//! position model, portfolio aggregation with invariant checks, the
//! ordered order-validation pipeline, and risk/liquidation decisions.
//! Everything here operates on state passed in by the caller; all async
//! coordination (lanes, persistence, scheduling) lives in the service
//! crates above.

pub mod calc;
pub mod cfd;
pub mod portfolio;
pub mod risk;
pub mod stats;
pub mod trading;
pub mod validator;

use thiserror::Error;
use types::errors::{CalcError, ConsistencyError};

/// Internal engine failure.
///
/// Validation rejections are values on the execution result, never
/// errors; anything surfacing here is the `internal_consistency` class
/// and disqualifies the participant.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("calculation error: {0}")]
    Calc(#[from] CalcError),

    #[error("accounting invariant violated: {0}")]
    Consistency(#[from] ConsistencyError),
}
