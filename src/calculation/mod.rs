//! Calculation records and the operation registry behind them.
//!
//! `operation` is the pure mapping from a type tag to arithmetic; `service`
//! owns the record lifecycle and delegates every computation back to it.

pub mod model;
pub mod operation;
pub mod service;

pub use model::{Calculation, CalculationPatch, CalculationView, NewCalculation};
pub use operation::{compute, resolve, validate, CalculationType, Operation, OperationError, OperationTag};
pub use service::{CalculationError, CalculationService};
