use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Supported calculation types. Wire tags are the exact variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalculationType {
    Add,
    Sub,
    Multiply,
    Divide,
}

impl CalculationType {
    pub const ALL: [CalculationType; 4] = [
        CalculationType::Add,
        CalculationType::Sub,
        CalculationType::Multiply,
        CalculationType::Divide,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CalculationType::Add => "Add",
            CalculationType::Sub => "Sub",
            CalculationType::Multiply => "Multiply",
            CalculationType::Divide => "Divide",
        }
    }
}

impl fmt::Display for CalculationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CalculationType {
    type Err = OperationError;

    /// Case-sensitive: "add" is not "Add".
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        CalculationType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == tag)
            .ok_or_else(|| OperationError::InvalidOperationType(tag.to_string()))
    }
}

/// Operation registry errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperationError {
    #[error("Invalid operation type: {0}. Must be one of Add, Sub, Multiply, Divide")]
    InvalidOperationType(String),

    #[error("Cannot divide by zero")]
    DivisionByZero,
}

/// Anything that names a calculation type: the enum itself or its string tag.
pub trait OperationTag {
    fn to_calculation_type(&self) -> Result<CalculationType, OperationError>;
}

impl OperationTag for CalculationType {
    fn to_calculation_type(&self) -> Result<CalculationType, OperationError> {
        Ok(*self)
    }
}

impl OperationTag for str {
    fn to_calculation_type(&self) -> Result<CalculationType, OperationError> {
        self.parse()
    }
}

impl OperationTag for String {
    fn to_calculation_type(&self) -> Result<CalculationType, OperationError> {
        self.as_str().parse()
    }
}

impl<T: OperationTag + ?Sized> OperationTag for &T {
    fn to_calculation_type(&self) -> Result<CalculationType, OperationError> {
        (**self).to_calculation_type()
    }
}

/// A resolved binary operation over `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    kind: CalculationType,
}

impl Operation {
    pub fn kind(&self) -> CalculationType {
        self.kind
    }

    /// Apply the operation. Only an exact-zero divisor is guarded; everything
    /// else follows IEEE-754.
    pub fn apply(&self, a: f64, b: f64) -> Result<f64, OperationError> {
        match self.kind {
            CalculationType::Add => Ok(a + b),
            CalculationType::Sub => Ok(a - b),
            CalculationType::Multiply => Ok(a * b),
            CalculationType::Divide => {
                ensure_divisor(b)?;
                Ok(a / b)
            }
        }
    }
}

/// Resolve a calculation type (or its tag) to its operation.
pub fn resolve<T: OperationTag + ?Sized>(tag: &T) -> Result<Operation, OperationError> {
    let kind = tag.to_calculation_type()?;
    Ok(Operation { kind })
}

/// Resolve and apply in one step.
pub fn compute<T: OperationTag + ?Sized>(tag: &T, a: f64, b: f64) -> Result<f64, OperationError> {
    resolve(tag)?.apply(a, b)
}

/// Check the divisor rule for a (type, b) pair without computing anything.
pub fn validate(kind: CalculationType, b: f64) -> Result<(), OperationError> {
    match kind {
        CalculationType::Divide => ensure_divisor(b),
        CalculationType::Add | CalculationType::Sub | CalculationType::Multiply => Ok(()),
    }
}

fn ensure_divisor(b: f64) -> Result<(), OperationError> {
    // -0.0 == 0.0, so both zeros are rejected
    if b == 0.0 {
        return Err(OperationError::DivisionByZero);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_each_type() {
        assert_eq!(compute(&CalculationType::Add, 10.0, 5.0).unwrap(), 15.0);
        assert_eq!(compute(&CalculationType::Sub, 10.0, 5.0).unwrap(), 5.0);
        assert_eq!(compute(&CalculationType::Multiply, 7.0, 6.0).unwrap(), 42.0);
        assert_eq!(compute(&CalculationType::Divide, 20.0, 4.0).unwrap(), 5.0);
    }

    #[test]
    fn divide_by_zero_is_rejected() {
        assert_eq!(
            compute(&CalculationType::Divide, 5.0, 0.0),
            Err(OperationError::DivisionByZero)
        );
        assert_eq!(
            compute(&CalculationType::Divide, 5.0, -0.0),
            Err(OperationError::DivisionByZero)
        );
    }

    #[test]
    fn divide_matches_ieee_division() {
        for (a, b) in [(1.0, 3.0), (-7.5, 2.5), (0.0, 9.0), (1e300, 1e-10)] {
            assert_eq!(compute(&CalculationType::Divide, a, b).unwrap(), a / b);
        }
    }

    #[test]
    fn add_and_multiply_commute() {
        for (a, b) in [(1.5, -2.0), (100.0, 0.25), (-3.0, -4.0)] {
            assert_eq!(
                compute(&CalculationType::Add, a, b).unwrap(),
                compute(&CalculationType::Add, b, a).unwrap()
            );
            assert_eq!(
                compute(&CalculationType::Multiply, a, b).unwrap(),
                compute(&CalculationType::Multiply, b, a).unwrap()
            );
        }
    }

    #[test]
    fn sub_is_anti_commutative() {
        for (a, b) in [(10.0, 4.0), (-2.5, 8.0), (0.0, 3.0)] {
            assert_eq!(
                compute(&CalculationType::Sub, a, b).unwrap(),
                -compute(&CalculationType::Sub, b, a).unwrap()
            );
        }
    }

    #[test]
    fn resolves_string_tags() {
        assert_eq!(resolve("Multiply").unwrap().kind(), CalculationType::Multiply);
        assert_eq!(compute("Add", 2.0, 3.0).unwrap(), 5.0);
        assert_eq!(compute(&"Divide".to_string(), 9.0, 3.0).unwrap(), 3.0);
    }

    #[test]
    fn unknown_tags_name_the_offender() {
        let err = resolve("Modulo").unwrap_err();
        assert_eq!(err, OperationError::InvalidOperationType("Modulo".to_string()));
        assert!(err.to_string().contains("Modulo"));

        // exact, case-sensitive match
        assert!(matches!(
            resolve("add"),
            Err(OperationError::InvalidOperationType(tag)) if tag == "add"
        ));
    }

    #[test]
    fn validate_only_guards_divide() {
        assert!(validate(CalculationType::Divide, 0.0).is_err());
        assert!(validate(CalculationType::Divide, 0.5).is_ok());
        assert!(validate(CalculationType::Add, 0.0).is_ok());
        assert!(validate(CalculationType::Multiply, 0.0).is_ok());
    }

    #[test]
    fn tags_round_trip_through_display() {
        for kind in CalculationType::ALL {
            assert_eq!(kind.to_string().parse::<CalculationType>().unwrap(), kind);
        }
    }
}
