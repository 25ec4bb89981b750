use serde::{Deserialize, Serialize};

use super::operation::CalculationType;
use crate::types::{CalculationId, UserId};

/// A stored calculation. There is no result field: it is derived
/// from (a, b, type) on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub id: CalculationId,
    pub a: f64,
    pub b: f64,
    #[serde(rename = "type")]
    pub kind: CalculationType,
    pub user_id: Option<UserId>,
}

impl Calculation {
    /// Overlay the fields present in `patch`; absent fields keep their value.
    pub fn apply(&mut self, patch: &CalculationPatch) {
        if let Some(a) = patch.a {
            self.a = a;
        }
        if let Some(b) = patch.b {
            self.b = b;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
    }

    /// Whether this record is visible to `owner`. `None` means unscoped.
    pub fn is_visible_to(&self, owner: Option<UserId>) -> bool {
        match owner {
            Some(owner) => self.user_id == Some(owner),
            None => true,
        }
    }
}

/// A validated calculation that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCalculation {
    pub a: f64,
    pub b: f64,
    pub kind: CalculationType,
    pub user_id: Option<UserId>,
}

/// Sparse field set for partial updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalculationPatch {
    pub a: Option<f64>,
    pub b: Option<f64>,
    pub kind: Option<CalculationType>,
}

impl CalculationPatch {
    pub fn is_empty(&self) -> bool {
        self.a.is_none() && self.b.is_none() && self.kind.is_none()
    }
}

/// A calculation as handed to callers, with its freshly computed result.
///
/// A result that overflows to infinity (or is NaN) serializes as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationView {
    #[serde(flatten)]
    pub calculation: Calculation,
    pub result: f64,
}
