// handlers/calculations.rs - Calculation CRUD shared by both tiers
//
// Public routes pass `owner = None` (unscoped), protected routes pass the
// authenticated user's id.

use serde::Deserialize;
use tracing::info;

use crate::api::AppState;
use crate::calculation::{CalculationPatch, CalculationView, OperationError};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::{CalculationId, UserId};

/// Body of a create request
#[derive(Debug, Deserialize)]
pub struct CalculationCreate {
    pub a: f64,
    pub b: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Body of an update request; absent fields keep their stored value
#[derive(Debug, Default, Deserialize)]
pub struct CalculationUpdate {
    pub a: Option<f64>,
    pub b: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl CalculationUpdate {
    pub fn into_patch(self) -> Result<CalculationPatch, OperationError> {
        Ok(CalculationPatch {
            a: self.a,
            b: self.b,
            kind: self.kind.as_deref().map(str::parse).transpose()?,
        })
    }
}

pub async fn create(
    state: &AppState,
    owner: Option<UserId>,
    body: CalculationCreate,
) -> ApiResult<CalculationView> {
    let service = &state.calculations;
    let calculation = service.create(body.a, body.b, body.kind.as_str(), owner).await?;
    info!(id = calculation.id, ?owner, "calculation created");
    Ok(ApiResponse::created(service.view(calculation)?))
}

pub async fn list(state: &AppState, owner: Option<UserId>) -> ApiResult<Vec<CalculationView>> {
    let service = &state.calculations;
    let calculations = service.list(owner).await?;
    Ok(ApiResponse::success(service.view_all(calculations)?))
}

pub async fn get(state: &AppState, owner: Option<UserId>, id: CalculationId) -> ApiResult<CalculationView> {
    let service = &state.calculations;
    let calculation = service.get(id, owner).await?;
    Ok(ApiResponse::success(service.view(calculation)?))
}

pub async fn update(
    state: &AppState,
    owner: Option<UserId>,
    id: CalculationId,
    body: CalculationUpdate,
) -> ApiResult<CalculationView> {
    let service = &state.calculations;
    let patch = body.into_patch()?;
    let calculation = service.update(id, &patch, owner).await?;
    Ok(ApiResponse::success(service.view(calculation)?))
}

pub async fn delete(state: &AppState, owner: Option<UserId>, id: CalculationId) -> ApiResult<()> {
    state.calculations.delete(id, owner).await?;
    info!(id, ?owner, "calculation deleted");
    Ok(ApiResponse::no_content())
}
