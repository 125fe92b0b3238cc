use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use service::cpc::{CpcDecision, CpcResponse};

use crate::state::ServerState;

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ValidateContractRequest {
    pub contract: String,
    pub segment: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct AcionamentoRequest {
    pub contract: String,
    pub phone: String,
    pub segment: String,
}

// Partner failures are already folded into the body; these handlers always answer 200.

#[utoipa::path(post, path = "/cpc/validate-contract", tag = "cpc", request_body = ValidateContractRequest,
    responses((status = 200, description = "Partner result", body = crate::openapi::CpcResponseDoc)))]
pub async fn validate_contract(State(state): State<ServerState>, Json(req): Json<ValidateContractRequest>) -> Json<CpcResponse> {
    Json(state.cpc.validate_contract(&req.contract, &req.segment, req.phone.as_deref()).await)
}

#[utoipa::path(post, path = "/cpc/check-acionamento", tag = "cpc", request_body = AcionamentoRequest,
    responses((status = 200, description = "Partner result", body = crate::openapi::CpcResponseDoc)))]
pub async fn check_acionamento(State(state): State<ServerState>, Json(req): Json<AcionamentoRequest>) -> Json<CpcResponse> {
    Json(state.cpc.check_acionamento(&req.contract, &req.phone, &req.segment).await)
}

#[utoipa::path(post, path = "/cpc/register-acionamento", tag = "cpc", request_body = AcionamentoRequest,
    responses((status = 200, description = "Partner result", body = crate::openapi::CpcResponseDoc)))]
pub async fn register_acionamento(State(state): State<ServerState>, Json(req): Json<AcionamentoRequest>) -> Json<CpcResponse> {
    Json(state.cpc.register_acionamento(&req.contract, &req.phone, &req.segment).await)
}

#[utoipa::path(post, path = "/cpc/can-contact", tag = "cpc", request_body = AcionamentoRequest,
    responses((status = 200, description = "Allow/deny decision", body = crate::openapi::CpcDecisionDoc)))]
pub async fn can_contact(State(state): State<ServerState>, Json(req): Json<AcionamentoRequest>) -> Json<CpcDecision> {
    Json(state.cpc.can_contact(&req.contract, &req.phone, &req.segment).await)
}
