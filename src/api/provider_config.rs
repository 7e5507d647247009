//! Provider configuration API handlers

use crate::api::SuccessResponse;
use crate::domain::{CurrencySetting, Scope, UpsertConfigInput};
use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::service::fields::FieldsPayload;
use crate::service::{BankAccountGroups, CredentialGroups, RestrictionGroups, StpRuleGroups};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

/// Country-authority selector for method config endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct MethodConfigQuery {
    pub country: String,
    pub authority: String,
}

/// Request scope for effective-field resolution; absent dimensions are
/// wildcards
#[derive(Debug, Clone, Deserialize)]
pub struct ScopeQuery {
    pub country: Option<String>,
    pub authority: Option<String>,
    pub currency: Option<String>,
}

/// Upsert the provider and its full country-authority-method mapping
pub async fn upsert_config(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(input): Json<UpsertConfigInput>,
) -> Result<impl IntoResponse> {
    if !input.provider.code.eq_ignore_ascii_case(&code) {
        return Err(AppError::BadRequest(format!(
            "Provider code in path ('{}') does not match body ('{}')",
            code, input.provider.code
        )));
    }
    let response = state.config_upsert_service.upsert(input).await?;
    Ok(Json(SuccessResponse::new(response)))
}

/// Get provider fields (common + specific)
pub async fn get_fields(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    let payload = state.fields_service.get(&code).await?;
    Ok(Json(SuccessResponse::new(payload)))
}

/// Resolve the fields effective for one request scope
pub async fn get_effective_fields(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> Result<impl IntoResponse> {
    let scope = Scope::new(
        query.authority.as_deref(),
        query.country.as_deref(),
        query.currency.as_deref(),
    );
    let fields = state.fields_service.get_effective(&code, &scope).await?;
    Ok(Json(SuccessResponse::new(fields)))
}

/// Replace provider fields
pub async fn update_fields(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(payload): Json<FieldsPayload>,
) -> Result<impl IntoResponse> {
    let payload = state.fields_service.update(&code, payload).await?;
    Ok(Json(SuccessResponse::new(payload)))
}

/// Get provider credentials as rule groups
pub async fn get_credentials(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    let groups = state.credentials_service.get(&code).await?;
    Ok(Json(SuccessResponse::new(groups)))
}

/// Replace provider credentials
pub async fn update_credentials(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(groups): Json<CredentialGroups>,
) -> Result<impl IntoResponse> {
    let groups = state.credentials_service.update(&code, groups).await?;
    Ok(Json(SuccessResponse::new(groups)))
}

/// Get provider bank accounts as rule groups
pub async fn get_bank_accounts(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    let groups = state.bank_accounts_service.get(&code).await?;
    Ok(Json(SuccessResponse::new(groups)))
}

/// Replace provider bank accounts
pub async fn update_bank_accounts(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(groups): Json<BankAccountGroups>,
) -> Result<impl IntoResponse> {
    let groups = state.bank_accounts_service.update(&code, groups).await?;
    Ok(Json(SuccessResponse::new(groups)))
}

/// Get provider STP rules as rule groups
pub async fn get_stp_rules(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    let groups = state.stp_rules_service.get(&code).await?;
    Ok(Json(SuccessResponse::new(groups)))
}

/// Replace provider STP rules
pub async fn update_stp_rules(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(groups): Json<StpRuleGroups>,
) -> Result<impl IntoResponse> {
    let groups = state.stp_rules_service.update(&code, groups).await?;
    Ok(Json(SuccessResponse::new(groups)))
}

/// Get provider platform restrictions as rule groups
pub async fn get_restrictions(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse> {
    let groups = state.restrictions_service.get(&code).await?;
    Ok(Json(SuccessResponse::new(groups)))
}

/// Replace provider platform restrictions
pub async fn update_restrictions(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(groups): Json<RestrictionGroups>,
) -> Result<impl IntoResponse> {
    let groups = state.restrictions_service.update(&code, groups).await?;
    Ok(Json(SuccessResponse::new(groups)))
}

/// Get per-currency transaction settings for one bound method
pub async fn get_method_configs(
    State(state): State<AppState>,
    Path((code, method)): Path<(String, String)>,
    Query(query): Query<MethodConfigQuery>,
) -> Result<impl IntoResponse> {
    let settings = state
        .method_configs_service
        .get_configs(&code, &query.country, &query.authority, &method)
        .await?;
    Ok(Json(SuccessResponse::new(settings)))
}

/// Upsert per-currency transaction settings for one bound method
pub async fn update_method_configs(
    State(state): State<AppState>,
    Path((code, method)): Path<(String, String)>,
    Query(query): Query<MethodConfigQuery>,
    Json(settings): Json<Vec<CurrencySetting>>,
) -> Result<impl IntoResponse> {
    let settings = state
        .method_configs_service
        .update_configs(&code, &query.country, &query.authority, &method, settings)
        .await?;
    Ok(Json(SuccessResponse::new(settings)))
}
