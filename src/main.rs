use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use divvy::config::CONFIG;
use divvy::core::models::{
    AppLog, Balance, BalanceSummary, Expense, Group, GroupAudit, NetBalance, Profile, Settlement,
    Transfer,
};
use divvy::core::services::{AddExpenseInput, ExpenseOutcome};
use divvy::{InMemoryLogging, InMemoryStorage, LedgerError, LedgerService};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

type App = Arc<LedgerService<InMemoryLogging, InMemoryStorage>>;

// Request structs for JSON payloads
#[derive(Deserialize)]
struct CreateProfileRequest {
    name: String,
    email: String,
}

#[derive(Deserialize)]
struct CreateGroupRequest {
    name: String,
    description: Option<String>,
    created_by: String,
}

#[derive(Deserialize)]
struct DeleteGroupRequest {
    deleted_by: String,
}

#[derive(Deserialize)]
struct AddMemberRequest {
    email: String,
    added_by: String,
}

#[derive(Deserialize)]
struct RemoveMemberRequest {
    user_id: String,
    removed_by: String,
}

#[derive(Deserialize)]
struct DeleteExpenseRequest {
    deleted_by: String,
}

#[derive(Deserialize)]
struct SettleRequest {
    payer_id: String,
    payee_id: String,
    amount: f64,
}

#[derive(Deserialize)]
struct AsUser {
    user_id: String,
}

#[derive(Serialize)]
struct GroupDetailsResponse {
    group: Group,
    members: Vec<Profile>,
}

// Error response struct
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// Newtype wrapper for LedgerError to implement IntoResponse
struct ApiError(LedgerError);

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            LedgerError::InvalidInput(..)
            | LedgerError::SplitSumMismatch { .. }
            | LedgerError::PercentSumMismatch { .. }
            | LedgerError::InvalidAmount(_)
            | LedgerError::SelfSettlement
            | LedgerError::NoOutstandingDebt { .. }
            | LedgerError::ExcessSettlementAmount { .. } => StatusCode::BAD_REQUEST,
            LedgerError::UserNotFound(_)
            | LedgerError::GroupNotFound(_)
            | LedgerError::ExpenseNotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::EmailAlreadyRegistered(_) | LedgerError::AlreadyGroupMember(_) => {
                StatusCode::CONFLICT
            }
            LedgerError::NotGroupMember(_)
            | LedgerError::NotGroupCreator(_)
            | LedgerError::CreatorCannotBeRemoved
            | LedgerError::NotExpensePayer(_) => StatusCode::FORBIDDEN,
            LedgerError::Persistence(_) | LedgerError::Logging(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

async fn create_profile(
    State(service): State<App>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<Profile>), ApiError> {
    let profile = service.create_profile(req.name, req.email).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

async fn get_profile(
    State(service): State<App>,
    Path(user_id): Path<String>,
) -> Result<Json<Profile>, ApiError> {
    let profile = service
        .get_profile(&user_id)
        .await?
        .ok_or(LedgerError::UserNotFound(user_id))?;
    Ok(Json(profile))
}

async fn create_group(
    State(service): State<App>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Group>), ApiError> {
    let group = service
        .create_group(req.name, req.description, &req.created_by)
        .await?;
    Ok((StatusCode::CREATED, Json(group)))
}

async fn get_group_details(
    State(service): State<App>,
    Path(group_id): Path<String>,
    Query(q): Query<AsUser>,
) -> Result<Json<GroupDetailsResponse>, ApiError> {
    let (group, members) = service.get_group_details(&group_id, &q.user_id).await?;
    Ok(Json(GroupDetailsResponse { group, members }))
}

async fn delete_group(
    State(service): State<App>,
    Path(group_id): Path<String>,
    Json(req): Json<DeleteGroupRequest>,
) -> Result<StatusCode, ApiError> {
    service.delete_group(&group_id, &req.deleted_by).await?;
    Ok(StatusCode::OK)
}

async fn get_user_groups(
    State(service): State<App>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Group>>, ApiError> {
    Ok(Json(service.get_user_groups(&user_id).await?))
}

async fn add_member_by_email(
    State(service): State<App>,
    Path(group_id): Path<String>,
    Json(req): Json<AddMemberRequest>,
) -> Result<Json<Profile>, ApiError> {
    let profile = service
        .add_member_by_email(&group_id, &req.email, &req.added_by)
        .await?;
    Ok(Json(profile))
}

async fn remove_member(
    State(service): State<App>,
    Path(group_id): Path<String>,
    Json(req): Json<RemoveMemberRequest>,
) -> Result<StatusCode, ApiError> {
    service
        .remove_member(&group_id, &req.user_id, &req.removed_by)
        .await?;
    Ok(StatusCode::OK)
}

async fn add_expense(
    State(service): State<App>,
    Json(req): Json<AddExpenseInput>,
) -> Result<(StatusCode, Json<ExpenseOutcome>), ApiError> {
    let outcome = service.add_expense(req).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn delete_expense(
    State(service): State<App>,
    Path(expense_id): Path<String>,
    Json(req): Json<DeleteExpenseRequest>,
) -> Result<StatusCode, ApiError> {
    service.delete_expense(&expense_id, &req.deleted_by).await?;
    Ok(StatusCode::OK)
}

async fn get_group_expenses(
    State(service): State<App>,
    Path(group_id): Path<String>,
    Query(q): Query<AsUser>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    Ok(Json(service.get_group_expenses(&group_id, &q.user_id).await?))
}

async fn get_group_balances(
    State(service): State<App>,
    Path(group_id): Path<String>,
    Query(q): Query<AsUser>,
) -> Result<Json<Vec<Balance>>, ApiError> {
    Ok(Json(service.get_group_balances(&group_id, &q.user_id).await?))
}

async fn get_net_balances(
    State(service): State<App>,
    Path(group_id): Path<String>,
    Query(q): Query<AsUser>,
) -> Result<Json<Vec<NetBalance>>, ApiError> {
    Ok(Json(service.get_net_balances(&group_id, &q.user_id).await?))
}

async fn get_simplified_debts(
    State(service): State<App>,
    Path(group_id): Path<String>,
    Query(q): Query<AsUser>,
) -> Result<Json<Vec<Transfer>>, ApiError> {
    Ok(Json(
        service.get_simplified_debts(&group_id, &q.user_id).await?,
    ))
}

async fn settle(
    State(service): State<App>,
    Path(group_id): Path<String>,
    Json(req): Json<SettleRequest>,
) -> Result<(StatusCode, Json<Settlement>), ApiError> {
    let settlement = service
        .settle(&group_id, &req.payer_id, &req.payee_id, req.amount)
        .await?;
    Ok((StatusCode::CREATED, Json(settlement)))
}

async fn get_group_settlements(
    State(service): State<App>,
    Path(group_id): Path<String>,
    Query(q): Query<AsUser>,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    Ok(Json(
        service.get_group_settlements(&group_id, &q.user_id).await?,
    ))
}

async fn get_user_settlements(
    State(service): State<App>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<Settlement>>, ApiError> {
    Ok(Json(service.get_user_settlements(&user_id).await?))
}

async fn get_user_balance_summary(
    State(service): State<App>,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceSummary>, ApiError> {
    Ok(Json(service.get_user_balance_summary(&user_id).await?))
}

async fn get_group_audits(
    State(service): State<App>,
    Path(group_id): Path<String>,
) -> Result<Json<Vec<GroupAudit>>, ApiError> {
    Ok(Json(service.get_group_audits(&group_id).await?))
}

async fn get_app_logs(State(service): State<App>) -> Result<Json<Vec<AppLog>>, ApiError> {
    Ok(Json(service.get_app_logs().await?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(CONFIG.log_level.as_str())
        .init();

    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    let service = Arc::new(LedgerService::new(storage, logging));

    let app = Router::new()
        .route("/", get(|| async { "OK" }))
        .route("/users", post(create_profile))
        .route("/users/{user_id}", get(get_profile))
        .route("/users/{user_id}/groups", get(get_user_groups))
        .route("/users/{user_id}/settlements", get(get_user_settlements))
        .route("/users/{user_id}/balance-summary", get(get_user_balance_summary))
        .route("/groups", post(create_group))
        .route("/groups/{group_id}", get(get_group_details).delete(delete_group))
        .route("/groups/{group_id}/members", post(add_member_by_email))
        .route("/groups/{group_id}/members/remove", post(remove_member))
        .route("/expenses", post(add_expense))
        .route("/expenses/{expense_id}", delete(delete_expense))
        .route("/groups/{group_id}/expenses", get(get_group_expenses))
        .route("/groups/{group_id}/balances", get(get_group_balances))
        .route("/groups/{group_id}/net-balances", get(get_net_balances))
        .route("/groups/{group_id}/simplified-debts", get(get_simplified_debts))
        .route("/groups/{group_id}/settlements", post(settle).get(get_group_settlements))
        .route("/groups/{group_id}/audits", get(get_group_audits))
        .route("/logs", get(get_app_logs))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([http::Method::GET, http::Method::POST, http::Method::DELETE])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(service);

    let addr = SocketAddr::from(([127, 0, 0, 1], CONFIG.port));
    info!("Server running at http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
