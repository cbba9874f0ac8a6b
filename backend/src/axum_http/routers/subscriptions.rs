use crate::{
    auth::AuthUser,
    axum_http::routers::payments::{map_error, payment_usecase},
    config::config_model::DotEnvyConfig,
    usecases::payments::{PaymentGateway, PaymentUseCase},
};
use axum::{
    Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use crates::{
    domain::repositories::{
        payment_transactions::PaymentTransactionRepository, plans::PlanRepository,
        profiles::ProfileRepository, subscriptions::SubscriptionRepository,
    },
    infra::db::postgres::postgres_connection::PgPoolSquad,
    payments::paystack_client::PaystackClient,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    paystack_client: Arc<PaystackClient>,
    config: Arc<DotEnvyConfig>,
) -> Router {
    let usecase = payment_usecase(&db_pool, paystack_client, &config);

    Router::new()
        .route("/plans", get(list_plans))
        .route("/current", get(current_subscription))
        .route("/checkout/:plan_id", post(checkout))
        .with_state(Arc::new(usecase))
}

pub async fn list_plans<Pl, S, T, P, G>(
    State(usecase): State<Arc<PaymentUseCase<Pl, S, T, P, G>>>,
    _auth: AuthUser,
) -> Response
where
    Pl: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match usecase.list_plans().await {
        Ok(plans) => Json(plans).into_response(),
        Err(err) => map_error("list_plans", err),
    }
}

pub async fn current_subscription<Pl, S, T, P, G>(
    State(usecase): State<Arc<PaymentUseCase<Pl, S, T, P, G>>>,
    AuthUser { user_id, .. }: AuthUser,
) -> Response
where
    Pl: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    match usecase.current_subscription(user_id).await {
        Ok(subscription) => Json(subscription).into_response(),
        Err(err) => map_error("current_subscription", err),
    }
}

pub async fn checkout<Pl, S, T, P, G>(
    State(usecase): State<Arc<PaymentUseCase<Pl, S, T, P, G>>>,
    AuthUser { user_id, .. }: AuthUser,
    Path(plan_id): Path<Uuid>,
) -> Response
where
    Pl: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    info!(%user_id, %plan_id, "subscriptions: checkout request received");
    match usecase.initiate_checkout(user_id, plan_id).await {
        Ok(checkout) => Json(checkout).into_response(),
        Err(err) => map_error("checkout", err),
    }
}
