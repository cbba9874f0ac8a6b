use crate::{
    axum_http::error_responses::{AppError, error_response},
    config::config_model::{DotEnvyConfig, Frontend},
    usecases::payments::{PaymentError, PaymentGateway, PaymentUseCase},
};
use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use crates::{
    domain::{
        repositories::{
            payment_transactions::PaymentTransactionRepository, plans::PlanRepository,
            profiles::ProfileRepository, subscriptions::SubscriptionRepository,
        },
        value_objects::{payments::PaymentCallbackQuery, subscriptions::VerificationDto},
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{
            payment_transactions::PaymentTransactionPostgres, plans::PlanPostgres,
            profiles::ProfilePostgres, subscriptions::SubscriptionPostgres,
        },
    },
    payments::paystack_client::{PaystackClient, SIGNATURE_HEADER},
};
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

pub type PostgresPaymentUseCase = PaymentUseCase<
    PlanPostgres,
    SubscriptionPostgres,
    PaymentTransactionPostgres,
    ProfilePostgres,
    PaystackClient,
>;

pub fn payment_usecase(
    db_pool: &Arc<PgPoolSquad>,
    paystack_client: Arc<PaystackClient>,
    config: &DotEnvyConfig,
) -> PostgresPaymentUseCase {
    PaymentUseCase::new(
        Arc::new(PlanPostgres::new(Arc::clone(db_pool))),
        Arc::new(SubscriptionPostgres::new(Arc::clone(db_pool))),
        Arc::new(PaymentTransactionPostgres::new(Arc::clone(db_pool))),
        Arc::new(ProfilePostgres::new(Arc::clone(db_pool))),
        paystack_client,
        config.billing.currency.clone(),
    )
}

pub fn routes(
    db_pool: Arc<PgPoolSquad>,
    paystack_client: Arc<PaystackClient>,
    config: Arc<DotEnvyConfig>,
) -> Router {
    let usecase = payment_usecase(&db_pool, paystack_client, &config);

    Router::new()
        .route("/callback", get(payment_callback))
        .route("/webhook", post(payment_webhook))
        .layer(Extension(Arc::new(config.frontend.clone())))
        .with_state(Arc::new(usecase))
}

pub(super) fn map_error(label: &str, err: PaymentError) -> Response {
    let status = err.status_code();
    if status.is_server_error() {
        error!(status = status.as_u16(), error = ?err, "payments: {} failed", label);
    } else {
        warn!(status = status.as_u16(), error = %err, "payments: {} rejected", label);
    }
    error_response(status, err.to_string())
}

/// Browser destination carrying the verification outcome, when a result page is configured.
fn result_redirect(frontend: &Frontend, reference: &str, status: &str) -> Option<Redirect> {
    let base = frontend.payment_result_url.as_deref()?;
    let mut url = match Url::parse(base) {
        Ok(url) => url,
        Err(err) => {
            warn!(error = %err, "payments: PAYMENT_RESULT_URL is invalid, answering with JSON");
            return None;
        }
    };
    url.query_pairs_mut()
        .append_pair("reference", reference)
        .append_pair("status", status);
    Some(Redirect::to(url.as_str()))
}

fn verification_response(frontend: &Frontend, result: VerificationDto) -> Response {
    match result_redirect(frontend, &result.reference, result.status.as_str()) {
        Some(redirect) => redirect.into_response(),
        None => Json(result).into_response(),
    }
}

pub async fn payment_callback<Pl, S, T, P, G>(
    State(usecase): State<Arc<PaymentUseCase<Pl, S, T, P, G>>>,
    Extension(frontend): Extension<Arc<Frontend>>,
    Query(query): Query<PaymentCallbackQuery>,
) -> Response
where
    Pl: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let Some(reference) = query.reference().map(str::to_string) else {
        warn!("payments: callback without reference");
        return AppError::BadRequest("reference is required".to_string()).into_response();
    };

    info!(reference, "payments: callback received");
    match usecase.verify_payment(&reference).await {
        Ok(result) => verification_response(&frontend, result),
        Err(err) => match result_redirect(&frontend, &reference, "error") {
            Some(redirect) => {
                warn!(reference, error = %err, "payments: callback verification failed");
                redirect.into_response()
            }
            None => map_error("payment_callback", err),
        },
    }
}

pub async fn payment_webhook<Pl, S, T, P, G>(
    State(usecase): State<Arc<PaymentUseCase<Pl, S, T, P, G>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    Pl: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
    else {
        warn!("payments: webhook without signature header");
        return AppError::BadRequest(format!("missing {} header", SIGNATURE_HEADER))
            .into_response();
    };

    match usecase.handle_webhook(&body, signature).await {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(err) => map_error("payment_webhook", err),
    }
}
