use std::sync::Arc;

use anyhow::{Result as AnyResult, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crates::{
    domain::{
        entities::payment_transactions::{InsertPaymentTransactionEntity, PaymentTransactionEntity},
        repositories::{
            payment_transactions::PaymentTransactionRepository, plans::PlanRepository,
            profiles::ProfileRepository, subscriptions::SubscriptionRepository,
        },
        value_objects::{
            enums::payment_statuses::PaymentStatus,
            payments::{
                CheckoutMetadata, GatewayError, InitializeTransactionRequest,
                InitializedTransaction, PaymentEvent, VerifiedTransaction, new_reference,
            },
            plans::PlanDto,
            subscriptions::{
                ActivationOutcome, CheckoutDto, CurrentSubscriptionDto, VerificationDto,
            },
        },
    },
    payments::paystack_client::PaystackClient,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::entitlement::EntitlementResolver;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize_transaction(
        &self,
        request: &InitializeTransactionRequest,
    ) -> Result<InitializedTransaction, GatewayError>;

    async fn verify_transaction(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError>;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<PaymentEvent>;
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize_transaction(
        &self,
        request: &InitializeTransactionRequest,
    ) -> Result<InitializedTransaction, GatewayError> {
        self.initialize_transaction(request).await
    }

    async fn verify_transaction(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        self.verify_transaction(reference).await
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<PaymentEvent> {
        self.verify_webhook_signature(payload, signature)
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("plan not found")]
    PlanNotFound,
    #[error("profile not found")]
    ProfileNotFound,
    #[error("profile email is required for checkout")]
    MissingEmail,
    #[error("verification failed, record not found")]
    TransactionNotFound,
    #[error("payment gateway rejected the request: {0}")]
    GatewayRejected(String),
    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("invalid webhook payload: {0}")]
    InvalidWebhook(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl PaymentError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            PaymentError::PlanNotFound
            | PaymentError::ProfileNotFound
            | PaymentError::TransactionNotFound => StatusCode::NOT_FOUND,
            PaymentError::MissingEmail
            | PaymentError::InvalidSignature
            | PaymentError::InvalidWebhook(_) => StatusCode::BAD_REQUEST,
            PaymentError::GatewayRejected(_) | PaymentError::GatewayUnavailable(_) => {
                StatusCode::BAD_GATEWAY
            }
            PaymentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, PaymentError>;

pub struct PaymentUseCase<Pl, S, T, P, G>
where
    Pl: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    plan_repo: Arc<Pl>,
    subscription_repo: Arc<S>,
    transaction_repo: Arc<T>,
    profile_repo: Arc<P>,
    gateway: Arc<G>,
    entitlement: EntitlementResolver<S>,
    currency: String,
}

impl<Pl, S, T, P, G> PaymentUseCase<Pl, S, T, P, G>
where
    Pl: PlanRepository + Send + Sync + 'static,
    S: SubscriptionRepository + Send + Sync + 'static,
    T: PaymentTransactionRepository + Send + Sync + 'static,
    P: ProfileRepository + Send + Sync + 'static,
    G: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        plan_repo: Arc<Pl>,
        subscription_repo: Arc<S>,
        transaction_repo: Arc<T>,
        profile_repo: Arc<P>,
        gateway: Arc<G>,
        currency: String,
    ) -> Self {
        Self {
            plan_repo,
            entitlement: EntitlementResolver::new(Arc::clone(&subscription_repo)),
            subscription_repo,
            transaction_repo,
            profile_repo,
            gateway,
            currency,
        }
    }

    pub async fn list_plans(&self) -> UseCaseResult<Vec<PlanDto>> {
        let plans = self.plan_repo.list_active_plans().await.map_err(|err| {
            error!(db_error = ?err, "payments: failed to list active plans");
            PaymentError::Internal(err)
        })?;
        let plan_count = plans.len();
        info!(plan_count, "payments: active plans loaded");
        Ok(plans.into_iter().map(PlanDto::from).collect())
    }

    pub async fn current_subscription(
        &self,
        user_id: Uuid,
    ) -> UseCaseResult<Option<CurrentSubscriptionDto>> {
        let subscription = match self
            .subscription_repo
            .find_by_user(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "payments: failed to load subscription");
                PaymentError::Internal(err)
            })? {
            Some(subscription) => subscription,
            None => {
                info!(%user_id, "payments: no subscription");
                return Ok(None);
            }
        };

        let plan_name = match subscription.plan_id {
            Some(plan_id) => self
                .plan_repo
                .find_by_id(plan_id)
                .await
                .map_err(|err| {
                    error!(%user_id, %plan_id, db_error = ?err, "payments: failed to load subscription plan");
                    PaymentError::Internal(err)
                })?
                .map(|plan| plan.name),
            None => None,
        };

        Ok(Some(CurrentSubscriptionDto::from_entity(
            &subscription,
            plan_name,
            Utc::now(),
        )))
    }

    pub async fn initiate_checkout(&self, user_id: Uuid, plan_id: Uuid) -> UseCaseResult<CheckoutDto> {
        info!(%user_id, %plan_id, "payments: checkout requested");

        let plan = self
            .plan_repo
            .find_active_plan_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%user_id, %plan_id, db_error = ?err, "payments: failed to load plan for checkout");
                PaymentError::Internal(err)
            })?
            .ok_or(PaymentError::PlanNotFound)?;

        let profile = self
            .profile_repo
            .find_by_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "payments: failed to load profile for checkout");
                PaymentError::Internal(err)
            })?
            .ok_or(PaymentError::ProfileNotFound)?;

        let email = profile.email.trim().to_string();
        if email.is_empty() {
            let err = PaymentError::MissingEmail;
            warn!(
                %user_id,
                status = err.status_code().as_u16(),
                "payments: missing email for checkout"
            );
            return Err(err);
        }

        let reference = new_reference();
        self.transaction_repo
            .create_pending(InsertPaymentTransactionEntity {
                user_id,
                plan_id: Some(plan.id),
                reference: reference.clone(),
                amount_minor: plan.price_minor,
                currency: self.currency.clone(),
                status: PaymentStatus::Pending.to_string(),
                gateway_events: serde_json::json!([]),
            })
            .await
            .map_err(|err| {
                error!(%user_id, %plan_id, db_error = ?err, "payments: failed to record pending transaction");
                PaymentError::Internal(err)
            })?;

        let request = InitializeTransactionRequest {
            email,
            amount_minor: plan.price_minor,
            reference: reference.clone(),
            currency: self.currency.clone(),
            metadata: CheckoutMetadata {
                user_id,
                plan_id: plan.id,
                plan_name: plan.name.clone(),
            },
        };

        match self.gateway.initialize_transaction(&request).await {
            Ok(initialized) => {
                info!(%user_id, %plan_id, reference, "payments: checkout initialized");
                Ok(CheckoutDto {
                    reference,
                    authorization_url: initialized.authorization_url,
                })
            }
            Err(GatewayError::Transport(message)) => {
                warn!(%user_id, reference, error = %message, "payments: gateway unreachable, transaction left pending");
                Err(PaymentError::GatewayUnavailable(message))
            }
            Err(err) => {
                warn!(%user_id, reference, error = %err, "payments: gateway rejected checkout");
                self.mark_terminal(&reference, PaymentStatus::Failed, err.payload())
                    .await?;
                Err(PaymentError::GatewayRejected(err.to_string()))
            }
        }
    }

    async fn load_transaction(&self, reference: &str) -> UseCaseResult<PaymentTransactionEntity> {
        self.transaction_repo
            .find_by_reference(reference)
            .await
            .map_err(|err| {
                error!(reference, db_error = ?err, "payments: failed to load transaction");
                PaymentError::Internal(err)
            })?
            .ok_or_else(|| {
                warn!(reference, "payments: verification for unknown reference");
                PaymentError::TransactionNotFound
            })
    }

    async fn mark_terminal(
        &self,
        reference: &str,
        status: PaymentStatus,
        payload: serde_json::Value,
    ) -> UseCaseResult<bool> {
        let changed = self
            .transaction_repo
            .mark_terminal(reference, status, payload)
            .await
            .map_err(|err| {
                error!(reference, %status, db_error = ?err, "payments: failed to record terminal status");
                PaymentError::Internal(err)
            })?;

        if changed {
            info!(reference, %status, "payments: transaction closed");
        } else {
            debug!(reference, %status, "payments: transaction was no longer pending");
        }
        Ok(changed)
    }

    async fn premium_until(&self, user_id: Uuid, now: DateTime<Utc>) -> UseCaseResult<Option<DateTime<Utc>>> {
        let subscription = self
            .entitlement
            .active_subscription(user_id, now)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "payments: failed to resolve entitlement");
                PaymentError::Internal(err)
            })?;
        Ok(subscription.and_then(|subscription| subscription.end_date))
    }

    /// Closes a non-success verification and reports whatever status the row ended in.
    async fn close_unsuccessful(
        &self,
        transaction: &PaymentTransactionEntity,
        status: PaymentStatus,
        payload: serde_json::Value,
    ) -> UseCaseResult<VerificationDto> {
        let final_status = if self.mark_terminal(&transaction.reference, status, payload).await? {
            status
        } else {
            self.load_transaction(&transaction.reference).await?.status()
        };

        Ok(VerificationDto {
            reference: transaction.reference.clone(),
            status: final_status,
            premium_until: None,
        })
    }

    pub async fn verify_payment(&self, reference: &str) -> UseCaseResult<VerificationDto> {
        let now = Utc::now();
        let transaction = self.load_transaction(reference).await?;

        match transaction.status() {
            PaymentStatus::Success => {
                info!(reference, "payments: transaction already verified");
                return Ok(VerificationDto {
                    reference: transaction.reference.clone(),
                    status: PaymentStatus::Success,
                    premium_until: self.premium_until(transaction.user_id, now).await?,
                });
            }
            status @ (PaymentStatus::Failed | PaymentStatus::Abandoned) => {
                info!(reference, %status, "payments: transaction already closed");
                return Ok(VerificationDto {
                    reference: transaction.reference.clone(),
                    status,
                    premium_until: None,
                });
            }
            PaymentStatus::Pending => {}
        }

        let verified = match self.gateway.verify_transaction(reference).await {
            Ok(verified) => verified,
            Err(GatewayError::Transport(message)) => {
                warn!(reference, error = %message, "payments: gateway unreachable, transaction left pending");
                return Err(PaymentError::GatewayUnavailable(message));
            }
            Err(err) => {
                warn!(reference, error = %err, "payments: gateway rejected verification");
                self.mark_terminal(reference, PaymentStatus::Failed, err.payload())
                    .await?;
                return Err(PaymentError::GatewayRejected(err.to_string()));
            }
        };

        let gateway_status = verified.status();
        if gateway_status != PaymentStatus::Success {
            info!(reference, gateway_status = %verified.gateway_status, "payments: gateway reported unsuccessful payment");
            return self
                .close_unsuccessful(&transaction, gateway_status, verified.payload)
                .await;
        }

        let amount_matches = verified.amount_minor == Some(transaction.amount_minor);
        let currency_matches = verified
            .currency
            .as_deref()
            .is_none_or(|currency| currency.eq_ignore_ascii_case(&transaction.currency));
        if !amount_matches || !currency_matches {
            warn!(
                reference,
                expected_amount = transaction.amount_minor,
                reported_amount = ?verified.amount_minor,
                reported_currency = ?verified.currency,
                "payments: verified amount does not match transaction"
            );
            return self
                .close_unsuccessful(&transaction, PaymentStatus::Failed, verified.payload)
                .await;
        }

        let duration_days = self.plan_duration(&transaction).await?;
        let outcome = self
            .transaction_repo
            .record_success_and_activate(
                reference,
                verified.payload,
                verified.customer_code,
                duration_days,
                now,
            )
            .await
            .map_err(|err| {
                error!(reference, db_error = ?err, "payments: failed to activate subscription");
                PaymentError::Internal(err)
            })?;

        match outcome {
            ActivationOutcome::Activated {
                subscription,
                extended,
            } => {
                info!(
                    reference,
                    user_id = %transaction.user_id,
                    end_date = ?subscription.end_date,
                    extended,
                    "payments: subscription activated"
                );
                Ok(VerificationDto {
                    reference: transaction.reference,
                    status: PaymentStatus::Success,
                    premium_until: subscription.end_date,
                })
            }
            ActivationOutcome::AlreadyCompleted => {
                info!(reference, "payments: concurrent verification already activated");
                Ok(VerificationDto {
                    premium_until: self.premium_until(transaction.user_id, now).await?,
                    reference: transaction.reference,
                    status: PaymentStatus::Success,
                })
            }
            ActivationOutcome::NotPending(status) => {
                info!(reference, %status, "payments: transaction closed before activation");
                Ok(VerificationDto {
                    reference: transaction.reference,
                    status,
                    premium_until: None,
                })
            }
        }
    }

    async fn plan_duration(&self, transaction: &PaymentTransactionEntity) -> UseCaseResult<i32> {
        let plan_id = transaction.plan_id.ok_or_else(|| {
            error!(reference = %transaction.reference, "payments: transaction has no plan");
            PaymentError::Internal(anyhow!("transaction {} has no plan", transaction.reference))
        })?;

        let plan = self
            .plan_repo
            .find_by_id(plan_id)
            .await
            .map_err(|err| {
                error!(%plan_id, db_error = ?err, "payments: failed to load plan for activation");
                PaymentError::Internal(err)
            })?
            .ok_or_else(|| {
                error!(%plan_id, reference = %transaction.reference, "payments: plan for transaction no longer exists");
                PaymentError::Internal(anyhow!("plan {} not found", plan_id))
            })?;

        Ok(plan.duration_days)
    }

    pub async fn handle_webhook(&self, payload: &[u8], signature: &str) -> UseCaseResult<()> {
        let event = self
            .gateway
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                warn!(
                    error = %err,
                    status = PaymentError::InvalidSignature.status_code().as_u16(),
                    "payments: webhook verification failed"
                );
                PaymentError::InvalidSignature
            })?;

        info!(event = %event.event, "payments: webhook verified");

        let Some(reference) = event.charge_success_reference() else {
            if event.event == PaymentEvent::CHARGE_SUCCESS {
                return Err(PaymentError::InvalidWebhook("missing reference".to_string()));
            }
            debug!(event = %event.event, "payments: unhandled webhook event");
            return Ok(());
        };

        match self.verify_payment(reference).await {
            Ok(result) => {
                info!(reference, status = %result.status, "payments: webhook processed");
                Ok(())
            }
            Err(PaymentError::TransactionNotFound) => {
                warn!(reference, "payments: webhook for unknown reference ignored");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
