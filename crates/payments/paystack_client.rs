use std::time::Duration;

use anyhow::Result;
use hmac::{Hmac, Mac};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::json;
use sha2::Sha512;
use tracing::error;

use crate::domain::value_objects::payments::{
    GatewayError, InitializeTransactionRequest, InitializedTransaction, PaymentEvent,
    VerifiedTransaction,
};

type HmacSha512 = Hmac<Sha512>;

pub const DEFAULT_BASE_URL: &str = "https://api.paystack.co";
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub secret_key: String,
    pub base_url: String,
    pub callback_url: String,
    pub timeout: Duration,
}

/// Minimal Paystack client built on reqwest.
pub struct PaystackClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
    callback_url: String,
}

/// Every Paystack response is wrapped in `{ status, message, data }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct InitializeData {
    authorization_url: Option<String>,
    access_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: Option<String>,
    reference: Option<String>,
    amount: Option<i64>,
    currency: Option<String>,
    customer: Option<VerifyCustomer>,
}

#[derive(Debug, Deserialize)]
struct VerifyCustomer {
    customer_code: Option<String>,
}

impl PaystackClient {
    pub fn new(config: PaystackConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            secret_key: config.secret_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            callback_url: config.callback_url,
        })
    }

    async fn read_body(resp: reqwest::Response, context: &str) -> Result<serde_json::Value, GatewayError> {
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| GatewayError::Transport(format!("{}: {}", context, err)))?;

        let payload = serde_json::from_str::<serde_json::Value>(&body).ok();

        if status.is_success() {
            return payload.ok_or_else(|| {
                GatewayError::Malformed(format!("{}: response body is not JSON", context))
            });
        }

        let message = payload
            .as_ref()
            .and_then(|value| value.get("message"))
            .and_then(|value| value.as_str())
            .map(|value| value.to_string());

        error!(
            status = %status,
            paystack_message = ?message,
            response_body = %body,
            context = %context,
            "paystack api request failed"
        );

        Err(GatewayError::Rejected {
            message: format!(
                "{} (status {}): {}",
                context,
                status,
                message.unwrap_or_else(|| "no message".to_string())
            ),
            payload,
        })
    }

    fn transport_error(context: &str, err: reqwest::Error) -> GatewayError {
        error!(context = %context, http_error = ?err, "paystack api unreachable");
        GatewayError::Transport(format!("{}: {}", context, err))
    }

    /// Starts a hosted checkout and returns where to send the payer.
    /// https://paystack.com/docs/api/transaction/#initialize
    pub async fn initialize_transaction(
        &self,
        request: &InitializeTransactionRequest,
    ) -> Result<InitializedTransaction, GatewayError> {
        let body = json!({
            "email": request.email,
            "amount": request.amount_minor,
            "reference": request.reference,
            "callback_url": self.callback_url,
            "currency": request.currency,
            "metadata": request.metadata,
        });

        let resp = self
            .http
            .post(format!("{}/transaction/initialize", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .json(&body)
            .send()
            .await
            .map_err(|err| Self::transport_error("initialize transaction", err))?;
        let payload = Self::read_body(resp, "initialize transaction").await?;

        parse_initialize(payload)
    }

    /// Server-to-server status lookup for a reference.
    /// https://paystack.com/docs/api/transaction/#verify
    pub async fn verify_transaction(&self, reference: &str) -> Result<VerifiedTransaction, GatewayError> {
        let resp = self
            .http
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .header(AUTHORIZATION, format!("Bearer {}", self.secret_key))
            .send()
            .await
            .map_err(|err| Self::transport_error("verify transaction", err))?;
        let payload = Self::read_body(resp, "verify transaction").await?;

        parse_verify(reference, payload)
    }

    /// Checks `x-paystack-signature`, a hex HMAC-SHA512 of the raw body keyed with the secret key.
    pub fn verify_webhook_signature(&self, payload: &[u8], signature_header: &str) -> Result<PaymentEvent> {
        verify_signature(&self.secret_key, payload, signature_header)?;
        let event: PaymentEvent = serde_json::from_slice(payload)?;
        Ok(event)
    }
}

fn verify_signature(secret_key: &str, payload: &[u8], signature_header: &str) -> Result<()> {
    let provided = hex::decode(signature_header.trim())?;
    let mut mac = HmacSha512::new_from_slice(secret_key.as_bytes())?;
    mac.update(payload);
    mac.verify_slice(&provided)
        .map_err(|_| anyhow::anyhow!("invalid webhook signature"))?;
    Ok(())
}

fn parse_initialize(payload: serde_json::Value) -> Result<InitializedTransaction, GatewayError> {
    let envelope: Envelope<InitializeData> = serde_json::from_value(payload.clone())
        .map_err(|err| GatewayError::Malformed(format!("initialize transaction: {}", err)))?;

    if !envelope.status {
        return Err(GatewayError::Rejected {
            message: envelope
                .message
                .unwrap_or_else(|| "initialize transaction declined".to_string()),
            payload: Some(payload),
        });
    }

    let data = envelope
        .data
        .ok_or_else(|| GatewayError::Malformed("initialize transaction: missing data".to_string()))?;
    let authorization_url = data
        .authorization_url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| {
            GatewayError::Malformed("initialize transaction: missing authorization_url".to_string())
        })?;

    Ok(InitializedTransaction {
        authorization_url,
        access_code: data.access_code,
        payload,
    })
}

fn parse_verify(reference: &str, payload: serde_json::Value) -> Result<VerifiedTransaction, GatewayError> {
    let envelope: Envelope<VerifyData> = serde_json::from_value(payload.clone())
        .map_err(|err| GatewayError::Malformed(format!("verify transaction: {}", err)))?;

    if !envelope.status {
        return Err(GatewayError::Rejected {
            message: envelope
                .message
                .unwrap_or_else(|| "verify transaction declined".to_string()),
            payload: Some(payload),
        });
    }

    let data = envelope
        .data
        .ok_or_else(|| GatewayError::Malformed("verify transaction: missing data".to_string()))?;
    let gateway_status = data
        .status
        .ok_or_else(|| GatewayError::Malformed("verify transaction: missing status".to_string()))?;

    Ok(VerifiedTransaction {
        reference: data.reference.unwrap_or_else(|| reference.to_string()),
        gateway_status,
        amount_minor: data.amount,
        currency: data.currency,
        customer_code: data.customer.and_then(|customer| customer.customer_code),
        payload,
    })
}
