use std::time::Duration;

use anyhow::{Context, Result};
use crates::{
    domain::value_objects::matching::DEFAULT_SWIPE_PAGE_SIZE,
    infra::storages::image_storage::ImageStorageConfig,
    payments::paystack_client::{DEFAULT_BASE_URL, PaystackConfig},
};

use super::config_model::{
    Auth, BackendServer, Billing, Database, DotEnvyConfig, Frontend, Matching,
};

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{} is invalid", key))
}

fn optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn or_default(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required("SERVER_PORT_BACKEND")?
            .parse()
            .context("SERVER_PORT_BACKEND is invalid")?,
        body_limit: required("SERVER_BODY_LIMIT")?
            .parse()
            .context("SERVER_BODY_LIMIT is invalid")?,
        timeout: required("SERVER_TIMEOUT")?
            .parse()
            .context("SERVER_TIMEOUT is invalid")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: or_default("DATABASE_MAX_CONNECTIONS", "10")
            .parse()
            .context("DATABASE_MAX_CONNECTIONS is invalid")?,
    };

    let auth = Auth {
        jwt_secret: required("JWT_SECRET")?,
    };

    let paystack = PaystackConfig {
        secret_key: required("PAYSTACK_SECRET_KEY")?,
        base_url: or_default("PAYSTACK_BASE_URL", DEFAULT_BASE_URL),
        callback_url: required("PAYSTACK_CALLBACK_URL")?,
        timeout: Duration::from_secs(
            or_default("PAYSTACK_TIMEOUT_SECS", "15")
                .parse()
                .context("PAYSTACK_TIMEOUT_SECS is invalid")?,
        ),
    };

    let billing = Billing {
        currency: or_default("BILLING_CURRENCY", "NGN").to_ascii_uppercase(),
    };

    let storage = ImageStorageConfig {
        endpoint: required("IMAGE_STORAGE_S3_ENDPOINT")?,
        region: or_default("IMAGE_STORAGE_S3_REGION", "us-east-1"),
        bucket: required("IMAGE_STORAGE_S3_BUCKET")?,
        access_key: required("IMAGE_STORAGE_S3_ACCESS_KEY_ID")?,
        secret_key: required("IMAGE_STORAGE_S3_SECRET_ACCESS_KEY")?,
        prefix: or_default("IMAGE_STORAGE_S3_KEY_PREFIX", "profiles"),
        public_base_url: required("IMAGE_STORAGE_PUBLIC_BASE_URL")?,
    };

    let frontend = Frontend {
        public_base_url: required("PUBLIC_BASE_URL")?,
        payment_result_url: optional("PAYMENT_RESULT_URL"),
    };

    let matching = Matching {
        swipe_page_size: or_default("SWIPE_PAGE_SIZE", &DEFAULT_SWIPE_PAGE_SIZE.to_string())
            .parse()
            .context("SWIPE_PAGE_SIZE is invalid")?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        auth,
        paystack,
        billing,
        storage,
        frontend,
        matching,
    })
}
