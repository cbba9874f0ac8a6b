use crates::{infra::storages::image_storage::ImageStorageConfig, payments::paystack_client::PaystackConfig};

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub auth: Auth,
    pub paystack: PaystackConfig,
    pub billing: Billing,
    pub storage: ImageStorageConfig,
    pub frontend: Frontend,
    pub matching: Matching,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}

#[derive(Debug, Clone)]
pub struct Billing {
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct Frontend {
    /// Public site address used for profile links in contact greetings.
    pub public_base_url: String,
    /// Where the payment callback sends the browser after verification. Unset returns JSON.
    pub payment_result_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Matching {
    pub swipe_page_size: usize,
}
