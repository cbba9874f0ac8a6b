pub mod images;
pub mod likes;
pub mod notifications;
pub mod payment_transactions;
pub mod plans;
pub mod profiles;
pub mod storage;
pub mod subscriptions;
