pub mod gallery;
pub mod matching;
pub mod notifications;
pub mod payments;
pub mod profiles;
pub mod subscriptions;
