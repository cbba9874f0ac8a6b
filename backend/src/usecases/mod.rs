pub mod entitlement;
pub mod gallery;
pub mod matching;
pub mod notifications;
pub mod payments;
pub mod profiles;
