pub mod contact;
pub mod enums;
pub mod images;
pub mod matching;
pub mod notifications;
pub mod payments;
pub mod plans;
pub mod profiles;
pub mod subscriptions;
