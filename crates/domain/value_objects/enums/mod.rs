pub mod genders;
pub mod looking_for;
pub mod notification_kinds;
pub mod payment_statuses;
