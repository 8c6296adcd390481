//! Application services layer.

pub mod admins;
pub mod applicants;
pub mod catalog;
pub mod error;
pub mod listing;
pub mod onboarding;
pub mod pagination;
pub mod profiles;
pub mod repos;
pub mod roles;
pub mod snapshots;
pub mod uploads;
