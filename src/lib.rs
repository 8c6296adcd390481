//! Onboarding and account-management backend for students, service
//! providers and administrators.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
