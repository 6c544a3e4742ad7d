//! Client core for a food-photo nutrition scanner: onboarding, profile,
//! scan results and their derived metrics, persistence, and a local HTTP
//! facade over all of it.

pub mod app;
pub mod config;
pub mod error;
pub mod onboarding;
pub mod profile;
pub mod routes;
pub mod scan;
pub mod session;
pub mod state;
pub mod store;
