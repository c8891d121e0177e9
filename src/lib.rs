pub mod models;
pub mod error;
pub mod config;
pub mod normalize;
pub mod analytics;
pub mod paging;
pub mod session;
pub mod upload;
pub mod api;
pub mod auth;
pub mod charts;

// Browser-only glue and pages; everything above also builds natively
#[cfg(target_arch = "wasm32")]
pub mod browser;
#[cfg(target_arch = "wasm32")]
pub mod app;
