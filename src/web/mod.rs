pub mod admin;
pub mod api;
pub mod auth;
pub mod error;
pub mod forms;
pub mod pages;
pub mod pwa;
pub mod router;
pub mod state;
pub mod templates;
pub mod views;

pub use router::app_router;
pub use state::AppState;
