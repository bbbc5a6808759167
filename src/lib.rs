// Public API for integration tests and library usage

pub mod api;
pub mod auth;
pub mod config;
pub mod content;
pub mod protocol;
pub mod rotation;
pub mod selector;
pub mod session;
pub mod state;
pub mod types;
pub mod ws;

// Re-export broadcast for testing
pub mod broadcast;
