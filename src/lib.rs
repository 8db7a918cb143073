pub mod app;
pub mod chat;
pub mod config;
pub mod error;
pub mod handlers;
pub mod model_registry;
pub mod oauth;
pub mod sessions;
pub mod stream;
pub mod upstream;
