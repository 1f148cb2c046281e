pub mod app;
pub mod config;
pub mod content;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod history;
pub mod runtime;
pub mod telemetry;
