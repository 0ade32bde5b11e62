//! Request handlers of the demo server.

pub mod demo;
pub mod health;

pub use demo::{home_handler, people_handler, services_handler};
pub use health::health_handler;
