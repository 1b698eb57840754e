//! mdpreview: render markdown to HTML and serve it to a local browser.
//!
//! The heart of the crate is [`PreviewServer`], a loopback-only HTTP server
//! holding rendered documents as short-lived preview sessions. The binary
//! wraps it in a small CLI; the library surface is usable on its own.

pub mod browser;
pub mod config;
pub mod http;
pub mod render;
pub mod server;
pub mod store;

pub use config::{ConfigUpdate, ServerConfig};
pub use server::{PreviewServer, ServerError, ServerStatus};
