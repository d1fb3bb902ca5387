//! Judi: a terminal client for a legal-assistant classification service.
//!
//! The library holds everything testable; `src/main.rs` only parses flags,
//! wires config, logging and storage together, and hands off to
//! [`console::run`].

pub mod app;
pub mod backend;
pub mod compose;
pub mod config;
pub mod console;
pub mod consultation;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod logger;
pub mod payload;
pub mod render;
pub mod storage;
pub mod store;
