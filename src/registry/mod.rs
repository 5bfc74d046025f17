//! # Handler Registry
//!
//! Consolidates directly-registered handlers and handlers supplied by
//! pluggable locators into one lookup surface.

pub mod handler_registry;

pub use handler_registry::HandlerRegistry;
