//! Core traits, settings, and module registry shared by the bookstore crates.

pub mod module;
pub mod registry;
pub mod settings;

pub use bookstore_db::Migration;
pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
