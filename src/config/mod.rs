// src/config/mod.rs
pub mod runtime;

pub use runtime::RuntimeConfig;
