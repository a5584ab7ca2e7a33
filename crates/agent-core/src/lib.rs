//! Core abstractions shared by the analyst agents
//!
//! This crate defines the [`Agent`] trait, the key-value [`Context`] passed
//! along every agent call, and the common [`Error`] type.

pub mod agent;
pub mod context;
pub mod error;

pub use agent::Agent;
pub use context::Context;
pub use error::{Error, Result};
