//! Command handlers.

pub mod submit;
