//! Shared fixtures for integration and property tests

#![allow(dead_code)]

pub mod builders;
pub mod repositories;
pub mod strategies;

pub use builders::*;
pub use repositories::*;
