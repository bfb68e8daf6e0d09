//! Common test utilities for Longshore CLI tests.
//!
//! This module provides `TestEnv`, an isolated project/home directory pair
//! with helpers to run the longshore binary completely offline.

pub mod env;

pub use env::*;
