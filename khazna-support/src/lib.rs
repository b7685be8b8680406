//! # Khazna Support
//!
//! Shared utilities for the Khazna DI framework.
//!
//! This crate provides:
//! - Text rendering for error messages (build chains, suggestions)
//! - Type-name shortening used to derive class identifiers

pub mod rendering;
