//! Core modules for the policy checker.
//!
//! Document parsing, rule gates, configuration and reporting all live here;
//! `lib.rs` only wires them to the CLI.

pub mod assets;
pub mod config;
pub mod error;
pub mod guide;
pub mod imports;
pub mod manifest;
pub mod markers;
pub mod output;
pub mod report;
pub mod rules;
pub mod scaffold;
pub mod structure;
pub mod validate;
pub mod walk;
