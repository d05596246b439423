//! Command-line front ends
//!
//! Only available with the "cli" feature.

pub mod batch;
mod config;
mod dialogs;
#[path = "main.rs"]
mod main_impl;
mod progress;

pub use main_impl::{main, Cli, CliOutputFormat};
