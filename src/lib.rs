#![allow(non_snake_case)]

// Modules shared by the `producer` and `consumer` binaries.
pub mod config;
pub mod data_model;
pub mod error;
pub mod session;
pub mod topology;
pub mod utils;

pub mod consumer_logic;
pub mod producer_logic;

pub use error::{DemoError, Result};
