// SYNOID Chaos Cut Library
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod agent;
pub mod config;
pub mod error;

pub use config::ChaosConfig;
pub use error::{ChaosError, ChaosResult};
