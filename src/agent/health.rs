// SYNOID Health Check
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Verifies the external binaries the pipeline shells out to.

use tracing::{info, warn};

pub const REQUIRED_BINARIES: [&str; 2] = ["ffmpeg", "ffprobe"];

/// Names of required binaries that are not on PATH.
pub fn check_dependencies() -> Vec<String> {
    let mut missing = Vec::new();
    for bin in REQUIRED_BINARIES {
        match which::which(bin) {
            Ok(path) => info!("[HEALTH] ✅ {} found at {:?}", bin, path),
            Err(_) => {
                warn!("[HEALTH] ⚠️ {} not found on PATH", bin);
                missing.push(bin.to_string());
            }
        }
    }
    missing
}
