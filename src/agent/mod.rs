// SYNOID Agent Modules
// Copyright (c) 2026 Xing_The_Creator | SYNOID

pub mod audio_tools;
pub mod compiler;
pub mod drift;
pub mod health;
pub mod interval_scheduler;
pub mod onset_filter;
pub mod production_tools;
pub mod segment_extractor;
pub mod sequencer;
pub mod source_selector;
pub mod source_tools;
pub mod video_stitcher;
