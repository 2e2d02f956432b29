//! Shared utilities for the LilyChat workspace.

pub mod logger;
pub mod time;
