//! Transparency module for the FocusAI monitor.
//!
//! Tracks and exposes what the monitor did during a session, so that
//! invigilators and students can see exactly what was analyzed and captured.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log_with_persistence, PersistedStats, SharedTransparencyLog, TransparencyLog,
    TransparencyStats,
};
