//! Project-wide constants used across multiple modules.
//!
//! This module centralizes constant definitions to avoid duplication and ensure
//! consistency across the codebase.

/// Audio file extensions the annotator can open
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac"];

/// Default segment window length in milliseconds
pub const DEFAULT_WINDOW_MS: u64 = 5000;

/// Column order of the annotation table's backing file
pub const STORE_COLUMNS: [&str; 6] = [
    "Audio Name",
    "File Location",
    "Segment Number",
    "Segment Time",
    "Class ID",
    "Class Name",
];
