//! Fatal build errors
//!
//! Every variant aborts the build. Each one names the file (or output) it
//! came from so the message is actionable on its own.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("unreadable configuration {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("{}: malformed front matter: {reason}", .path.display())]
    FrontMatter { path: PathBuf, reason: String },

    #[error("{}: invalid date {value:?}", .path.display())]
    InvalidDate { path: PathBuf, value: String },

    #[error("{}: no date in front matter or file name", .path.display())]
    MissingDate { path: PathBuf },

    #[error("duplicate slug {slug:?} in {} and {}", .first.display(), .second.display())]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("{target}: template {template:?} failed: {reason}")]
    Template {
        template: String,
        target: String,
        reason: String,
    },

    #[error("{origin}: output path {} leaves the destination directory", .path.display())]
    OutputOutsideDestination { path: PathBuf, origin: String },

    #[error("output conflict: {} is produced by both {first} and {second}", .path.display())]
    OutputConflict {
        path: PathBuf,
        first: String,
        second: String,
    },
}
