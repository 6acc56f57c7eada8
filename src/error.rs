// src/error.rs

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures that abort (or are reported by) an ingestion run.
///
/// Per-field cleanup problems are deliberately absent: they resolve to `None`
/// inside the normalizer and never surface as errors.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read `{source_name}` as a table: {reason}")]
    StructuralLoad { source_name: String, reason: String },

    #[error("`{source_name}` has no column mapping to ref_id")]
    MissingKeyColumn { source_name: String },

    #[error("no `{extension}` link containing `{keyword}` found on {page}")]
    Discovery {
        page: String,
        extension: String,
        keyword: String,
    },

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("writing {path:?} failed: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("notification failed: {0}")]
    Notification(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestError {
    pub fn structural(source_name: impl Into<String>, reason: impl ToString) -> Self {
        IngestError::StructuralLoad {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: io::Error) -> Self {
        IngestError::Persistence {
            path: path.into(),
            source,
        }
    }
}
