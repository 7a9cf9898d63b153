//! Errors raised while assembling a site.

use std::path::PathBuf;

use crate::templates::TemplateError;

/// Errors that can occur while assembling a documentation site.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// An external collaborator exited with a non-zero status.
    #[error("Command `{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed version tag: {tag:?}")]
    MalformedVersionTag { tag: String },

    #[error("Template not found: {}", path.display())]
    TemplateMissing { path: PathBuf },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Build produced no output at {}", path.display())]
    BuildOutputMissing { path: PathBuf },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl SiteError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| SiteError::Io { path, source }
    }
}
