use miette::Diagnostic;
use thiserror::Error;

/// Main error type for ucss operations.
///
/// Every variant is fatal: a build that returns one of these has produced
/// no stylesheet at all. Recoverable problems (unreadable files, unknown
/// class names) are reported through [`crate::diagnostics`] instead.
#[derive(Error, Diagnostic, Debug)]
pub enum UcssError {
    #[error("IO error: {0}")]
    #[diagnostic(code(ucss::io))]
    IoError(#[from] std::io::Error),

    #[error("IO error with {path}: {message}")]
    #[diagnostic(code(ucss::io))]
    Io {
        path: std::path::PathBuf,
        message: String,
    },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(ucss::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    #[error("Report error: {0}")]
    #[diagnostic(code(ucss::report))]
    Report(#[from] serde_json::Error),

    #[error("Plugin '{plugin}' failed: {message}")]
    #[diagnostic(code(ucss::plugin))]
    Plugin {
        plugin: String,
        message: String,
        #[help]
        help: Option<String>,
    },
}

impl UcssError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        UcssError::Config {
            message: message.into(),
            help: None,
        }
    }

    pub(crate) fn plugin(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        UcssError::Plugin {
            plugin: plugin.into(),
            message: message.into(),
            help: None,
        }
    }
}

pub type Result<T> = std::result::Result<T, UcssError>;
