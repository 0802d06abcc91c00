use std::io;
use std::path::PathBuf;

/// Everything that can stop a launch.
///
/// `main` is the only place that turns one of these into a process exit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file ({}) error: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error(
        "invalid arg, input index {index} out of range, check your config ({}) or use search mode",
        path.display()
    )]
    Range { index: usize, path: PathBuf },

    #[error("selected line has no host number: {line:?}")]
    Selection { line: String },

    #[error("could not find `{tool}` in PATH, please install it")]
    ToolResolution { tool: String },

    #[error("failed to write login script {}", path.display())]
    ScriptIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to run {tool}")]
    Launch {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("terminal error")]
    Terminal(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
