use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config not found at {}", .path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("config at {} is corrupt: {source}", .path.display())]
    ConfigCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("fetching {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("fetching {url} timed out after {}s", .after.as_secs_f64())]
    Timeout { url: String, after: Duration },

    #[error("feed {url} could not be parsed: {reason}")]
    Parse { url: String, reason: String },

    #[error("command `{command}` {}", describe_failure(.status, .spawn))]
    Execution {
        command: String,
        status: Option<ExitStatus>,
        spawn: Option<io::Error>,
    },

    #[error("{action} {} failed: {source}", .path.display())]
    Persistence {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("feed {0} is already watched")]
    DuplicateFeed(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HOME is not set; pass --config explicitly")]
    MissingHome,
}

impl Error {
    pub fn persistence(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Persistence { action, path: path.into(), source }
    }

    /// Process exit code reported for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::DuplicateFeed(_) | Error::InvalidUrl(_) | Error::MissingHome => 2,
            Error::ConfigNotFound { .. } | Error::ConfigCorrupt { .. } => 3,
            Error::Network { .. } | Error::Timeout { .. } | Error::Parse { .. } => 4,
            Error::HttpClient(_) => 4,
            Error::Execution { .. } => 5,
            Error::Persistence { .. } => 6,
        }
    }
}

fn describe_failure(status: &Option<ExitStatus>, spawn: &Option<io::Error>) -> String {
    if let Some(err) = spawn {
        return format!("could not be spawned: {err}");
    }
    match status {
        Some(st) => match st.code() {
            Some(code) => format!("exited with status {code}"),
            None => format!("was terminated ({st})"),
        },
        None => "failed".to_string(),
    }
}
