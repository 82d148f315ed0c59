use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Runs an expanded command line to completion.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn run(&self, command_line: &str) -> Result<()>;
}

/// `sh -c <line>` with inherited stdio. No timeout: a hung command stalls the run.
#[derive(Debug, Clone)]
pub struct ShellDispatcher {
    shell: String,
}

impl Default for ShellDispatcher {
    fn default() -> Self {
        Self { shell: "sh".to_string() }
    }
}

impl ShellDispatcher {
    #[cfg(test)]
    fn with_shell(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }
}

#[async_trait]
impl Dispatcher for ShellDispatcher {
    async fn run(&self, command_line: &str) -> Result<()> {
        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command_line)
            .status()
            .await
            .map_err(|e| Error::Execution { command: command_line.to_string(), status: None, spawn: Some(e) })?;

        if !status.success() {
            return Err(Error::Execution { command: command_line.to_string(), status: Some(status), spawn: None });
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn runs_through_shell() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let line = format!("printf '%s' \"a b\" > {}", out.display());

        ShellDispatcher::default().run(&line).await.unwrap();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "a b");
    }

    #[tokio::test]
    async fn non_zero_exit_is_execution_error() {
        let err = ShellDispatcher::default().run("exit 3").await.unwrap_err();
        match err {
            Error::Execution { status: Some(st), spawn: None, .. } => assert_eq!(st.code(), Some(3)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_shell_is_spawn_error() {
        let err = ShellDispatcher::with_shell("/definitely/not/a/shell").run("true").await.unwrap_err();
        assert!(matches!(err, Error::Execution { spawn: Some(_), .. }));
    }
}
