//! npm executable resolution and registry configuration commands.
//!
//! The executable is located once, by probing an ordered candidate list
//! with a short `--version` query; the first working candidate is bound
//! for every later call. npm itself owns the active registry value, this
//! module only reads and writes it through `npm config`.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::registry::catalog::OFFICIAL_REGISTRY_URL;

/// Timeout for the `--version` probe of each candidate.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for `npm config` invocations.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum NpmError {
    #[error("no usable npm executable found; install Node.js and npm")]
    NotFound,

    #[error("npm could not be started: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("npm command timed out")]
    Timeout,

    #[error("npm command failed: {stderr}")]
    CommandFailed { stderr: String },

    #[error("npm produced unparseable output: {0}")]
    BadOutput(#[from] serde_json::Error),
}

/// Ordered probe list: bare command names first, then known install
/// locations for layouts where npm is not on PATH.
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = Vec::new();

    #[cfg(windows)]
    {
        candidates.push(PathBuf::from("npm.cmd"));
        candidates.push(PathBuf::from("npm"));

        let mut install_dirs: Vec<PathBuf> = vec![
            PathBuf::from(r"C:\Program Files\nodejs"),
            PathBuf::from(r"C:\Program Files (x86)\nodejs"),
        ];
        if let Some(home) = dirs::home_dir() {
            install_dirs.push(home.join("AppData").join("Roaming").join("npm"));
            install_dirs.push(home.join("scoop").join("apps").join("nodejs").join("current"));
            install_dirs.push(home.join("scoop").join("shims"));
        }
        for dir in install_dirs {
            candidates.push(dir.join("npm.cmd"));
            candidates.push(dir.join("npm"));
        }
    }

    #[cfg(not(windows))]
    {
        candidates.push(PathBuf::from("npm"));
        for dir in ["/usr/local/bin", "/usr/bin", "/opt/homebrew/bin"] {
            candidates.push(Path::new(dir).join("npm"));
        }
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".local").join("bin").join("npm"));
        }
    }

    candidates
}

/// Walk `candidates` in order and bind the first one the probe accepts.
///
/// The probe is injected so resolution is testable without spawning
/// processes.
pub async fn resolve_candidates<F, Fut>(candidates: &[PathBuf], probe: F) -> Result<PathBuf, NpmError>
where
    F: Fn(PathBuf) -> Fut,
    Fut: Future<Output = bool>,
{
    for candidate in candidates {
        if probe(candidate.clone()).await {
            return Ok(candidate.clone());
        }
    }
    Err(NpmError::NotFound)
}

async fn probe_version(path: PathBuf) -> bool {
    let result = timeout(PROBE_TIMEOUT, Command::new(&path).arg("--version").output()).await;
    matches!(result, Ok(Ok(output)) if output.status.success())
}

/// Bound npm executable plus a cached hint of the active registry.
///
/// The hint is refreshed only by this client's own calls; the shelled-out
/// query remains ground truth and `get_active` re-derives it on demand.
pub struct NpmClient {
    command: PathBuf,
    current: RwLock<String>,
}

impl NpmClient {
    /// Resolve the executable and prime the cached registry value.
    ///
    /// Fails when no candidate answers the version probe or the initial
    /// registry query fails; the application must not start without it.
    pub async fn resolve() -> Result<Self, NpmError> {
        let command = resolve_candidates(&candidate_paths(), probe_version).await?;
        tracing::info!("Using npm executable {:?}", command);
        let client = Self {
            command,
            current: RwLock::new(String::new()),
        };
        client.get_active().await?;
        Ok(client)
    }

    pub fn command(&self) -> &Path {
        &self.command
    }

    /// Last registry value seen by this client, without shelling out.
    pub fn current_hint(&self) -> String {
        self.current.read().map(|g| g.clone()).unwrap_or_default()
    }

    /// `npm config get registry`, trimmed stdout. Refreshes the hint.
    pub async fn get_active(&self) -> Result<String, NpmError> {
        let output = self.run(&["config", "get", "registry"]).await?;
        let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if let Ok(mut guard) = self.current.write() {
            *guard = url.clone();
        }
        Ok(url)
    }

    /// `npm config set registry <url>`. Updates the hint on success.
    pub async fn set_active(&self, url: &str) -> Result<(), NpmError> {
        self.run(&["config", "set", "registry", url]).await?;
        if let Ok(mut guard) = self.current.write() {
            *guard = url.to_string();
        }
        Ok(())
    }

    pub async fn reset_to_default(&self) -> Result<(), NpmError> {
        self.set_active(OFFICIAL_REGISTRY_URL).await
    }

    /// Full npm configuration via `npm config list --json`.
    pub async fn npm_config(&self) -> Result<serde_json::Value, NpmError> {
        let output = self.run(&["config", "list", "--json"]).await?;
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output, NpmError> {
        let output = timeout(
            COMMAND_TIMEOUT,
            Command::new(&self.command).args(args).output(),
        )
        .await
        .map_err(|_| NpmError::Timeout)??;

        if !output.status.success() {
            return Err(NpmError::CommandFailed {
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolution_binds_first_working_candidate() {
        let candidates = vec![
            PathBuf::from("broken-npm"),
            PathBuf::from("good-npm"),
            PathBuf::from("also-good-npm"),
        ];
        let resolved = resolve_candidates(&candidates, |path| async move {
            path.to_string_lossy().starts_with("good")
                || path.to_string_lossy().starts_with("also")
        })
        .await
        .unwrap();
        assert_eq!(resolved, PathBuf::from("good-npm"));
    }

    #[tokio::test]
    async fn test_resolution_fails_when_nothing_works() {
        let candidates = vec![PathBuf::from("a"), PathBuf::from("b")];
        let err = resolve_candidates(&candidates, |_| async { false })
            .await
            .unwrap_err();
        assert!(matches!(err, NpmError::NotFound));
    }

    #[test]
    fn test_candidate_list_starts_with_bare_command() {
        let candidates = candidate_paths();
        assert!(!candidates.is_empty());
        let first = candidates[0].to_string_lossy();
        assert!(first.starts_with("npm"));
    }
}
