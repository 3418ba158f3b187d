//! Git pre-push hook installation

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Contents of the installed hook; git rejects the push on a non-zero exit
pub const HOOK_SCRIPT: &str = "#!/bin/sh\n# Installed by qgate. Runs the local gate before every push.\nexec qgate pre-push\n";

#[derive(Debug, Error)]
pub enum HookError {
    #[error("{0} is not the root of a git repository")]
    NotARepository(PathBuf),

    #[error("a pre-push hook already exists at {0} (use --force to replace it)")]
    Exists(PathBuf),

    #[error("failed to write hook: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `.git/hooks/pre-push` under `repo`, returning the hook path
pub fn install_hook(repo: &Path, force: bool) -> Result<PathBuf, HookError> {
    let git_dir = repo.join(".git");
    if !git_dir.is_dir() {
        return Err(HookError::NotARepository(repo.to_path_buf()));
    }

    let hooks = git_dir.join("hooks");
    std::fs::create_dir_all(&hooks)?;

    let path = hooks.join("pre-push");
    if path.exists() && !force {
        return Err(HookError::Exists(path));
    }

    std::fs::write(&path, HOOK_SCRIPT)?;
    make_executable(&path)?;
    info!(path = %path.display(), "Installed pre-push hook");
    Ok(path)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
