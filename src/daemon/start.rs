use std::path::Path;

use crate::config::config::Config;
use crate::error::{Error, Result};

pub fn print_banner(config: &Config) {
    let ascii_art = format!(
        r#"
        __           __               __
  _____/ /_  _______/ /____  _____   ____/ /
 / ___/ / / / / ___/ __/ _ \/ ___/  / __  /
/ /__/ / /_/ (__  ) /_/  __/ /     / /_/ /
\___/_/\__,_/____/\__/\___/_/      \__,_/

clusterd v{}
cluster: {}
"#,
        config.get_version(),
        config.cluster.dir.display()
    );

    println!("{}", ascii_art);
}

/// Make sure the daemon's own state directories exist and are writable.
///
/// The cluster directory belongs to the compose project and is only checked.
pub async fn check_storage(config: &Config) -> Result<()> {
    if !config.cluster.dir.is_dir() {
        tracing::warn!(
            "Cluster directory {} does not exist yet; config routes will fail until it does",
            config.cluster.dir.display()
        );
    }

    let state_dirs = [
        config.cluster.cache_file.parent(),
        config.cluster.profiles_db.parent(),
    ];

    for path in state_dirs.into_iter().flatten() {
        ensure_writable_dir(path).await?;
    }

    Ok(())
}

async fn ensure_writable_dir(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Ok(());
    }
    tracing::debug!("Trying for {}", path.display());

    if !path.exists() {
        tracing::info!("Creating storage directory: {}", path.display());
        tokio::fs::create_dir_all(path).await?;
    }

    let metadata = tokio::fs::metadata(path).await?;
    if !metadata.is_dir() {
        tracing::error!("Storage path is not a directory: {}", path.display());
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotADirectory,
            format!("Storage path is not a directory: {}", path.display()),
        )));
    }
    if metadata.permissions().readonly() {
        tracing::error!("Storage path is not writable: {}", path.display());
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("Storage path is not writable: {}", path.display()),
        )));
    }

    tracing::info!("Storage path ready: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_state_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.cluster.dir = dir.path().to_path_buf();
        config.cluster.cache_file = dir.path().join("state/servers.json");
        config.cluster.profiles_db = dir.path().join("state/db/profiles.db");

        check_storage(&config).await.unwrap();
        assert!(dir.path().join("state/db").is_dir());
    }

    #[tokio::test]
    async fn file_in_place_of_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("state"), "").unwrap();
        let mut config = Config::default();
        config.cluster.dir = dir.path().to_path_buf();
        config.cluster.cache_file = dir.path().join("state/servers.json");
        config.cluster.profiles_db = dir.path().join("profiles.db");

        assert!(check_storage(&config).await.is_err());
    }
}
