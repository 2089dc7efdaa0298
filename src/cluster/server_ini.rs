//! Game server ini files editable through the admin API.
//!
//! The admin password in `GameUserSettings.ini` is never handed out and can't
//! be replaced through an upload; the on-disk line always survives a write.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::validate::ValidationError;
use crate::error::Result;

pub const GAME_USER_SETTINGS: &str = "GameUserSettings.ini";
pub const GAME_INI: &str = "Game.ini";
const SERVER_SETTINGS_HEADER: &str = "[ServerSettings]";

static ADMIN_PASSWORD_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ServerAdminPassword=.*$").expect("password line pattern is valid"));

/// The password line with its line break, so removal leaves no blank line.
static ADMIN_PASSWORD_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ServerAdminPassword=[^\r\n]*(?:\r?\n|$)").expect("password entry pattern is valid")
});

pub struct ServerIniFiles {
    dir: PathBuf,
}

impl ServerIniFiles {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, filename: &str) -> Result<PathBuf> {
        match filename {
            GAME_USER_SETTINGS | GAME_INI => Ok(self.dir.join(filename)),
            other => Err(ValidationError::ConfigFile(other.to_string()).into()),
        }
    }

    /// File content, empty if the file doesn't exist yet.
    pub fn read(&self, filename: &str) -> Result<String> {
        let path = self.path_for(filename)?;
        let content = read_or_empty(&path)?;
        if filename == GAME_USER_SETTINGS {
            return Ok(ADMIN_PASSWORD_ENTRY.replace_all(&content, "").into_owned());
        }
        Ok(content)
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<()> {
        let path = self.path_for(filename)?;
        let content = if filename == GAME_USER_SETTINGS {
            let current = read_or_empty(&path)?;
            restore_admin_password(&current, content)
        } else {
            content.to_string()
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        tracing::info!("Wrote {}", path.display());
        Ok(())
    }
}

fn read_or_empty(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

/// Drop any password line from `submitted` and put back the one from `current`.
fn restore_admin_password(current: &str, submitted: &str) -> String {
    let cleaned = ADMIN_PASSWORD_ENTRY.replace_all(submitted, "").into_owned();
    let Some(original) = ADMIN_PASSWORD_LINE.find(current) else {
        return cleaned;
    };
    let line = original.as_str();

    if cleaned.contains(SERVER_SETTINGS_HEADER) {
        cleaned.replacen(
            SERVER_SETTINGS_HEADER,
            &format!("{}\n{}", SERVER_SETTINGS_HEADER, line),
            1,
        )
    } else {
        format!("{}\n\n{}\n{}\n", cleaned, SERVER_SETTINGS_HEADER, line)
    }
}
