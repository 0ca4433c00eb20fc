//! File System Utilities
//!
//! Configuration directory lookup and migration of the legacy dot-directory.

use crate::constants::APP_NAME;
use crate::error::{Error, Result};
use directories::ProjectDirs;
use home::home_dir;
use std::fs;
use std::path::{Path, PathBuf};

/// Get or create the application's configuration directory
///
/// Platform-specific locations:
/// - **Linux**: `~/.config/delivery-console/` or `$XDG_CONFIG_HOME/delivery-console/`
/// - **macOS**: `~/Library/Application Support/com.delivery.delivery-console/`
/// - **Windows**: `C:\Users\<User>\AppData\Roaming\delivery\delivery-console\config\`
pub fn get_or_create_config_dir() -> Result<PathBuf> {
    let Some(project_dirs) = ProjectDirs::from("com", "delivery", APP_NAME) else {
        return Err(Error::Invalid {
            message: "Could not determine project directories".to_string(),
        });
    };

    let config_dir = project_dirs.config_dir();
    if !config_dir.exists() {
        fs::create_dir_all(config_dir)?;
    }

    if let Some(home) = home_dir() {
        let legacy = home.join(format!(".{APP_NAME}"));
        if legacy.exists() {
            if let Err(e) = migrate_legacy_dir(&legacy, config_dir) {
                tracing::warn!("Failed to migrate {}: {}", legacy.display(), e);
            }
        }
    }

    Ok(config_dir.to_path_buf())
}

/// Move top-level files from `legacy` into `config_dir`, then remove `legacy`.
///
/// Files already present in `config_dir` are left untouched.
pub fn migrate_legacy_dir(legacy: &Path, config_dir: &Path) -> Result<usize> {
    let mut copied = 0;
    for entry in fs::read_dir(legacy)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            continue;
        }

        let target = config_dir.join(entry.file_name());
        if target.exists() {
            continue;
        }
        fs::copy(entry.path(), &target)?;
        copied += 1;
    }

    fs::remove_dir_all(legacy)?;
    tracing::info!("Migrated {} file(s) from {}", copied, legacy.display());
    Ok(copied)
}
