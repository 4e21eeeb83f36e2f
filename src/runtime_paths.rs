use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{PREFERENCES_FILE, ROOT_DIR_ENV};

/// Application data root: `RENTALA_ROOT` override first, then `~/.rentala`.
pub(crate) fn default_app_root_dir() -> Option<PathBuf> {
    if let Ok(root) = env::var(ROOT_DIR_ENV) {
        let path = PathBuf::from(root.trim());
        if !path.as_os_str().is_empty() {
            return Some(path);
        }
    }

    home::home_dir().map(|home| home.join(".rentala"))
}

pub(crate) fn preferences_path(root_dir: &Path) -> PathBuf {
    root_dir.join("data").join(PREFERENCES_FILE)
}

pub(crate) fn logs_dir(root_dir: &Path) -> PathBuf {
    root_dir.join("logs")
}
