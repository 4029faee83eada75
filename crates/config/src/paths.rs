//! Path utilities

use std::path::PathBuf;

/// Per-user data directory (~/.machina)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".machina"))
        .unwrap_or_else(|| PathBuf::from(".machina"))
}

/// Default config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Directory holding the running executable
pub fn install_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
