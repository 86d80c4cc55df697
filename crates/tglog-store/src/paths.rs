//! Default locations for the credential file and the logs.
//!
//! Platform directories are used when they can be determined:
//! - Linux:   `~/.config/tglog` and `~/.local/share/tglog/logs`
//! - macOS:   `~/Library/Application Support/org.tglog.tglog/...`
//! - Windows: `{FOLDERID_RoamingAppData}\tglog\tglog\{config,data}`
//!
//! Otherwise both fall back to directories relative to the working directory.

use std::path::PathBuf;

use directories::ProjectDirs;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "tglog", "tglog")
}

pub fn default_config_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./config"))
}

pub fn default_logs_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Make a peer's directory name safe to use as a single path component.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" => "_".to_string(),
        "." | ".." => cleaned.replace('.', "_"),
        _ => cleaned,
    }
}
