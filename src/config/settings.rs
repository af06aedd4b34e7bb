use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RunfileSettings {
    #[serde(default = "default_runfile_name")]
    pub name: String,
}

fn default_runfile_name() -> String {
    "Runfile.yaml".to_string()
}

impl Default for RunfileSettings {
    fn default() -> Self {
        RunfileSettings {
            name: default_runfile_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ShellSettings {
    #[serde(default = "default_shell_program")]
    pub program: String,
    #[serde(default = "default_shell_args")]
    pub args: Vec<String>,
}

fn default_shell_program() -> String {
    "sh".to_string()
}

fn default_shell_args() -> Vec<String> {
    vec!["-c".to_string()]
}

impl Default for ShellSettings {
    fn default() -> Self {
        ShellSettings {
            program: default_shell_program(),
            args: default_shell_args(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InstallSettings {
    #[serde(default = "default_install_dir")]
    pub dir: String,
    #[serde(default = "default_rc_file")]
    pub rc_file: String,
}

fn default_install_dir() -> String {
    "~/.local/bin".to_string()
}

fn default_rc_file() -> String {
    "~/.bashrc".to_string()
}

impl Default for InstallSettings {
    fn default() -> Self {
        InstallSettings {
            dir: default_install_dir(),
            rc_file: default_rc_file(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub runfile: RunfileSettings,
    #[serde(default)]
    pub shell: ShellSettings,
    #[serde(default)]
    pub install: InstallSettings,
}

pub const SETTINGS_FILE: &str = "settings.yaml";

/// Load settings from `dir`. A missing file yields defaults.
pub fn load_settings(dir: &Path) -> Result<(Settings, PathBuf)> {
    let path = dir.join(SETTINGS_FILE);
    if !path.exists() {
        return Ok((Settings::default(), path));
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed reading settings {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok((Settings::default(), path));
    }
    let mut settings: Settings = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed parsing settings {}", path.display()))?;
    // Empty strings mean "unset"
    let defaults = Settings::default();
    if settings.runfile.name.is_empty() {
        settings.runfile.name = defaults.runfile.name;
    }
    if settings.shell.program.is_empty() {
        settings.shell = defaults.shell;
    }
    Ok((settings, path))
}

/// Expand a leading `~/` against `home`.
pub fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ if path == "~" => home.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(path)),
        _ => PathBuf::from(path),
    }
}
