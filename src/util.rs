use crate::dispatch::InvocationContext;
use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};

/// Return the platform-appropriate config directory for run.
/// - macOS: ~/.run
/// - Linux: ~/.config/run (or $XDG_CONFIG_HOME/run)
/// - Windows: %APPDATA%\\Run
pub fn config_dir(ctx: &InvocationContext) -> Result<PathBuf> {
    let base = match env::consts::OS {
        "macos" => ctx.home_dir().map(|h| h.join(".run")),
        "windows" => match ctx.var("APPDATA") {
            Some(appdata) => Some(PathBuf::from(appdata).join("Run")),
            None => ctx
                .home_dir()
                .map(|h| h.join("AppData").join("Roaming").join("Run")),
        },
        _ => match ctx.var("XDG_CONFIG_HOME").filter(|x| !x.is_empty()) {
            Some(xdg) => Some(PathBuf::from(xdg).join("run")),
            None => ctx.home_dir().map(|h| h.join(".config").join("run")),
        },
    };

    base.ok_or_else(|| anyhow::anyhow!("could not resolve home directory"))
}

/// Convert a path into a display-friendly one, relative to `cwd` when possible.
pub fn display_path(path: impl AsRef<Path>, cwd: &Path) -> String {
    let path = path.as_ref();
    if let Ok(rel) = path.strip_prefix(cwd) {
        if !rel.as_os_str().is_empty() {
            return format!("./{}", rel.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ctx_with(env: &[(&str, &str)]) -> InvocationContext {
        InvocationContext {
            env: env
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
            ..Default::default()
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn config_dir_prefers_xdg() {
        let ctx = ctx_with(&[("HOME", "/home/dev"), ("XDG_CONFIG_HOME", "/xdg")]);
        assert_eq!(config_dir(&ctx).unwrap(), PathBuf::from("/xdg/run"));

        let ctx = ctx_with(&[("HOME", "/home/dev")]);
        assert_eq!(
            config_dir(&ctx).unwrap(),
            PathBuf::from("/home/dev/.config/run")
        );
    }

    #[test]
    fn display_path_is_relative_to_cwd() {
        let cwd = Path::new("/work/project");
        assert_eq!(
            display_path(cwd.join("Runfile.yaml"), cwd),
            "./Runfile.yaml"
        );
        assert_eq!(display_path("/elsewhere/x", cwd), "/elsewhere/x");
    }
}
