use std::path::PathBuf;

use crate::error::{Error, Result};

const APP_DIR: &str = "rssd";
const FILE_NAME: &str = "config.json";

/// Resolves the config location: explicit override, then
/// `$XDG_CONFIG_HOME/rssd/config.json`, then `$HOME/.config/rssd/config.json`.
pub fn resolve(explicit: Option<PathBuf>) -> Result<PathBuf> {
    resolve_with(explicit, |name| std::env::var(name).ok())
}

pub(crate) fn resolve_with<F>(explicit: Option<PathBuf>, lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(p) = explicit {
        return Ok(p);
    }
    let base = match lookup("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        Some(xdg) => PathBuf::from(xdg),
        None => {
            let home = lookup("HOME").filter(|v| !v.is_empty()).ok_or(Error::MissingHome)?;
            PathBuf::from(home).join(".config")
        }
    };
    Ok(base.join(APP_DIR).join(FILE_NAME))
}
