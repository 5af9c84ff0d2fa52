use crate::types::Settings;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "okdtools";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Keys accepted by `config get/set/unset`.
pub const SETTING_KEYS: [&str; 6] = [
    "executable_dir",
    "symlink",
    "ocp_mirror_url",
    "okd_release_url",
    "download_timeout_secs",
    "scratch_dir",
];

pub fn get_config_file_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("OKDTOOLS_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }

    let path = dirs::config_dir()
        .ok_or_else(|| anyhow!("Could not determine config directory"))?
        .join(APP_NAME)
        .join(CONFIG_FILE_NAME);
    tracing::debug!("Config file path: {}", path.display());
    Ok(path)
}

/// Read the settings file as stored, without environment overrides.
pub fn load_stored_settings() -> Result<Settings> {
    let config_path = get_config_file_path()?;

    if !config_path.exists() {
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Could not read config file at {}", config_path.display()))?;

    serde_json::from_str(&content).with_context(|| "Could not parse config file as JSON")
}

/// Effective settings: the settings file with environment overrides applied.
pub fn load_settings() -> Result<Settings> {
    let mut settings = load_stored_settings()?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(dir) = std::env::var("OKDTOOLS_EXECUTABLE_DIR") {
        settings.executable_dir = dir;
    }

    if let Ok(url) = std::env::var("OKDTOOLS_OCP_MIRROR_URL") {
        settings.ocp_mirror_url = url;
    }

    if let Ok(url) = std::env::var("OKDTOOLS_OKD_RELEASE_URL") {
        settings.okd_release_url = url;
    }

    if let Ok(secs) = std::env::var("OKDTOOLS_DOWNLOAD_TIMEOUT_SECS") {
        match secs.parse::<u64>() {
            Ok(secs) => settings.download_timeout_secs = secs,
            Err(_) => tracing::warn!("Ignoring invalid OKDTOOLS_DOWNLOAD_TIMEOUT_SECS '{}'", secs),
        }
    }

    if let Ok(dir) = std::env::var("OKDTOOLS_SCRATCH_DIR") {
        settings.scratch_dir = Some(dir);
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let config_path = get_config_file_path()?;
    let config_dir = config_path
        .parent()
        .ok_or_else(|| anyhow!("Invalid config path"))?;

    fs::create_dir_all(config_dir)?;

    let content = serde_json::to_string_pretty(settings)?;
    fs::write(&config_path, content)?;

    Ok(())
}

pub fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
        .chars()
        .map(|c| {
            if c.is_ascii_uppercase() {
                format!("_{}", c.to_lowercase())
            } else {
                c.to_string()
            }
        })
        .collect::<String>()
        .to_lowercase()
}

pub fn get_setting(settings: &Settings, key: &str) -> Option<String> {
    let value = match key {
        "executable_dir" => settings.executable_dir.clone(),
        "symlink" => settings.symlink.to_string(),
        "ocp_mirror_url" => settings.ocp_mirror_url.clone(),
        "okd_release_url" => settings.okd_release_url.clone(),
        "download_timeout_secs" => settings.download_timeout_secs.to_string(),
        "scratch_dir" => settings.scratch_dir.clone().unwrap_or_default(),
        _ => return None,
    };
    Some(value)
}

pub fn set_setting(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "executable_dir" => settings.executable_dir = value.to_string(),
        "symlink" => settings.symlink = value.to_lowercase() == "true" || value == "1",
        "ocp_mirror_url" => settings.ocp_mirror_url = value.to_string(),
        "okd_release_url" => settings.okd_release_url = value.to_string(),
        "download_timeout_secs" => {
            settings.download_timeout_secs = value
                .parse()
                .map_err(|_| anyhow!("Invalid value for '{}': expected seconds", key))?
        }
        "scratch_dir" => settings.scratch_dir = Some(value.to_string()),
        _ => return Err(invalid_key(key)),
    }
    Ok(())
}

pub fn unset_setting(settings: &mut Settings, key: &str) -> Result<()> {
    let defaults = Settings::default();
    match key {
        "executable_dir" => settings.executable_dir = defaults.executable_dir,
        "symlink" => settings.symlink = defaults.symlink,
        "ocp_mirror_url" => settings.ocp_mirror_url = defaults.ocp_mirror_url,
        "okd_release_url" => settings.okd_release_url = defaults.okd_release_url,
        "download_timeout_secs" => settings.download_timeout_secs = defaults.download_timeout_secs,
        "scratch_dir" => settings.scratch_dir = defaults.scratch_dir,
        _ => return Err(invalid_key(key)),
    }
    Ok(())
}

fn invalid_key(key: &str) -> anyhow::Error {
    anyhow!(
        "'{}' is not a valid configuration setting. Valid settings: {}",
        key,
        SETTING_KEYS.join(", ")
    )
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => Path::new(path).to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("executable-dir"), "executable_dir");
        assert_eq!(normalize_key("downloadTimeoutSecs"), "download_timeout_secs");
        assert_eq!(normalize_key("ocp_mirror_url"), "ocp_mirror_url");
    }

    #[test]
    fn test_set_get_unset() {
        let mut settings = Settings::default();

        set_setting(&mut settings, "symlink", "TRUE").unwrap();
        set_setting(&mut settings, "download_timeout_secs", "30").unwrap();
        set_setting(&mut settings, "scratch_dir", "/var/tmp").unwrap();
        assert_eq!(get_setting(&settings, "symlink").unwrap(), "true");
        assert_eq!(get_setting(&settings, "download_timeout_secs").unwrap(), "30");
        assert_eq!(settings.scratch_root(), PathBuf::from("/var/tmp"));

        unset_setting(&mut settings, "download_timeout_secs").unwrap();
        assert_eq!(settings.download_timeout_secs, Settings::default().download_timeout_secs);

        assert!(set_setting(&mut settings, "download_timeout_secs", "soon").is_err());
        assert!(set_setting(&mut settings, "install_dir", "/x").is_err());
        assert!(get_setting(&settings, "install_dir").is_none());
    }

    #[test]
    fn test_every_key_is_gettable() {
        let settings = Settings::default();
        for key in SETTING_KEYS {
            assert!(get_setting(&settings, key).is_some(), "{}", key);
        }
    }

    #[test]
    fn test_expand_home() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/bin"), home.join("bin"));
        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("/usr/local/bin"), PathBuf::from("/usr/local/bin"));
        assert_eq!(expand_home("~other/bin"), PathBuf::from("~other/bin"));
    }
}
