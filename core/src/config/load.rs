use std::path::{Path, PathBuf};

use super::types::AppConfig;
use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Loads configuration from `explicit` (which must exist), else from
/// `./config.toml`, then `~/.deploy-hook/config.toml`, else defaults.
/// `DEPLOY_HOOK_*` environment overrides are applied last.
pub fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match explicit {
        Some(p) if !p.exists() => return Err(ConfigError::NotFound(p.display().to_string())),
        Some(p) => Some(p.to_path_buf()),
        None => discover(),
    };

    let mut cfg = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config file");
            read_file(&path)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    cfg.validate()?;
    Ok(cfg)
}

fn discover() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }
    dirs::home_dir()
        .map(|home| home.join(".deploy-hook").join(CONFIG_FILE_NAME))
        .filter(|p| p.exists())
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let parse_err = |source: anyhow::Error| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    };
    let s = std::fs::read_to_string(path).map_err(|e| parse_err(e.into()))?;
    toml::from_str::<AppConfig>(&s).map_err(|e| parse_err(e.into()))
}

/// Applies non-empty `DEPLOY_HOOK_*` values returned by `lookup`.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("DEPLOY_HOOK_HOST") {
        cfg.http_server.host = v;
    }
    if let Some(v) = get("DEPLOY_HOOK_PORT") {
        cfg.http_server.port = parse_env("DEPLOY_HOOK_PORT", &v)?;
    }
    if let Some(v) = get("DEPLOY_HOOK_WORKDIR") {
        cfg.scripts.workdir = v;
    }
    if let Some(v) = get("DEPLOY_HOOK_INTERPRETER") {
        cfg.scripts.interpreter = v;
    }
    if let Some(v) = get("DEPLOY_HOOK_SCRIPT_TIMEOUT_SECS") {
        cfg.scripts.timeout_secs = parse_env("DEPLOY_HOOK_SCRIPT_TIMEOUT_SECS", &v)?;
    }
    if let Some(v) = get("DEPLOY_HOOK_LOG_DIR") {
        cfg.logging.directory = v;
    }

    Ok(())
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::EnvInvalid {
            key: key.to_string(),
            source: e.into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn env_overrides_apply_non_empty_values() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(
            &mut cfg,
            lookup_from(&[
                ("DEPLOY_HOOK_PORT", "9090"),
                ("DEPLOY_HOOK_HOST", "0.0.0.0"),
                ("DEPLOY_HOOK_WORKDIR", "/srv/app"),
                ("DEPLOY_HOOK_SCRIPT_TIMEOUT_SECS", "600"),
                ("DEPLOY_HOOK_INTERPRETER", ""),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.http_server.port, 9090);
        assert_eq!(cfg.http_server.host, "0.0.0.0");
        assert_eq!(cfg.scripts.workdir, "/srv/app");
        assert_eq!(cfg.scripts.timeout_secs, 600);
        assert_eq!(cfg.scripts.interpreter, "bash");
    }

    #[test]
    fn env_override_rejects_bad_port() {
        let mut cfg = AppConfig::default();
        let err = apply_env_overrides(&mut cfg, lookup_from(&[("DEPLOY_HOOK_PORT", "eighty")]))
            .unwrap_err();
        match err {
            ConfigError::EnvInvalid { key, .. } => assert_eq!(key, "DEPLOY_HOOK_PORT"),
            other => panic!("expected EnvInvalid, got {other:?}"),
        }
    }

    #[test]
    fn explicit_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            load(Some(missing.as_path())),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn explicit_file_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deploy.toml");
        std::fs::write(
            &path,
            "[http_server]\nport = 18081\n\n[scripts]\ndev = \"bin/dev.sh\"\n",
        )
        .unwrap();

        let cfg = read_file(&path).unwrap();
        assert_eq!(cfg.http_server.port, 18081);
        assert_eq!(cfg.scripts.dev, "bin/dev.sh");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[http_server\nport = ").unwrap();
        assert!(matches!(read_file(&path), Err(ConfigError::Parse { .. })));
    }
}
