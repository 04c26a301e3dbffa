use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::environment::Environment;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub http_server: HttpServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scripts.interpreter.trim().is_empty() {
            return Err(ConfigError::Validation(
                "scripts.interpreter must not be empty".into(),
            ));
        }
        for env in Environment::ALL {
            if self.scripts.raw_script(env).trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "scripts.{} must not be empty",
                    env.slug()
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Empty disables file logging.
    #[serde(default)]
    pub directory: String,

    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file_prefix() -> String {
    "deploy-hook.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            file_prefix: default_log_file_prefix(),
        }
    }
}

impl LoggingConfig {
    pub fn directory(&self) -> Option<PathBuf> {
        non_empty_path(&self.directory)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptsConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Empty means the process working directory.
    #[serde(default)]
    pub workdir: String,

    /// 0 waits forever.
    #[serde(default)]
    pub timeout_secs: u64,

    #[serde(default = "default_dev_script")]
    pub dev: String,

    #[serde(default = "default_qa_script")]
    pub qa: String,
}

fn default_interpreter() -> String {
    "bash".to_string()
}

fn default_dev_script() -> String {
    "scripts/deploy-dev.sh".to_string()
}

fn default_qa_script() -> String {
    "scripts/deploy-qa.sh".to_string()
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            workdir: String::new(),
            timeout_secs: 0,
            dev: default_dev_script(),
            qa: default_qa_script(),
        }
    }
}

impl ScriptsConfig {
    fn raw_script(&self, env: Environment) -> &str {
        match env {
            Environment::Dev => &self.dev,
            Environment::Qa => &self.qa,
        }
    }

    /// Script path for `env`, with `~` expanded. Relative paths are left
    /// relative; the runner resolves them against its working directory.
    pub fn script_for(&self, env: Environment) -> PathBuf {
        expand(self.raw_script(env))
    }

    /// Script path for `env` joined onto `workdir` when relative.
    pub fn resolved_script_for(&self, env: Environment) -> PathBuf {
        let script = self.script_for(env);
        match self.workdir() {
            Some(dir) if script.is_relative() => dir.join(script),
            _ => script,
        }
    }

    pub fn workdir(&self) -> Option<PathBuf> {
        non_empty_path(&self.workdir)
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn expand(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw.trim()).into_owned())
}

fn non_empty_path(raw: &str) -> Option<PathBuf> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(expand(raw))
    }
}
