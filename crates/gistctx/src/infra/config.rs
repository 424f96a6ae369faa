//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::infra::github::DEFAULT_API_URL;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".gistctx/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub ignore: Ignore,
    #[serde(default)]
    pub github: Github,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Defaults {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub public: Option<bool>,
    #[serde(default)]
    pub copy_url: Option<bool>,
}

impl Defaults {
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Gists are secret unless configured otherwise.
    pub fn public(&self) -> bool {
        self.public.unwrap_or(false)
    }

    pub fn copy_url(&self) -> bool {
        self.copy_url.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Ignore {
    #[serde(default)]
    pub vcs: Option<bool>,
    #[serde(default)]
    pub file_types: Vec<String>,
}

impl Ignore {
    pub fn vcs(&self) -> bool {
        self.vcs.unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Github {
    #[serde(default)]
    api_url: Option<String>,
    #[serde(default)]
    token_env: Vec<String>,
}

impl Github {
    fn default_token_env() -> Vec<String> {
        vec!["GISTCTX_TOKEN".into(), "GH_TOKEN".into(), "GITHUB_TOKEN".into()]
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    /// Environment variables searched, in order, for an access token.
    pub fn token_env(&self) -> Vec<String> {
        if self.token_env.is_empty() {
            Self::default_token_env()
        } else {
            self.token_env.clone()
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    api_url: Option<String>,
    description: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            api_url: env::var("GISTCTX_API_URL").ok(),
            description: env::var("GISTCTX_DESCRIPTION").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(api_url: &str, description: &str) -> Self {
        Self {
            api_url: Some(api_url.to_owned()),
            description: Some(description.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "loading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "loading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            ignore: merge_ignore(self.ignore, other.ignore),
            github: merge_github(self.github, other.github),
        }
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        description: overlay.description.or(base.description),
        public: overlay.public.or(base.public),
        copy_url: overlay.copy_url.or(base.copy_url),
    }
}

fn merge_ignore(base: Ignore, overlay: Ignore) -> Ignore {
    let mut file_types: BTreeSet<String> = base.file_types.into_iter().collect();
    file_types.extend(overlay.file_types);

    Ignore {
        vcs: overlay.vcs.or(base.vcs),
        file_types: file_types.into_iter().collect(),
    }
}

fn merge_github(base: Github, overlay: Github) -> Github {
    Github {
        api_url: overlay.api_url.or(base.api_url),
        token_env: if overlay.token_env.is_empty() {
            base.token_env
        } else {
            overlay.token_env
        },
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("gistctx/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(api_url) = env.api_url.filter(|url| !url.trim().is_empty()) {
        config.github.api_url = Some(api_url);
    }
    if let Some(description) = env.description {
        config.defaults.description = Some(description);
    }
    config
}
