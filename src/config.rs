use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

use crate::{input::ControlsConfig, player::PlayerPolicy, session::PageConfig};

pub const DEFAULT_CONFIG_PATH: &str = "media-surface.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(flatten)]
    pub page: PageConfig,

    pub controls: ControlsConfig,

    pub player: PlayerPolicy,
}

impl Config {
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config = toml::from_str(contents).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn read(file: &mut impl Read) -> anyhow::Result<Self> {
        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .context("Failed to read config file")?;
        Self::parse(&contents)
    }

    pub fn read_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut file = File::open(path).context("Failed to open config file")?;
        Self::read(&mut file)
    }

    /// Loads the config from an explicit path, falling back to
    /// [`DEFAULT_CONFIG_PATH`] in the working directory and then to the
    /// built-in defaults.
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        match config_path {
            Some(config_path) => Self::read_path(config_path),
            None => {
                let default_config = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_config.exists() {
                    log::info!("Using default config file {DEFAULT_CONFIG_PATH}");
                    Self::read_path(default_config)
                } else {
                    log::debug!("No config file found; using default config");
                    Ok(Config::default())
                }
            }
        }
    }
}
