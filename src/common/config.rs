use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout_engine::{AmbiguousSpan, Policy};
use crate::model::grid::Grid;

const DEFAULT_CONFIG: &str = include_str!("../../swallow.default.toml");

pub fn config_file() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("swallow").join("config.toml"))
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub settings: LayoutSettings,
    #[serde(default)]
    pub fixture: FixtureSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// Used when a swallow command does not say whether it is aggressive.
    #[serde(default = "no")]
    pub aggressive: bool,
    #[serde(default)]
    pub ambiguous_span: AmbiguousSpan,
    /// Log the layout tree after every command.
    #[serde(default = "no")]
    pub log_tree: bool,
}

impl LayoutSettings {
    pub fn policy(&self, aggressive: Option<bool>) -> Policy {
        Policy {
            aggressive: aggressive.unwrap_or(self.aggressive),
            ambiguous: self.ambiguous_span,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct FixtureSettings {
    #[serde(default = "default_cell_size")]
    pub cell_width: u32,
    #[serde(default = "default_cell_size")]
    pub cell_height: u32,
}

impl Default for FixtureSettings {
    fn default() -> Self {
        FixtureSettings {
            cell_width: default_cell_size(),
            cell_height: default_cell_size(),
        }
    }
}

impl FixtureSettings {
    pub fn grid(&self) -> Grid { Grid::new(self.cell_width, self.cell_height) }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.cell_width == 0 {
            issues.push("fixture.cell_width must be at least 1".to_string());
        }
        if self.cell_height == 0 {
            issues.push("fixture.cell_height must be at least 1".to_string());
        }
        issues
    }
}

fn no() -> bool { false }

fn default_cell_size() -> u32 { 10 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    /// Reads `path`, or the user's config file when no path is given. Falls
    /// back to the built-in defaults when the user has no config file.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Config> {
        if let Some(path) = path {
            return Self::read(path);
        }
        match config_file() {
            Some(path) if path.exists() => Self::read(&path),
            _ => Self::parse(DEFAULT_CONFIG),
        }
    }

    /// Save the current config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> { self.fixture.validate() }

    pub fn parse(buf: &str) -> anyhow::Result<Config> { Ok(toml::from_str(buf)?) }
}
