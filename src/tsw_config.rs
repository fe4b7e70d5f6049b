// User preferences: board size, mine probability and glyph style
// Persisted as TOML under the platform config directory

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::tsw_board::{BoardConfig, DEFAULT_HEIGHT, DEFAULT_MINE_PROBABILITY, DEFAULT_WIDTH};
use crate::tsw_error::Result;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    pub width: usize,
    pub height: usize,
    pub mine_probability: f64, // Chance for each tile to hold a mine
    pub ascii_icons: bool,     // Use ASCII fallback glyphs
}

impl Default for Config {
    fn default() -> Self {
        Config {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            mine_probability: DEFAULT_MINE_PROBABILITY,
            ascii_icons: false,
        }
    }
}

impl Config {
    /// Validated board parameters for a new session
    pub fn board_config(&self) -> Result<BoardConfig> {
        BoardConfig::new(self.width, self.height, self.mine_probability)
    }
}

/// Get the configuration file path
/// Uses the platform config directory (e.g. ~/.config/tileswpr/tileswpr.toml on Linux)
/// and falls back to the current directory when no home is known
pub fn config_path() -> Option<PathBuf> {
    let exe = env::current_exe().ok()?;
    let name = exe.file_stem()?.to_str()?.to_string();
    match ProjectDirs::from("org", "tileswpr", &name) {
        Some(proj) => Some(proj.config_dir().join(format!("{}.toml", name))),
        None => env::current_dir()
            .ok()
            .map(|dir| dir.join(format!("{}.toml", name))),
    }
}

/// Load configuration from disk, or create it with defaults if missing.
/// A file that cannot be parsed is left alone and defaults are used.
pub fn load_or_create_config() -> Config {
    match config_path() {
        Some(path) => load_or_create_at(&path),
        None => Config::default(),
    }
}

fn load_or_create_at(path: &Path) -> Config {
    if path.exists() {
        match fs::read_to_string(path).map(|s| toml::from_str::<Config>(&s)) {
            Ok(Ok(cfg)) => return cfg,
            Ok(Err(err)) => {
                tracing::warn!(path = %path.display(), %err, "ignoring malformed config file");
                return Config::default();
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "cannot read config file");
                return Config::default();
            }
        }
    }

    let cfg = Config::default();
    if let Err(err) = write_config(path, &cfg) {
        tracing::warn!(path = %path.display(), %err, "cannot create config file");
    }
    cfg
}

fn write_config(path: &Path, cfg: &Config) -> anyhow::Result<()> {
    let s = toml::to_string(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, s)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tsw_error::GameError;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let cfg: Config = toml::from_str("width = 30\nascii_icons = true\n").unwrap();
        assert_eq!(cfg.width, 30);
        assert_eq!(cfg.height, DEFAULT_HEIGHT);
        assert_eq!(cfg.mine_probability, DEFAULT_MINE_PROBABILITY);
        assert!(cfg.ascii_icons);
    }

    #[test]
    fn invalid_values_surface_as_board_errors() {
        let cfg = Config {
            mine_probability: 2.0,
            ..Config::default()
        };
        assert_eq!(cfg.board_config(), Err(GameError::InvalidProbability(2.0)));

        let cfg = Config {
            width: 0,
            ..Config::default()
        };
        assert_eq!(cfg.board_config(), Err(GameError::InvalidSize(0, DEFAULT_HEIGHT)));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = env::temp_dir().join(format!("tileswpr-test-{}", std::process::id()));
        let path = dir.join("nested").join("tileswpr.toml");
        let _ = fs::remove_dir_all(&dir);

        let cfg = load_or_create_at(&path);
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        fs::write(&path, "height = 4\nmine_probability = 0.25\n").unwrap();
        let cfg = load_or_create_at(&path);
        assert_eq!((cfg.width, cfg.height), (DEFAULT_WIDTH, 4));
        assert_eq!(cfg.mine_probability, 0.25);

        fs::write(&path, "width = \"wide\"").unwrap();
        assert_eq!(load_or_create_at(&path), Config::default());

        let _ = fs::remove_dir_all(&dir);
    }
}
