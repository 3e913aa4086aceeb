//! TOML configuration for headless sessions.

use std::{fs, io, path::Path};

use anyhow::Context;
use serde::Deserialize;
use stream_siege_core::{config::SimConfig, Bounds};
use stream_siege_system_chat_commands::Locale;

const DEFAULT_FPS: u32 = 30;

/// Settings read from the `--config` file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CliConfig {
    /// World and system tunables.
    pub(crate) simulation: SimConfig,
    /// Language of the chat keywords.
    pub(crate) locale: Locale,
    /// Simulation frames per second.
    pub(crate) fps: u32,
    /// Rectangles allied units cannot walk through.
    pub(crate) terrain: Vec<Bounds>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            simulation: SimConfig::default(),
            locale: Locale::default(),
            fps: DEFAULT_FPS,
            terrain: Vec::new(),
        }
    }
}

impl CliConfig {
    /// Loads the configuration file, falling back to defaults when it does not exist.
    pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read config {}", path.display()))
            }
        };
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text)?;
        anyhow::ensure!(config.fps > 0, "fps must be positive");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_documents_use_defaults() {
        assert_eq!(CliConfig::parse("").expect("parses"), CliConfig::default());
    }

    #[test]
    fn simulation_values_override_individually() {
        let config = CliConfig::parse(
            r#"
            locale = "japanese"
            fps = 60

            [simulation]
            player_castle_hp = 250
            rng_seed = 7

            [[terrain]]
            min = [14.0, 0.0]
            max = [16.0, 8.0]
            "#,
        )
        .expect("parses");

        assert_eq!(config.locale, Locale::Japanese);
        assert_eq!(config.fps, 60);
        assert_eq!(config.simulation.player_castle_hp, 250);
        assert_eq!(config.simulation.rng_seed, 7);
        assert_eq!(
            config.simulation.enemy_castle_base_hp,
            SimConfig::default().enemy_castle_base_hp
        );
        assert_eq!(config.terrain.len(), 1);
    }

    #[test]
    fn unknown_keys_and_zero_fps_are_rejected() {
        assert!(CliConfig::parse("speed = 2").is_err());
        assert!(CliConfig::parse("fps = 0").is_err());
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = CliConfig::load(Some(&dir.path().join("absent.toml"))).expect("defaults");
        assert_eq!(config, CliConfig::default());
    }
}
