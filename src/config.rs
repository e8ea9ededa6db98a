// config.rs - startup settings: defaults, optional JSON file, env and CLI overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "panorama.json";
pub const IMAGE_ENV: &str = "PANORAMA_IMAGE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("missing value after {0}")]
    MissingValue(String),
    #[error("window size must be non-zero, got {0}x{1}")]
    ZeroSize(u32, u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// MSAA sample count; 0 or 1 disables multisampling.
    pub multisample: u32,
    pub image: PathBuf,
    /// Radians turned per frame while a rotation key is held.
    pub rotation_step: f64,
    /// Frame-rate cap; 0 disables it.
    pub frame_rate: u32,
    pub show_hud: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            title: "Off-Center Map Projections".to_string(),
            multisample: 0,
            image: PathBuf::from("equirectangular.jpg"),
            rotation_step: 0.01,
            frame_rate: 60,
            show_hud: false,
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub image: Option<PathBuf>,
}

impl CliArgs {
    /// Parses `--config <path>` and `--image <path>`; other arguments are ignored.
    pub fn parse<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut out = CliArgs::default();
        let mut it = args.into_iter();
        while let Some(a) = it.next() {
            let slot = match a.as_str() {
                "--config" => &mut out.config,
                "--image" => &mut out.image,
                _ => continue,
            };
            let v = it.next().ok_or(ConfigError::MissingValue(a))?;
            *slot = Some(PathBuf::from(v));
        }
        Ok(out)
    }
}

impl ViewerConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layers defaults, the config file, `PANORAMA_IMAGE` and CLI flags, in
    /// that order.
    pub fn resolve(cli: &CliArgs, env_image: Option<String>) -> Result<Self, ConfigError> {
        let mut config = match &cli.config {
            Some(path) => Self::from_json_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_json_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        if let Some(v) = env_image.filter(|v| !v.trim().is_empty()) {
            config.image = PathBuf::from(v);
        }
        if let Some(p) = &cli.image {
            config.image = p.clone();
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse(std::env::args().skip(1))?;
        Self::resolve(&cli, std::env::var(IMAGE_ENV).ok())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::ZeroSize(self.width, self.height));
        }
        Ok(())
    }

    /// Sample count handed to the renderer.
    pub fn sample_count(&self) -> u32 {
        self.multisample.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_match_the_classic_window() {
        let c = ViewerConfig::default();
        assert_eq!((c.width, c.height), (1000, 500));
        assert_eq!(c.image, PathBuf::from("equirectangular.jpg"));
        assert_eq!(c.rotation_step, 0.01);
        assert_eq!(c.sample_count(), 1);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let c: ViewerConfig = serde_json::from_str(r#"{ "width": 1600, "multisample": 4 }"#).unwrap();
        assert_eq!(c.width, 1600);
        assert_eq!(c.height, 500);
        assert_eq!(c.sample_count(), 4);
        assert_eq!(c.frame_rate, 60);
    }

    #[test]
    fn cli_parsing() {
        let cli = CliArgs::parse(args(&["--verbose", "--image", "pano.png", "--config", "a.json"])).unwrap();
        assert_eq!(cli.image, Some(PathBuf::from("pano.png")));
        assert_eq!(cli.config, Some(PathBuf::from("a.json")));

        assert!(matches!(
            CliArgs::parse(args(&["--image"])),
            Err(ConfigError::MissingValue(flag)) if flag == "--image"
        ));
    }

    #[test]
    fn cli_image_beats_env() {
        let dir = std::env::temp_dir().join("quat_panorama_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("viewer.json");
        std::fs::write(&file, r#"{ "image": "from_file.jpg", "title": "t" }"#).unwrap();

        let mut cli = CliArgs {
            config: Some(file.clone()),
            image: None,
        };
        let c = ViewerConfig::resolve(&cli, None).unwrap();
        assert_eq!(c.image, PathBuf::from("from_file.jpg"));
        assert_eq!(c.title, "t");

        let c = ViewerConfig::resolve(&cli, Some("env.jpg".into())).unwrap();
        assert_eq!(c.image, PathBuf::from("env.jpg"));

        let c = ViewerConfig::resolve(&cli, Some("   ".into())).unwrap();
        assert_eq!(c.image, PathBuf::from("from_file.jpg"));

        cli.image = Some(PathBuf::from("cli.jpg"));
        let c = ViewerConfig::resolve(&cli, Some("env.jpg".into())).unwrap();
        assert_eq!(c.image, PathBuf::from("cli.jpg"));
    }

    #[test]
    fn bad_json_is_reported() {
        let file = std::env::temp_dir().join("quat_panorama_bad_config.json");
        std::fs::write(&file, "{ width: ").unwrap();
        let cli = CliArgs {
            config: Some(file),
            image: None,
        };
        assert!(matches!(ViewerConfig::resolve(&cli, None), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn zero_size_is_rejected() {
        let c = ViewerConfig {
            height: 0,
            ..ViewerConfig::default()
        };
        assert!(matches!(c.validate(), Err(ConfigError::ZeroSize(1000, 0))));
    }
}
