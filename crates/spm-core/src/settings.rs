use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::PipelineConfig;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Service Performance Metric helper CLI
#[derive(Parser, Debug, Clone)]
#[command(
    name = "spm",
    about = "Build per-version service loading-time reports from PerformanceLog folders",
    version
)]
pub struct Settings {
    #[command(subcommand)]
    pub command: Command,

    /// Pipeline config file (defaults to ~/.spm/config.json)
    #[arg(long, global = true, env = "SPM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base folder for generated results (overrides the config file)
    #[arg(long, global = true, env = "SPM_RESULT_BASE")]
    pub result_base: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Pipeline operations exposed on the command line.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Remove generated result files
    Clean {
        /// Result folder to clean (defaults to the result base)
        #[arg(long)]
        result: Option<PathBuf>,
    },
    /// Parse logs and build the CSV reports
    Generate {
        /// Data folder(s) containing version folders
        #[arg(long = "data", default_value = "data", num_args = 1..)]
        data: Vec<PathBuf>,
    },
    /// Check the shape of an already generated dataset
    Validate {
        /// Data folder whose results should be validated
        #[arg(long, default_value = "data")]
        data: PathBuf,
    },
    /// Write the effective pipeline config to the config file
    InitConfig,
    /// Combine multiple data folders into one destination
    Merge {
        /// One or more source data folders
        #[arg(required = true)]
        sources: Vec<PathBuf>,
        /// Destination data folder
        #[arg(long, default_value = "data")]
        into: PathBuf,
        /// Overwrite duplicate files in the destination (default: skip)
        #[arg(long)]
        overwrite: bool,
    },
}

impl Settings {
    /// Parse CLI arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] with an explicit argument list.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// The config file in effect: `--config` or `~/.spm/config.json`.
    pub fn config_file(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(PipelineConfig::config_path)
    }

    /// Build the pipeline config: file (or defaults), then CLI overrides.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::load_from(&self.config_file());
        if let Some(base) = &self.result_base {
            config.result_base = base.clone();
        }
        config
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_defaults() {
        let settings = Settings::from_args(["spm", "generate"]);
        assert_eq!(
            settings.command,
            Command::Generate {
                data: vec![PathBuf::from("data")]
            }
        );
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(settings.config.is_none());
    }

    #[test]
    fn test_generate_multiple_data_roots() {
        let settings = Settings::from_args(["spm", "generate", "--data", "a", "b"]);
        assert_eq!(
            settings.command,
            Command::Generate {
                data: vec![PathBuf::from("a"), PathBuf::from("b")]
            }
        );
    }

    #[test]
    fn test_merge_arguments() {
        let settings =
            Settings::from_args(["spm", "merge", "x", "y", "--into", "dest", "--overwrite"]);
        assert_eq!(
            settings.command,
            Command::Merge {
                sources: vec![PathBuf::from("x"), PathBuf::from("y")],
                into: PathBuf::from("dest"),
                overwrite: true,
            }
        );
    }

    #[test]
    fn test_init_config_uses_explicit_path() {
        let settings = Settings::from_args(["spm", "init-config", "--config", "/etc/spm.json"]);
        assert_eq!(settings.command, Command::InitConfig);
        assert_eq!(settings.config_file(), PathBuf::from("/etc/spm.json"));
    }

    #[test]
    fn test_merge_requires_sources() {
        assert!(Settings::try_parse_from(["spm", "merge"]).is_err());
    }

    #[test]
    fn test_debug_overrides_log_level() {
        let settings = Settings::from_args(["spm", "clean", "--debug"]);
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        assert!(Settings::try_parse_from(["spm", "--log-level", "LOUD", "clean"]).is_err());
    }

    #[test]
    fn test_pipeline_config_from_file_with_override() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp.path().join("config.json");
        let stored = PipelineConfig {
            expected_service_count: 10,
            ..Default::default()
        };
        stored.save_to(&path).expect("save");

        let settings = Settings::from_args([
            "spm".into(),
            "--config".into(),
            path.clone().into_os_string(),
            "--result-base".into(),
            "/tmp/out".into(),
            std::ffi::OsString::from("clean"),
        ]);
        let config = settings.pipeline_config();
        assert_eq!(config.expected_service_count, 10);
        assert_eq!(config.result_base, PathBuf::from("/tmp/out"));
    }
}
