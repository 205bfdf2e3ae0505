mod bootstrap;

use std::path::Path;

use anyhow::{bail, Result};
use spm_core::config::PipelineConfig;
use spm_core::models::ValidationResult;
use spm_core::settings::{Command, Settings};
use spm_data::merger::{merge_data_folders, ConflictPolicy};
use spm_runtime::pipeline::{clean_results, generate_batch, validate_dataset, GenerationOutcome};

fn main() -> Result<()> {
    let settings = Settings::load();
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("spm v{} starting", env!("CARGO_PKG_VERSION"));
    let config = settings.pipeline_config();
    config.validate()?;

    match &settings.command {
        Command::Clean { result } => {
            let target = result.clone().unwrap_or_else(|| config.result_base.clone());
            if clean_results(&target)? {
                println!("Removed {}", target.display());
            } else {
                println!("Nothing to clean at {}", target.display());
            }
        }

        Command::Generate { data } => {
            let runs = generate_batch(data, &config);
            let mut failures = 0;
            for run in &runs {
                match &run.outcome {
                    Ok(GenerationOutcome::Reused) => {
                        println!("{}: reusing {}", run.data_root.display(), run.result_dir.display());
                    }
                    Ok(GenerationOutcome::Generated {
                        total_rows,
                        combined_rows,
                        versions,
                        validation,
                    }) => {
                        println!(
                            "{}: {} versions, {} rows, {} combined rows -> {}",
                            run.data_root.display(),
                            versions.len(),
                            total_rows,
                            combined_rows,
                            run.result_dir.display()
                        );
                        print_validation(validation);
                    }
                    Ok(GenerationOutcome::NoData) => {
                        println!("{}: no timing data found", run.data_root.display());
                    }
                    Err(e) => {
                        eprintln!("{}: {}", run.data_root.display(), e);
                        failures += 1;
                    }
                }
            }
            if failures > 0 {
                bail!("{} of {} datasets failed", failures, runs.len());
            }
        }

        Command::Validate { data } => {
            let validation = validate_data_root(data, &config)?;
            print_validation(&validation);
            if !validation.is_ready() {
                bail!("dataset {} is not ready", data.display());
            }
        }

        Command::InitConfig => {
            let path = settings.config_file();
            config.save_to(&path)?;
            println!("Wrote pipeline config to {}", path.display());
        }

        Command::Merge {
            sources,
            into,
            overwrite,
        } => {
            let policy = if *overwrite {
                ConflictPolicy::Overwrite
            } else {
                ConflictPolicy::Skip
            };
            let stats = merge_data_folders(sources, into, policy)?;
            println!(
                "Merged into {}: {} copied, {} overwritten, {} skipped",
                into.display(),
                stats.copied,
                stats.overwritten,
                stats.skipped
            );
        }
    }

    Ok(())
}

fn validate_data_root(data_root: &Path, config: &PipelineConfig) -> Result<ValidationResult> {
    let result_dir = config.result_dir_for(data_root);
    Ok(validate_dataset(&result_dir, config)?)
}

fn print_validation(validation: &ValidationResult) {
    if validation.is_clean() {
        println!("Validation passed");
        return;
    }
    for warning in &validation.warnings {
        println!("{}", warning);
    }
    if let Some(error) = &validation.error {
        println!("{}", error);
    }
}
