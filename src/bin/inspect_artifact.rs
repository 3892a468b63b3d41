//! Utility to load a scoring artifact and print its contract.

use std::env;
use std::path::PathBuf;

use churn_scoring_api::artifact::ScoringArtifact;
use churn_scoring_api::config::Config;

/// Main entry point for the artifact inspection utility.
///
/// Loads the artifact named on the command line (or `MODEL_PATH`), runs the
/// same validation as the server, and lists its columns and importance table.
fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or(config.model_path);

    let artifact = ScoringArtifact::load(&path, config.model_checksum.as_deref())?;
    let metadata = artifact.metadata();

    println!("Artifact: {}", path.display());
    println!(
        "  version:    {}",
        metadata.version.as_deref().unwrap_or("unversioned")
    );
    if let Some(trained_at) = metadata.trained_at {
        println!("  trained at: {}", trained_at.to_rfc3339());
    }
    println!("  currency:   {}", metadata.currency);
    println!("  sha256:     {}", metadata.sha256.as_deref().unwrap_or("-"));
    println!();

    println!("Feature columns:");
    for (idx, column) in artifact.feature_columns().iter().enumerate() {
        println!("  {:>2}. {:<16} ({})", idx, column.name(), column.display_name());
    }

    match artifact.feature_importance() {
        Some(importance) => {
            println!("\nFeature importance:");
            for entry in importance {
                println!("  - {:<16} {:.4}", entry.feature, entry.importance);
            }
        }
        None => println!("\nNo feature importance table"),
    }

    Ok(())
}
