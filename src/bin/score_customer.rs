//! Posts customer records from a JSON file to a running scoring API and prints
//! the predictions.
//!
//! Usage: `score_customer <records.json>`; the file holds one record or an array.

use dotenvy::dotenv;
use std::env;

use churn_scoring_api::client::ChurnApiClient;
use churn_scoring_api::models::CustomerRecord;

/// Main entry point for the scoring utility.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let path = env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: score_customer <records.json>"))?;
    let base_url = env::var("CHURN_API_URL").unwrap_or_else(|_| "http://localhost:8000".to_string());

    let contents = std::fs::read_to_string(&path)?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;
    let records: Vec<CustomerRecord> = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        _ => vec![serde_json::from_value(value)?],
    };

    let client = ChurnApiClient::new(base_url.clone())?;
    client.health().await?;
    println!("Scoring {} record(s) against {}\n", records.len(), base_url);

    let total = records.len();
    let mut failures = 0;

    for (idx, record) in records.iter().enumerate() {
        println!(
            "[{}/{}] {}, {}, age {}",
            idx + 1,
            total,
            record.geography,
            record.gender,
            record.age
        );

        match client.predict(record).await {
            Ok(result) => {
                println!(
                    "  ✓ Churn Probability: {:.1}%",
                    result.churn_probability * 100.0
                );
                println!("  ✓ Prediction: {}", result.label());
                if let Some(importance) = &result.feature_importance {
                    for entry in importance {
                        println!("      {:<20} {:>8.3}", entry.feature, entry.importance);
                    }
                }
            }
            Err(e) => {
                println!("  ✗ {}", e);
                failures += 1;
            }
        }
    }

    println!("\nDone: {} scored, {} failed", total - failures, failures);

    if failures > 0 {
        anyhow::bail!("{} record(s) could not be scored", failures);
    }
    Ok(())
}
