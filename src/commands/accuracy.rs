//! Accuracy CLI command: compare predicted prices with actual closes

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use crossover_backtest::{DataLoader, PredictionMetrics};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Args)]
pub struct AccuracyArgs {
    /// CSV or JSON file of actual daily closes
    #[arg(long)]
    pub prices: PathBuf,

    /// CSV or JSON file of predicted prices (`date`, `predicted_price`)
    #[arg(long)]
    pub predictions: PathBuf,

    /// Output format
    #[arg(long, short, default_value = "text")]
    pub format: AccuracyFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AccuracyFormat {
    Text,
    Json,
}

pub fn run_accuracy(args: &AccuracyArgs) -> Result<()> {
    let actual = DataLoader::load_prices(&args.prices)
        .with_context(|| format!("Failed to load prices: {}", args.prices.display()))?;
    let predicted = DataLoader::load_prices(&args.predictions)
        .with_context(|| format!("Failed to load predictions: {}", args.predictions.display()))?;

    let metrics = PredictionMetrics::calculate(&actual, &predicted)?;
    info!(
        samples = metrics.sample_count,
        mae = %metrics.mean_absolute_error,
        rmse = %metrics.root_mean_squared_error,
        "Prediction accuracy computed"
    );

    match args.format {
        AccuracyFormat::Json => println!("{}", serde_json::to_string_pretty(&metrics)?),
        AccuracyFormat::Text => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    Cell::new("Samples").add_attribute(Attribute::Bold),
                    Cell::new("MAE").add_attribute(Attribute::Bold),
                    Cell::new("RMSE").add_attribute(Attribute::Bold),
                ]);
            table.add_row(vec![
                Cell::new(metrics.sample_count),
                Cell::new(format!("{:.4}", metrics.mean_absolute_error)),
                Cell::new(format!("{:.4}", metrics.root_mean_squared_error)),
            ]);

            println!();
            println!("Prediction Accuracy");
            println!();
            println!("{table}");
            println!();
        }
    }

    Ok(())
}
