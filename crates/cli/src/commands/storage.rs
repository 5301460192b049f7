//! Object storage estimate command

use anyhow::Result;
use calculator_lib::{StorageProfile, StorageResponse};
use colored::Colorize;
use tabled::Tabled;

use super::Backend;
use crate::output::{
    format_bytes, print_field, print_heading, print_json, print_table, OutputFormat,
};

/// Row for the per-tier table
#[derive(Tabled)]
struct TierRow {
    #[tabled(rename = "Resolution")]
    tier: &'static str,
    #[tabled(rename = "Retention")]
    retention: String,
    #[tabled(rename = "Size")]
    size: String,
}

fn tier_rows(profile: &StorageProfile, estimate: &StorageResponse) -> Vec<TierRow> {
    [
        ("raw", profile.raw_retention_days, &estimate.raw),
        ("5m", profile.downsample_5m_retention_days, &estimate.downsample_5m),
        ("1h", profile.downsample_1h_retention_days, &estimate.downsample_1h),
    ]
    .into_iter()
    .map(|(tier, days, size)| TierRow {
        tier,
        retention: format!("{}d", days),
        size: size.clone(),
    })
    .collect()
}

pub async fn run_storage(
    backend: &Backend,
    profile: &StorageProfile,
    format: OutputFormat,
) -> Result<()> {
    let estimate = backend.storage(profile).await?;

    match format {
        OutputFormat::Json => print_json(&estimate)?,
        OutputFormat::Table => {
            print_heading("Object Storage Estimate");
            print_field("Active series", profile.active_series);
            print_field("Scale multiplier", format!("{:.3}", estimate.scale_multiplier));
            println!();

            print_table(&tier_rows(profile, &estimate));
            println!();

            println!(
                "{} {} ({})",
                "Total:".bold(),
                estimate.total.green().bold(),
                format_bytes(estimate.total_bytes).dimmed()
            );
        }
    }

    Ok(())
}
