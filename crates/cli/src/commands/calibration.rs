//! Calibration inspection command

use anyhow::Result;
use calculator_lib::{sizing::LimitPolicy, Component, SizingConfig};
use tabled::Tabled;

use super::Backend;
use crate::output::{print_field, print_heading, print_json, print_table, OutputFormat};

/// Row for the limit multiplier table
#[derive(Tabled)]
struct LimitRow {
    #[tabled(rename = "Component")]
    component: &'static str,
    #[tabled(rename = "CPU x")]
    cpu: String,
    #[tabled(rename = "Memory x")]
    memory: String,
}

fn limit_rows(config: &SizingConfig) -> Vec<LimitRow> {
    let policy = LimitPolicy::new(&config.limits);
    Component::ALL
        .into_iter()
        .map(|component| {
            let multipliers = policy.multipliers(component);
            LimitRow {
                component: component.as_str(),
                cpu: format!("{:.2}", multipliers.cpu),
                memory: format!("{:.2}", multipliers.memory),
            }
        })
        .collect()
}

pub async fn show_calibration(backend: &Backend, format: OutputFormat) -> Result<()> {
    let config = backend.calibration().await?;

    match format {
        OutputFormat::Json => print_json(&config)?,
        OutputFormat::Table => {
            print_heading("Calibration");
            print_field("Formula version", &config.formula_version);
            print_field(
                "Storage taper",
                format!(
                    "{} -> {} series, x{} -> x{}",
                    config.storage.taper_start_series,
                    config.storage.taper_end_series,
                    config.storage.baseline_multiplier,
                    config.storage.taper_end_multiplier
                ),
            );
            print_field("Storage safety margin", config.storage.safety_margin);
            print_field("Series per ingestor", config.ingestor.max_series_per_shard);
            print_field("Router dps per replica", config.router.dps_per_replica);
            print_field("Querier qps per replica", config.querier.qps_per_replica);
            println!();
            print_table(&limit_rows(&config));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_rows_cover_every_component() {
        let rows = limit_rows(&SizingConfig::default());
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[2].component, "receiver_ingestor");
        assert_eq!(rows[2].cpu, "1.50");
        assert_eq!(rows[2].memory, "1.25");
    }
}
