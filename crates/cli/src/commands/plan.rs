//! Plan, pool and collector commands

use anyhow::Result;
use calculator_lib::{
    CollectorProfile, Component, ComponentResources, PlanResponse, SafetyReport, WorkloadProfile,
};
use colored::Colorize;
use tabled::Tabled;

use super::Backend;
use crate::output::{
    format_flag, print_field, print_heading, print_info, print_json, print_table, OutputFormat,
};

/// Row for the per-component table
#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "Replicas")]
    replicas: u32,
    #[tabled(rename = "CPU Req")]
    cpu_request: String,
    #[tabled(rename = "CPU Limit")]
    cpu_limit: String,
    #[tabled(rename = "Mem Req")]
    memory_request: String,
    #[tabled(rename = "Mem Limit")]
    memory_limit: String,
    #[tabled(rename = "Storage")]
    storage: String,
}

impl ComponentRow {
    fn new(component: impl Into<String>, resources: &ComponentResources) -> Self {
        Self {
            component: component.into(),
            replicas: resources.replicas,
            cpu_request: resources.requests.cpu.clone(),
            cpu_limit: resources.limits.cpu.clone(),
            memory_request: resources.requests.memory.clone(),
            memory_limit: resources.limits.memory.clone(),
            storage: resources.storage.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn component_rows(plan: &PlanResponse) -> Vec<ComponentRow> {
    plan.components
        .iter()
        .map(|(component, resources)| ComponentRow::new(display_name(*component), resources))
        .collect()
}

fn display_name(component: Component) -> &'static str {
    match component {
        Component::Collector => "Collector",
        Component::Router => "Receive Router",
        Component::Ingestor => "Receive Ingestor",
        Component::Compactor => "Compactor",
        Component::Store => "Store Gateway",
        Component::QueryFrontend => "Query Frontend",
        Component::Querier => "Querier",
    }
}

/// Full plan for all seven components
pub async fn run_plan(
    backend: &Backend,
    profile: &WorkloadProfile,
    format: OutputFormat,
) -> Result<()> {
    let plan = backend.calculate(profile).await?;
    render_plan("Thanos Resource Plan", &plan, backend, format)
}

/// Plan without the collector
pub async fn run_pool(
    backend: &Backend,
    profile: &WorkloadProfile,
    format: OutputFormat,
) -> Result<()> {
    let plan = backend.pool_resources(profile).await?;
    render_plan("Thanos Pool Resources", &plan, backend, format)
}

fn render_plan(
    title: &str,
    plan: &PlanResponse,
    backend: &Backend,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(plan)?,
        OutputFormat::Table => {
            print_heading(title);
            print_field("Ingestion rate", format!("{} samples/s", plan.dps).cyan());
            print_field("Object storage", plan.s3.cyan());
            println!();

            print_table(&component_rows(plan));
            println!();

            println!("{}", "Totals".bold());
            println!("{}", "-".repeat(60));
            print_field("Pods", plan.totals.pods);
            print_field("CPU requests", &plan.totals.cpu);
            print_field("Memory requests", &plan.totals.memory);
            print_field("Persistent volumes", &plan.totals.storage);
            println!();

            print_safety(&plan.safety);
            println!();
            print_footer(&plan.formula_version, backend);
        }
    }

    Ok(())
}

fn print_safety(safety: &SafetyReport) {
    println!("{}", "Suggested runtime limits".bold());
    println!("{}", "-".repeat(60));
    print_field("Receive request limit", safety.receive_request_limit);
    print_field("Receive concurrency", safety.receive_concurrency);
    print_field("Query max concurrent", safety.query_max_concurrent);
    print_field("Store max concurrency", safety.store_max_concurrency);
    print_field("Store series sample limit", safety.store_series_sample_limit);
    print_field(
        "Partition store by time",
        format_flag(safety.partition_store_by_time),
    );
}

fn print_footer(formula_version: &str, backend: &Backend) {
    let source = if backend.is_remote() {
        "calculator service"
    } else {
        "local calculation"
    };
    print_info(&format!(
        "Formula {} ({}), generated {}",
        formula_version,
        source,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
}

/// Collector sizing alone
pub async fn run_collector(
    backend: &Backend,
    profile: &CollectorProfile,
    format: OutputFormat,
) -> Result<()> {
    let collector = backend.collector_resources(profile).await?;

    match format {
        OutputFormat::Json => print_json(&collector)?,
        OutputFormat::Table => {
            print_heading("Collector Resources");
            print_field("Ingestion rate", format!("{} samples/s", collector.dps).cyan());
            println!();
            print_table(&[ComponentRow::new(
                display_name(Component::Collector),
                &collector.resources,
            )]);
            println!();
            print_footer(&collector.formula_version, backend);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calculator_lib::{calculate, SizingConfig};

    #[test]
    fn test_rows_follow_pipeline_order() {
        let profile = WorkloadProfile {
            active_series: 100_000,
            scrape_interval_secs: 60,
            query_rate: 10.0,
            performance_factor: 1.3,
            query_complexity_bytes: 50_000_000,
            local_retention_hours: 6,
            raw_retention_days: 14,
            downsample_5m_retention_days: 30,
            downsample_1h_retention_days: 90,
        };
        let plan = calculate(&profile, &SizingConfig::default()).unwrap();
        let rows = component_rows(&plan);

        let names: Vec<_> = rows.iter().map(|row| row.component.as_str()).collect();
        assert_eq!(
            names,
            [
                "Collector",
                "Receive Router",
                "Receive Ingestor",
                "Compactor",
                "Store Gateway",
                "Query Frontend",
                "Querier"
            ]
        );
        assert_eq!(rows[0].storage, "-");
        assert_eq!(rows[2].storage, "344Mi");
    }
}
