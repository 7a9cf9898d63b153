//! Full site publish.

use anyhow::Result;
use verdoc_site::PublishPlan;

use crate::config::ConfigFile;

/// Run the publish command.
pub fn run(
    config: &ConfigFile,
    reference: Option<String>,
    all_tags: bool,
    existing: Option<String>,
) -> Result<()> {
    let plan = PublishPlan {
        current: reference.unwrap_or_else(|| config.site.development.clone()),
        existing_from: existing,
        all_tags,
    };

    tracing::info!("Publishing docs for {}...", plan.current);

    let report = super::assembler(config).publish(&plan)?;

    tracing::info!(
        "Generated {} and listed {} versions ({} carried over) in {}ms",
        report.generated.join(", "),
        report.versions.len(),
        report.copied,
        report.duration_ms
    );

    tracing::info!("Output: {}", report.staging_dir.display());

    Ok(())
}
