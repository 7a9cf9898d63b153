//! Master index rendering.

use anyhow::Result;

use crate::config::ConfigFile;

/// Run the index command.
pub fn run(config: &ConfigFile) -> Result<()> {
    let assembler = super::assembler(config);

    let versions = assembler.resolve_versions()?;
    assembler.render_index(&versions)?;

    if let Some(manifest) = assembler.write_manifest(&versions)? {
        tracing::info!("Wrote {}", manifest.display());
    }

    Ok(())
}
