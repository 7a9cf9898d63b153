//! Staging tree cleanup.

use anyhow::Result;

use crate::config::ConfigFile;

/// Run the clean command.
pub fn run(config: &ConfigFile) -> Result<()> {
    let assembler = super::assembler(config);
    assembler.clean()?;
    tracing::info!("Cleaned {}", assembler.staging_dir().display());
    Ok(())
}
