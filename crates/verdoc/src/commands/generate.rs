//! Single-version generation.

use anyhow::Result;
use verdoc_site::Version;

use crate::config::ConfigFile;

/// Generate docs for a branch.
pub fn run_branch(config: &ConfigFile, branch: &str) -> Result<()> {
    super::assembler(config).generate_version(branch)?;
    Ok(())
}

/// Generate docs for a release tag, rejecting tags that cannot be ordered.
pub fn run_version(config: &ConfigFile, tag: &str) -> Result<()> {
    let version = Version::release(tag)?;
    super::assembler(config).generate_version(version.name())?;
    Ok(())
}
