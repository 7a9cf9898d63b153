//! Subcommand implementations.

pub mod clean;
pub mod generate;
pub mod index;
pub mod init;
pub mod publish;
pub mod serve;

use verdoc_site::{ProcessRunner, SiteAssembler};

use crate::config::ConfigFile;

/// Assembler running real git and build processes.
pub fn assembler(config: &ConfigFile) -> SiteAssembler<ProcessRunner> {
    SiteAssembler::new(config.site_config(), ProcessRunner)
}
