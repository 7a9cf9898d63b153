//! Configuration file (verdoc.toml).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use verdoc_site::{CheckoutMode, SiteConfig};

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub site: SiteSection,
    #[serde(default)]
    pub templates: TemplatesSection,
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub git: GitSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Staging tree that is published as the site
    pub staging: PathBuf,
    /// Development branch, listed before every tag
    pub development: String,
    pub include_development: bool,
    /// Write versions.json next to index.html
    pub manifest: bool,
    /// Branch holding the previously published site
    pub published_branch: String,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesSection {
    pub index: PathBuf,
    pub version: PathBuf,
    pub redirect: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    pub program: String,
    pub args: Vec<String>,
    pub target_dir_flag: String,
    pub target_dir: PathBuf,
    /// Docs directory inside target_dir
    pub output: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitSection {
    pub program: String,
    pub checkout: CheckoutMode,
    pub scratch: PathBuf,
    pub published_dir: PathBuf,
}

impl Default for SiteSection {
    fn default() -> Self {
        let defaults = SiteConfig::default();
        Self {
            staging: defaults.staging_dir,
            development: defaults.development,
            include_development: defaults.include_development,
            manifest: defaults.write_manifest,
            published_branch: "gh-pages".to_string(),
        }
    }
}

impl Default for TemplatesSection {
    fn default() -> Self {
        let defaults = SiteConfig::default();
        Self {
            index: defaults.index_template,
            version: defaults.version_template,
            redirect: defaults.redirect_template,
        }
    }
}

impl Default for BuildSection {
    fn default() -> Self {
        let defaults = SiteConfig::default();
        Self {
            program: defaults.build_program,
            args: defaults.build_args,
            target_dir_flag: defaults.target_dir_flag,
            target_dir: defaults.build_dir,
            output: defaults.build_output,
        }
    }
}

impl Default for GitSection {
    fn default() -> Self {
        let defaults = SiteConfig::default();
        Self {
            program: defaults.git_program,
            checkout: defaults.checkout,
            scratch: defaults.scratch_dir,
            published_dir: defaults.published_dir,
        }
    }
}

impl ConfigFile {
    /// Load configuration from `path` if it exists.
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!("Loaded config from {}", path.display());

        Ok(config)
    }

    pub fn site_config(&self) -> SiteConfig {
        SiteConfig {
            repo_root: PathBuf::from("."),
            staging_dir: self.site.staging.clone(),
            build_dir: self.build.target_dir.clone(),
            scratch_dir: self.git.scratch.clone(),
            published_dir: self.git.published_dir.clone(),
            development: self.site.development.clone(),
            include_development: self.site.include_development,
            write_manifest: self.site.manifest,
            checkout: self.git.checkout,
            git_program: self.git.program.clone(),
            build_program: self.build.program.clone(),
            build_args: self.build.args.clone(),
            target_dir_flag: self.build.target_dir_flag.clone(),
            build_output: self.build.output.clone(),
            index_template: self.templates.index.clone(),
            version_template: self.templates.version.clone(),
            redirect_template: self.templates.redirect.clone(),
        }
    }
}
