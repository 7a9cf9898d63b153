//! Scaffold verdoc in a project.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use verdoc_site::templates::{redirect_template, DEFAULT_INDEX_TEMPLATE, DEFAULT_VERSION_TEMPLATE};

use crate::config::ConfigFile;

#[derive(Deserialize)]
struct CargoManifest {
    package: Option<CargoPackage>,
}

#[derive(Deserialize)]
struct CargoPackage {
    name: String,
}

/// Run the init command.
pub fn run(config_path: &Path, yes: bool, crate_name: Option<String>) -> Result<()> {
    tracing::info!("Initializing verdoc...");

    let written = scaffold(Path::new("."), config_path, yes, crate_name)?;

    tracing::info!("Initialization complete! ({} files written)", written);
    tracing::info!("Run 'verdoc publish --no-existing' for the first publish.");

    Ok(())
}

/// Write the config file and templates under `root`, returning how many
/// files were written. Existing files are kept unless `overwrite` is set.
fn scaffold(
    root: &Path,
    config_path: &Path,
    overwrite: bool,
    crate_name: Option<String>,
) -> Result<usize> {
    let crate_name = match crate_name {
        Some(name) => name,
        None => package_name(&root.join("Cargo.toml"))?,
    };

    let mut written = 0;

    let config_file = root.join(config_path);
    if write_file(&config_file, DEFAULT_CONFIG, overwrite)? {
        written += 1;
    }

    // Honor template paths from a config that was kept.
    let config = ConfigFile::load(&config_file)?;

    let redirect = redirect_template(&crate_name);
    let templates = [
        (&config.templates.index, DEFAULT_INDEX_TEMPLATE),
        (&config.templates.version, DEFAULT_VERSION_TEMPLATE),
        (&config.templates.redirect, redirect.as_str()),
    ];

    for (path, content) in templates {
        if write_file(&root.join(path), content, overwrite)? {
            written += 1;
        }
    }

    Ok(written)
}

fn write_file(path: &Path, content: &str, overwrite: bool) -> Result<bool> {
    if path.exists() && !overwrite {
        tracing::warn!("{} already exists. Use --yes to overwrite.", path.display());
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Created {}", path.display());

    Ok(true)
}

fn package_name(manifest: &Path) -> Result<String> {
    let content = fs::read_to_string(manifest).with_context(|| {
        format!(
            "Failed to read {}; pass --crate-name instead",
            manifest.display()
        )
    })?;
    let parsed: CargoManifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", manifest.display()))?;

    parsed.package.map(|p| p.name).with_context(|| {
        format!(
            "{} has no [package]; pass --crate-name",
            manifest.display()
        )
    })
}

const DEFAULT_CONFIG: &str = r#"# verdoc configuration

[site]
# Staging tree that is published as the site
staging = "target/docs"

# Development branch, always listed first
development = "master"

# List the development branch in the index and give it a redirect page
include_development = true

# Write versions.json next to index.html
manifest = true

# Branch holding the previously published site
published_branch = "gh-pages"

[templates]
index = ".github/doc/index_template.html"
version = ".github/doc/version_template.html"
redirect = ".github/doc/index_redirect.html"

[build]
program = "cargo"
args = ["doc", "--no-deps"]
target_dir_flag = "--target-dir"
target_dir = "target/docs_build"
output = "doc"

[git]
program = "git"
# "worktree" builds in a disposable worktree, "in-place" checks out in the repository
checkout = "worktree"
scratch = "target/docs_checkout"
published_dir = "target/gh-pages"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn scaffolds_config_and_templates() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("Cargo.toml"),
            "[package]\nname = \"static-vector\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();

        let written = scaffold(temp.path(), Path::new("verdoc.toml"), false, None).unwrap();

        assert_eq!(written, 4);
        let redirect =
            fs::read_to_string(temp.path().join(".github/doc/index_redirect.html")).unwrap();
        assert!(redirect.contains("./static_vector/index.html"));
        assert!(temp.path().join(".github/doc/index_template.html").exists());
        assert!(temp.path().join(".github/doc/version_template.html").exists());
    }

    #[test]
    fn default_config_matches_builtin_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("verdoc.toml");
        fs::write(&path, DEFAULT_CONFIG).unwrap();

        let site = ConfigFile::load(&path).unwrap().site_config();
        let defaults = verdoc_site::SiteConfig::default();

        assert_eq!(site.staging_dir, defaults.staging_dir);
        assert_eq!(site.build_args, defaults.build_args);
        assert_eq!(site.redirect_template, defaults.redirect_template);
        assert_eq!(site.checkout, defaults.checkout);
    }

    #[test]
    fn keeps_existing_files_without_overwrite() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("verdoc.toml");
        fs::write(&config, "[templates]\nindex = \"docs/index.tpl\"\n").unwrap();

        let written = scaffold(
            temp.path(),
            Path::new("verdoc.toml"),
            false,
            Some("demo".to_string()),
        )
        .unwrap();

        assert_eq!(written, 3);
        assert!(fs::read_to_string(&config).unwrap().contains("index.tpl"));
        assert!(temp.path().join("docs/index.tpl").exists());

        let again = scaffold(
            temp.path(),
            Path::new("verdoc.toml"),
            false,
            Some("demo".to_string()),
        )
        .unwrap();
        assert_eq!(again, 0);
    }

    #[test]
    fn workspace_manifest_needs_crate_name() {
        let temp = tempdir().unwrap();
        fs::write(
            temp.path().join("Cargo.toml"),
            "[workspace]\nmembers = [\"a\"]\n",
        )
        .unwrap();

        let err = scaffold(temp.path(), &PathBuf::from("verdoc.toml"), false, None).unwrap_err();

        assert!(err.to_string().contains("--crate-name"));
    }
}
