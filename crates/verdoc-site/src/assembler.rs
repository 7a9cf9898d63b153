//! Multi-version site assembly.
//!
//! A publish run walks `Clean -> CopyExisting -> ResolveVersions ->
//! GenerateCurrent -> GenerateTag* -> RenderIndex -> Done`. The first failing
//! stage aborts the run; whatever was already staged stays on disk until the
//! next `clean`.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::SiteError;
use crate::runner::{Cmd, CommandRunner};
use crate::templates::{read_template, Templates};
use crate::version::VersionList;

/// How a version's sources are checked out before building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckoutMode {
    /// A disposable `git worktree` per version, leaving the main checkout alone
    #[default]
    Worktree,
    /// `git checkout` in the repository itself
    InPlace,
}

/// Configuration for assembling a site.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Repository root; relative paths below resolve against it
    pub repo_root: PathBuf,

    /// Staging tree that becomes the published site
    pub staging_dir: PathBuf,

    /// Target directory handed to the documentation build
    pub build_dir: PathBuf,

    /// Scratch worktree used for checkouts
    pub scratch_dir: PathBuf,

    /// Where the previously published tree is checked out
    pub published_dir: PathBuf,

    /// Development token, always listed first
    pub development: String,

    /// List the development token in the index and give it a redirect page
    pub include_development: bool,

    /// Write `versions.json` next to the master index
    pub write_manifest: bool,

    pub checkout: CheckoutMode,

    pub git_program: String,

    pub build_program: String,

    pub build_args: Vec<String>,

    /// Flag preceding the build directory, e.g. `--target-dir`
    pub target_dir_flag: String,

    /// Subdirectory of `build_dir` holding the generated docs
    pub build_output: PathBuf,

    pub index_template: PathBuf,

    pub version_template: PathBuf,

    pub redirect_template: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            repo_root: PathBuf::from("."),
            staging_dir: PathBuf::from("target/docs"),
            build_dir: PathBuf::from("target/docs_build"),
            scratch_dir: PathBuf::from("target/docs_checkout"),
            published_dir: PathBuf::from("target/gh-pages"),
            development: "master".to_string(),
            include_development: true,
            write_manifest: true,
            checkout: CheckoutMode::Worktree,
            git_program: "git".to_string(),
            build_program: "cargo".to_string(),
            build_args: vec!["doc".to_string(), "--no-deps".to_string()],
            target_dir_flag: "--target-dir".to_string(),
            build_output: PathBuf::from("doc"),
            index_template: PathBuf::from(".github/doc/index_template.html"),
            version_template: PathBuf::from(".github/doc/version_template.html"),
            redirect_template: PathBuf::from(".github/doc/index_redirect.html"),
        }
    }
}

/// What a publish run should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPlan {
    /// Reference generated in this run
    pub current: String,

    /// Branch holding previously published versions to carry over
    pub existing_from: Option<String>,

    /// Also regenerate every release tag
    pub all_tags: bool,
}

/// Result of a publish run.
#[derive(Debug)]
pub struct PublishReport {
    /// Versions listed in the master index, in order
    pub versions: Vec<String>,

    /// Versions built in this run, in build order
    pub generated: Vec<String>,

    /// Version directories carried over from the published tree
    pub copied: usize,

    /// Total run time in milliseconds
    pub duration_ms: u64,

    pub staging_dir: PathBuf,
}

/// Step of a publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Clean,
    CopyExisting,
    ResolveVersions,
    GenerateCurrent,
    GenerateTag(String),
    RenderIndex,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Clean => f.write_str("clean"),
            Stage::CopyExisting => f.write_str("copy existing"),
            Stage::ResolveVersions => f.write_str("resolve versions"),
            Stage::GenerateCurrent => f.write_str("generate current"),
            Stage::GenerateTag(tag) => write!(f, "generate {tag}"),
            Stage::RenderIndex => f.write_str("render index"),
            Stage::Done => f.write_str("done"),
        }
    }
}

#[derive(Serialize)]
struct Manifest<'a> {
    development: &'a str,
    versions: Vec<&'a str>,
}

/// Assembles a multi-version documentation site in a staging tree.
///
/// Checkouts mutate Git state, so two assemblers must never share a
/// repository and scratch directory at the same time.
pub struct SiteAssembler<R> {
    config: SiteConfig,
    runner: R,
}

impl<R: CommandRunner> SiteAssembler<R> {
    pub fn new(config: SiteConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.resolve(&self.config.staging_dir)
    }

    /// Run every stage of a publish.
    pub fn publish(&self, plan: &PublishPlan) -> Result<PublishReport, SiteError> {
        let start = Instant::now();
        let mut stage = Stage::Clean;

        match self.run_stages(plan, &mut stage) {
            Ok((versions, generated, copied)) => {
                tracing::info!("Publish {}", Stage::Done);
                Ok(PublishReport {
                    versions,
                    generated,
                    copied,
                    duration_ms: start.elapsed().as_millis() as u64,
                    staging_dir: self.staging_dir(),
                })
            }
            Err(e) => {
                tracing::error!("Publish failed during {}: {}", stage, e);
                Err(e)
            }
        }
    }

    fn run_stages(
        &self,
        plan: &PublishPlan,
        stage: &mut Stage,
    ) -> Result<(Vec<String>, Vec<String>, usize), SiteError> {
        self.enter(stage, Stage::Clean);
        self.clean()?;

        let mut copied = 0;
        if let Some(branch) = &plan.existing_from {
            self.enter(stage, Stage::CopyExisting);
            let tree = self.checkout_published(branch)?;
            copied = self.copy_existing(&tree)?;
        }

        self.enter(stage, Stage::ResolveVersions);
        let versions = self.resolve_versions()?;

        self.enter(stage, Stage::GenerateCurrent);
        self.generate_version(&plan.current)?;
        let mut generated = vec![plan.current.clone()];

        if plan.all_tags {
            for release in versions.releases() {
                if release.name() == plan.current {
                    continue;
                }
                self.enter(stage, Stage::GenerateTag(release.name().to_string()));
                self.generate_version(release.name())?;
                generated.push(release.name().to_string());
            }
        }

        self.enter(stage, Stage::RenderIndex);
        self.render_index(&versions)?;
        self.write_manifest(&versions)?;

        let listed = self
            .listed(&versions)
            .into_iter()
            .map(str::to_string)
            .collect();

        Ok((listed, generated, copied))
    }

    fn enter(&self, stage: &mut Stage, next: Stage) {
        tracing::debug!("Stage: {}", next);
        *stage = next;
    }

    /// Remove the staging tree and scratch checkouts, then recreate an empty
    /// staging root. Safe to call repeatedly.
    pub fn clean(&self) -> Result<(), SiteError> {
        let staging = self.staging_dir();
        remove_dir_if_exists(&staging)?;

        let mut removed_worktree = false;
        for dir in [
            self.resolve(&self.config.scratch_dir),
            self.resolve(&self.config.published_dir),
        ] {
            removed_worktree |= remove_dir_if_exists(&dir)?;
        }

        // Drop Git's bookkeeping for the worktrees deleted above.
        if removed_worktree {
            self.runner.run(&self.git().args(["worktree", "prune"]))?;
        }

        fs::create_dir_all(&staging).map_err(SiteError::io(&staging))?;
        tracing::debug!("Cleaned {}", staging.display());

        Ok(())
    }

    /// Check out the previously published site branch and return its path.
    pub fn checkout_published(&self, branch: &str) -> Result<PathBuf, SiteError> {
        let dir = absolute(&self.resolve(&self.config.published_dir))?;

        self.runner.run(
            &self
                .git()
                .args(["worktree", "add", "--force"])
                .arg(&dir)
                .arg(branch),
        )?;

        Ok(dir)
    }

    /// Copy every version directory of a published tree into staging.
    ///
    /// Hidden entries (`.git`, ...) and plain files are skipped.
    pub fn copy_existing(&self, source_tree: &Path) -> Result<usize, SiteError> {
        let staging = self.staging_dir();

        let mut dirs = Vec::new();
        for entry in fs::read_dir(source_tree).map_err(SiteError::io(source_tree))? {
            let entry = entry.map_err(SiteError::io(source_tree))?;
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') || !entry.path().is_dir() {
                continue;
            }
            dirs.push(name);
        }
        dirs.sort();

        for name in &dirs {
            let files = copy_tree(&source_tree.join(name), &staging.join(name))?;
            tracing::info!(
                "Carried over {} ({} files)",
                name.to_string_lossy(),
                files
            );
        }

        Ok(dirs.len())
    }

    /// List tags and order them for publishing.
    pub fn resolve_versions(&self) -> Result<VersionList, SiteError> {
        let listing = self.runner.run(&self.git().args(["tag", "--list"]))?;
        let versions = VersionList::resolve(&self.config.development, &listing)?;

        tracing::debug!("Resolved versions: {:?}", versions.names());
        Ok(versions)
    }

    /// Build the docs for `version` into `staging/<version>/`.
    pub fn generate_version(&self, version: &str) -> Result<(), SiteError> {
        // Read up front so a missing template fails before any checkout.
        let redirect = if self.wants_redirect(version) {
            Some(read_template(&self.resolve(&self.config.redirect_template))?)
        } else {
            None
        };

        tracing::info!("Generating docs for {}...", version);

        let build_dir = absolute(&self.resolve(&self.config.build_dir))?;
        let output = build_dir.join(&self.config.build_output);
        remove_dir_if_exists(&output)?;

        match self.config.checkout {
            CheckoutMode::Worktree => {
                let scratch = absolute(&self.resolve(&self.config.scratch_dir))?;
                if remove_dir_if_exists(&scratch)? {
                    self.runner.run(&self.git().args(["worktree", "prune"]))?;
                }

                self.runner.run(
                    &self
                        .git()
                        .args(["worktree", "add", "--force", "--detach"])
                        .arg(&scratch)
                        .arg(version),
                )?;
                self.build(&scratch, &build_dir)?;
                self.runner.run(
                    &self
                        .git()
                        .args(["worktree", "remove", "--force"])
                        .arg(&scratch),
                )?;
            }
            CheckoutMode::InPlace => {
                self.runner
                    .run(&self.git().args(["checkout", version, "--"]))?;
                self.build(&self.config.repo_root, &build_dir)?;
            }
        }

        if !output.is_dir() {
            return Err(SiteError::BuildOutputMissing { path: output });
        }

        let target = self.staging_dir().join(version);
        remove_dir_if_exists(&target)?;
        let files = copy_tree(&output, &target)?;

        if let Some(redirect) = redirect {
            let page = target.join("index.html");
            fs::write(&page, redirect).map_err(SiteError::io(&page))?;
        }

        tracing::info!("Staged {} ({} files)", version, files);
        Ok(())
    }

    /// Render the master index into `staging/index.html`.
    pub fn render_index(&self, versions: &VersionList) -> Result<String, SiteError> {
        let templates = Templates::load(
            &self.resolve(&self.config.index_template),
            &self.resolve(&self.config.version_template),
        )?;

        let html = templates.render_index(self.listed(versions))?;

        let staging = self.staging_dir();
        fs::create_dir_all(&staging).map_err(SiteError::io(&staging))?;
        let path = staging.join("index.html");
        fs::write(&path, &html).map_err(SiteError::io(&path))?;

        tracing::info!("Wrote index of {} versions", self.listed(versions).len());
        Ok(html)
    }

    /// Write `staging/versions.json`, if enabled.
    pub fn write_manifest(&self, versions: &VersionList) -> Result<Option<PathBuf>, SiteError> {
        if !self.config.write_manifest {
            return Ok(None);
        }

        let manifest = Manifest {
            development: versions.development().name(),
            versions: self.listed(versions),
        };
        let json = serde_json::to_string_pretty(&manifest)?;

        let staging = self.staging_dir();
        fs::create_dir_all(&staging).map_err(SiteError::io(&staging))?;
        let path = staging.join("versions.json");
        fs::write(&path, json).map_err(SiteError::io(&path))?;

        Ok(Some(path))
    }

    /// Versions shown in the master index.
    fn listed<'a>(&self, versions: &'a VersionList) -> Vec<&'a str> {
        versions
            .iter()
            .filter(|v| self.config.include_development || !v.is_development())
            .map(|v| v.name())
            .collect()
    }

    fn wants_redirect(&self, version: &str) -> bool {
        self.config.include_development || version != self.config.development
    }

    fn build(&self, source_dir: &Path, build_dir: &Path) -> Result<(), SiteError> {
        let cmd = Cmd::new(&self.config.build_program)
            .args(&self.config.build_args)
            .arg(&self.config.target_dir_flag)
            .arg(build_dir)
            .current_dir(source_dir);

        self.runner.run(&cmd)?;
        Ok(())
    }

    fn git(&self) -> Cmd {
        Cmd::new(&self.config.git_program).current_dir(&self.config.repo_root)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.repo_root.join(path)
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf, SiteError> {
    std::path::absolute(path).map_err(SiteError::io(path))
}

/// Remove a directory tree, returning whether anything was there.
fn remove_dir_if_exists(path: &Path) -> Result<bool, SiteError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(SiteError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Recursively copy `source` into `dest`, returning the number of files copied.
fn copy_tree(source: &Path, dest: &Path) -> Result<usize, SiteError> {
    let mut files = 0;

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| SiteError::Io {
            path: source.to_path_buf(),
            source: e.into(),
        })?;

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(SiteError::io(&target))?;
        } else {
            fs::copy(entry.path(), &target).map_err(SiteError::io(&target))?;
            files += 1;
        }
    }

    Ok(files)
}
