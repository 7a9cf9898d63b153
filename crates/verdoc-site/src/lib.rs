//! Multi-version documentation site assembly.
//!
//! Checks out Git references, drives an external documentation build for each,
//! and stages the results as one directory per version plus a master index.

pub mod assembler;
pub mod error;
pub mod runner;
pub mod templates;
pub mod version;

pub use assembler::{CheckoutMode, PublishPlan, PublishReport, SiteAssembler, SiteConfig, Stage};
pub use error::SiteError;
pub use runner::{Cmd, CommandRunner, ProcessRunner};
pub use templates::{expand, RenderContext, TemplateError, Templates};
pub use version::{Version, VersionList};
