//! Placeholder templates for the master index, version rows and redirect pages.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SiteError;

/// Values substituted into a template's `{name}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    values: BTreeMap<String, String>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Errors that can occur while expanding a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    #[error("Unknown template placeholder: {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("Unbalanced brace at byte {offset}")]
    UnbalancedBrace { offset: usize },
}

/// Expand `{name}` placeholders in `template` from `context`.
///
/// `{{` and `}}` produce literal braces. Expansion has no side effects.
pub fn expand(template: &str, context: &RenderContext) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut offset = 0;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let brace = &rest[pos..];

        if brace.starts_with("{{") || brace.starts_with("}}") {
            out.push_str(&brace[..1]);
            rest = &brace[2..];
            offset += pos + 2;
            continue;
        }

        if brace.starts_with('}') {
            return Err(TemplateError::UnbalancedBrace {
                offset: offset + pos,
            });
        }

        let Some(close) = brace.find('}') else {
            return Err(TemplateError::UnbalancedBrace {
                offset: offset + pos,
            });
        };

        let name = &brace[1..close];
        if name.contains('{') {
            return Err(TemplateError::UnbalancedBrace {
                offset: offset + pos,
            });
        }

        let value = context
            .get(name)
            .ok_or_else(|| TemplateError::UnknownPlaceholder(name.to_string()))?;
        out.push_str(value);

        rest = &brace[close + 1..];
        offset += pos + close + 1;
    }

    out.push_str(rest);
    Ok(out)
}

/// Join lines and squeeze runs of spaces and tabs into one space.
pub fn collapse_whitespace(text: &str) -> String {
    static RUNS: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[ \t]+").expect("Invalid whitespace regex"));

    let joined: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    RUNS.replace_all(&joined, " ").into_owned()
}

/// The index and row templates a master index is rendered from.
#[derive(Debug, Clone)]
pub struct Templates {
    /// Master index, with a `{versions}` placeholder
    pub index: String,
    /// One row of the master index, with a `{version}` placeholder
    pub version: String,
}

impl Templates {
    /// Load the index and row templates.
    pub fn load(index: &Path, version: &Path) -> Result<Self, SiteError> {
        Ok(Self {
            index: read_template(index)?,
            version: read_template(version)?,
        })
    }

    /// Render the master index for `versions`, in order.
    pub fn render_index<'a>(
        &self,
        versions: impl IntoIterator<Item = &'a str>,
    ) -> Result<String, TemplateError> {
        let mut rows = String::new();
        for version in versions {
            rows.push_str(&expand(
                &self.version,
                &RenderContext::new().with("version", version),
            )?);
        }

        let html = expand(&self.index, &RenderContext::new().with("versions", rows))?;
        Ok(collapse_whitespace(&html))
    }
}

/// Read a template file, reporting an absent file as [`SiteError::TemplateMissing`].
pub fn read_template(path: &Path) -> Result<String, SiteError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SiteError::TemplateMissing {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(SiteError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Redirect page forwarding a version root to the crate's rustdoc entry point.
pub fn redirect_template(crate_name: &str) -> String {
    let target = crate_name.replace('-', "_");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta http-equiv="refresh" content="0; url=./{target}/index.html">
  <link rel="canonical" href="./{target}/index.html">
  <title>Redirecting...</title>
</head>
<body>
  <p>Redirecting to <a href="./{target}/index.html">./{target}/index.html</a>...</p>
</body>
</html>
"#
    )
}

pub const DEFAULT_INDEX_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>Documentation</title>
  <style>
    body {{ font-family: system-ui, -apple-system, sans-serif; max-width: 40rem; margin: 3rem auto; }}
    li {{ margin: 0.25rem 0; }}
  </style>
</head>
<body>
  <h1>Documentation</h1>
  <ul class="versions">
    {versions}
  </ul>
</body>
</html>
"##;

pub const DEFAULT_VERSION_TEMPLATE: &str = r#"<li><a href="./{version}/">{version}</a></li>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn templates() -> Templates {
        Templates {
            index: "<ul>\n  {versions}\n</ul>".to_string(),
            version: "<li>{version}</li>\n".to_string(),
        }
    }

    #[test]
    fn expands_named_placeholders() {
        let ctx = RenderContext::new().with("version", "v1.0.0");

        let out = expand(r#"<a href="{version}/">{version}</a>"#, &ctx).unwrap();

        assert_eq!(out, r#"<a href="v1.0.0/">v1.0.0</a>"#);
    }

    #[test]
    fn doubled_braces_are_literal() {
        let ctx = RenderContext::new().with("versions", "x");

        let out = expand("a {{ color: red; }} {versions}", &ctx).unwrap();

        assert_eq!(out, "a { color: red; } x");
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let err = expand("{nope}", &RenderContext::new()).unwrap_err();

        assert_eq!(err, TemplateError::UnknownPlaceholder("nope".to_string()));
    }

    #[test]
    fn unbalanced_braces_are_errors() {
        let ctx = RenderContext::new().with("a", "1");

        assert_eq!(
            expand("ok {a} {", &ctx).unwrap_err(),
            TemplateError::UnbalancedBrace { offset: 7 }
        );
        assert_eq!(
            expand("}", &ctx).unwrap_err(),
            TemplateError::UnbalancedBrace { offset: 0 }
        );
        assert!(matches!(
            expand("{a{b}", &ctx),
            Err(TemplateError::UnbalancedBrace { offset: 0 })
        ));
    }

    #[test]
    fn values_are_not_reexpanded() {
        let ctx = RenderContext::new().with("version", "{versions}");

        assert_eq!(expand("{version}", &ctx).unwrap(), "{versions}");
    }

    #[test]
    fn collapses_joined_lines() {
        assert_eq!(
            collapse_whitespace("<ul>\n    <li>a</li>\n\t\t<li>b</li>\r\n</ul>"),
            "<ul> <li>a</li> <li>b</li></ul>"
        );
    }

    #[test]
    fn renders_one_row_per_version_in_order() {
        let html = templates()
            .render_index(["master", "v1.10.0", "v1.2.0"])
            .unwrap();

        assert_eq!(
            html,
            "<ul> <li>master</li><li>v1.10.0</li><li>v1.2.0</li></ul>"
        );
        assert_eq!(html.matches("<li>").count(), 3);
    }

    #[test]
    fn rendering_is_idempotent() {
        let tpl = templates();

        let first = tpl.render_index(["master", "v0.1.0"]).unwrap();
        let second = tpl.render_index(["master", "v0.1.0"]).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn default_templates_render() {
        let tpl = Templates {
            index: DEFAULT_INDEX_TEMPLATE.to_string(),
            version: DEFAULT_VERSION_TEMPLATE.to_string(),
        };

        let html = tpl.render_index(["master", "v1.0.0"]).unwrap();

        assert!(html.contains(r#"<a href="./v1.0.0/">v1.0.0</a>"#));
        assert!(html.contains("body { font-family"));
    }

    #[test]
    fn redirect_points_at_crate_docs() {
        let html = redirect_template("static-vector");

        assert!(html.contains("url=./static_vector/index.html"));
        assert!(!html.contains('{'));
    }

    #[test]
    fn missing_template_file() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("index_template.html");

        let err = Templates::load(&path, &path).unwrap_err();

        assert!(matches!(err, SiteError::TemplateMissing { path: p } if p == path));
    }
}
