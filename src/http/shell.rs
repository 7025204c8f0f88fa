//! Document shell composition.
//!
//! # Responsibilities
//! - Validate that a shell template carries each marker exactly once
//! - Splice stylesheets, fragment markup and serialized state into it
//! - Inline stylesheet files tagged with the current static epoch
//!
//! # Design Decisions
//! - The template is split into pieces at load time, so composition is a
//!   single concatenation and injected content is never re-scanned for
//!   markers
//! - Templates failing validation are rejected at startup

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::AppError;
use crate::render::fragment::escape_attr;

/// Replaced with the inlined stylesheet block.
pub const STYLES_MARKER: &str = "<!-- fragment:styles -->";
/// Replaced with the rendered fragment.
pub const CONTENT_MARKER: &str = "<!-- fragment:content -->";
/// Replaced with the shared-state assignment.
pub const STATE_MARKER: &str = "window.INITIAL_STATE = {};";

const EMBEDDED_SHELL: &str = include_str!("shell.html");

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("shell template has no `{0}` marker")]
    MissingMarker(&'static str),

    #[error("shell template has {count} `{marker}` markers, expected exactly one")]
    DuplicateMarker { marker: &'static str, count: usize },

    #[error("failed to read shell template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Styles,
    Content,
    State,
}

impl Slot {
    fn marker(self) -> &'static str {
        match self {
            Slot::Styles => STYLES_MARKER,
            Slot::Content => CONTENT_MARKER,
            Slot::State => STATE_MARKER,
        }
    }
}

#[derive(Debug, Clone)]
enum Piece {
    Text(String),
    Slot(Slot),
}

/// A validated document template.
#[derive(Debug, Clone)]
pub struct ShellTemplate {
    pieces: Vec<Piece>,
}

impl ShellTemplate {
    /// Validate `source` and split it at the three markers.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut found = Vec::with_capacity(3);
        for slot in [Slot::Styles, Slot::Content, Slot::State] {
            let marker = slot.marker();
            let count = source.matches(marker).count();
            match count {
                0 => return Err(TemplateError::MissingMarker(marker)),
                1 => {}
                _ => return Err(TemplateError::DuplicateMarker { marker, count }),
            }
            if let Some(at) = source.find(marker) {
                found.push((at, slot));
            }
        }
        found.sort_by_key(|(at, _)| *at);

        let mut pieces = Vec::with_capacity(7);
        let mut cursor = 0;
        for (at, slot) in found {
            pieces.push(Piece::Text(source[cursor..at].to_string()));
            pieces.push(Piece::Slot(slot));
            cursor = at + slot.marker().len();
        }
        pieces.push(Piece::Text(source[cursor..].to_string()));

        Ok(Self { pieces })
    }

    /// Read and validate a template file.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }

    /// The template compiled into the binary.
    pub fn embedded() -> Self {
        Self::parse(EMBEDDED_SHELL).expect("embedded shell template carries all markers")
    }

    /// Splice the three pieces of content into the template.
    pub fn compose(&self, styles: &str, content: &str, state_json: &str) -> String {
        let mut out = String::with_capacity(
            self.pieces
                .iter()
                .map(|p| match p {
                    Piece::Text(t) => t.len(),
                    Piece::Slot(_) => 0,
                })
                .sum::<usize>()
                + styles.len()
                + content.len()
                + state_json.len()
                + 32,
        );

        for piece in &self.pieces {
            match piece {
                Piece::Text(text) => out.push_str(text),
                Piece::Slot(Slot::Styles) => out.push_str(styles),
                Piece::Slot(Slot::Content) => out.push_str(content),
                Piece::Slot(Slot::State) => {
                    out.push_str("window.INITIAL_STATE = ");
                    out.push_str(&escape_script_json(state_json));
                    out.push(';');
                }
            }
        }
        out
    }
}

/// Keep serialized JSON from closing the surrounding `<script>` element.
fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

/// Inline each stylesheet (relative to `static_dir`) as a `<style>` element
/// tagged with `epoch`. Duplicates are emitted once, in first-seen order.
pub async fn stylesheet_block(
    static_dir: &Path,
    sheets: &[String],
    epoch: u64,
) -> Result<String, AppError> {
    let mut seen: Vec<&str> = Vec::with_capacity(sheets.len());
    let mut block = String::new();

    for sheet in sheets {
        if seen.contains(&sheet.as_str()) {
            continue;
        }
        seen.push(sheet);

        let css = tokio::fs::read_to_string(static_dir.join(sheet)).await?;
        block.push_str(&format!(
            "<style data-stylesheet=\"{}\" data-epoch=\"{epoch}\">{css}</style>",
            escape_attr(sheet)
        ));
    }

    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "<head><!-- fragment:styles --></head><body><!-- fragment:content --><script>window.INITIAL_STATE = {};</script></body>";

    #[test]
    fn test_embedded_template_is_valid() {
        let shell = ShellTemplate::embedded();
        let out = shell.compose("", "<p>x</p>", "{}");
        assert!(out.contains("<div id=\"root\"><p>x</p></div>"));
    }

    #[test]
    fn test_embedded_template_wires_client_events() {
        assert_eq!(EMBEDDED_SHELL.matches(STATE_MARKER).count(), 1);
        assert!(EMBEDDED_SHELL.contains("closest(\"[data-component-id]\")"));
        assert!(EMBEDDED_SHELL.contains("fetch(\"/api/event\""));
        assert!(EMBEDDED_SHELL.contains("eventName: el.getAttribute(\"data-event\")"));
    }

    #[test]
    fn test_compose_fills_all_markers() {
        let shell = ShellTemplate::parse(TEMPLATE).unwrap();
        let out = shell.compose("<style>a{}</style>", "<main>hi</main>", r#"{"n":1}"#);
        assert_eq!(
            out,
            "<head><style>a{}</style></head><body><main>hi</main><script>window.INITIAL_STATE = {\"n\":1};</script></body>"
        );
    }

    #[test]
    fn test_missing_marker_rejected() {
        let err = ShellTemplate::parse("<body><!-- fragment:content --></body>").unwrap_err();
        assert!(matches!(err, TemplateError::MissingMarker(STYLES_MARKER)));
    }

    #[test]
    fn test_duplicate_marker_rejected() {
        let source = format!("{TEMPLATE}{CONTENT_MARKER}");
        let err = ShellTemplate::parse(&source).unwrap_err();
        assert!(matches!(
            err,
            TemplateError::DuplicateMarker { marker: CONTENT_MARKER, count: 2 }
        ));
    }

    #[test]
    fn test_content_is_not_rescanned() {
        let shell = ShellTemplate::parse(TEMPLATE).unwrap();
        let out = shell.compose("", STATE_MARKER, "{}");
        assert_eq!(out.matches(STATE_MARKER).count(), 2);
    }

    #[test]
    fn test_state_cannot_close_script() {
        let shell = ShellTemplate::parse(TEMPLATE).unwrap();
        let out = shell.compose("", "", r#"{"x":"</script>"}"#);
        assert!(out.contains(r#"{"x":"<\/script>"}"#));
    }

    #[tokio::test]
    async fn test_stylesheet_block_tags_epoch() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site.css"), "body{margin:0}").unwrap();

        let sheets = vec!["site.css".to_string(), "site.css".to_string()];
        let block = stylesheet_block(dir.path(), &sheets, 1700000000).await.unwrap();
        assert_eq!(
            block,
            "<style data-stylesheet=\"site.css\" data-epoch=\"1700000000\">body{margin:0}</style>"
        );
    }

    #[tokio::test]
    async fn test_missing_stylesheet_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = stylesheet_block(dir.path(), &["nope.css".to_string()], 0)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
