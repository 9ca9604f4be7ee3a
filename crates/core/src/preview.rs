//! Builds self-contained documents for previewing artifacts.
//!
//! A preview document is meant to be loaded into an isolated frame (see
//! [`PREVIEW_SANDBOX`]). Component code runs through
//! [`transpile_component_source`] and is compiled in the browser, with
//! runtime errors and console output surfaced inside the document itself.

mod rewrite;
mod shim;

pub use rewrite::transpile_component_source;
pub use shim::{Placeholder, SHIM_LIBRARIES, ShimLibrary, find_shim};

use crate::artifact::Artifact;

/// Sandbox tokens for the frame that hosts a preview document.
pub const PREVIEW_SANDBOX: &str =
    "allow-scripts allow-modals allow-forms allow-popups";

const DOCUMENT_LANGUAGES: [&str; 2] = ["html", "htm"];
const COMPONENT_LANGUAGES: [&str; 6] =
    ["tsx", "jsx", "javascript", "js", "ts", "typescript"];
const DIAGRAM_LANGUAGES: [&str; 1] = ["mermaid"];

/// How an artifact is turned into a preview document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PreviewKind {
    /// Already a full document, used as is.
    Document,
    /// Component or script source, wrapped into the runtime template.
    Component,
    /// A Mermaid diagram.
    Diagram,
    /// Anything else, shown as escaped source.
    Source,
}

/// Decides how `artifact` should be previewed.
pub fn classify(artifact: &Artifact) -> PreviewKind {
    let language = artifact.language();
    if DOCUMENT_LANGUAGES.contains(&language)
        || starts_document(&artifact.content)
    {
        PreviewKind::Document
    } else if COMPONENT_LANGUAGES.contains(&language) {
        PreviewKind::Component
    } else if DIAGRAM_LANGUAGES.contains(&language) {
        PreviewKind::Diagram
    } else {
        PreviewKind::Source
    }
}

fn starts_document(content: &str) -> bool {
    let head = content.trim_start();
    ["<!doctype html", "<html"].iter().any(|marker| {
        head.get(..marker.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(marker))
    })
}

/// Builds the preview document for `artifact`.
///
/// This never fails. Code that cannot be rewritten is left for the browser
/// to report, and the document shows such errors in place.
pub fn build_preview_document(artifact: &Artifact) -> String {
    let kind = classify(artifact);
    debug!("building a {kind:?} preview for {}", artifact.title);
    match kind {
        PreviewKind::Document => artifact.content.clone(),
        PreviewKind::Component => {
            let code = transpile_component_source(&artifact.content);
            include_str!("./preview/component.html")
                .replace("{{SHIMS}}", &shim::shim_script())
                .replace("{{CODE}}", &code)
        }
        PreviewKind::Diagram => include_str!("./preview/diagram.html")
            .replace("{{DIAGRAM}}", &escape_html(&artifact.content)),
        PreviewKind::Source => include_str!("./preview/source.html")
            .replace("{{LANGUAGE}}", &escape_html(artifact.language()))
            .replace("{{SOURCE}}", &escape_html(&artifact.content)),
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
