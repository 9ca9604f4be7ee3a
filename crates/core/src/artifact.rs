//! Extraction of fenced code blocks from model replies.

use std::sync::OnceLock;

use chrono::Local;
use regex::Regex;
use uuid::Uuid;

/// The language assumed for a fence without a language token.
pub const DEFAULT_LANGUAGE: &str = "text";

const PREVIEWABLE_LANGUAGES: [&str; 5] =
    ["html", "tsx", "jsx", "javascript", "js"];

static FENCE_REGEX: OnceLock<Regex> = OnceLock::new();

fn fence_regex() -> &'static Regex {
    FENCE_REGEX.get_or_init(|| {
        Regex::new(r"```(?P<lang>[\w+#-]+)?\s*(?P<content>(?s:.*?))```")
            .expect("Failed to compile code fence regex")
    })
}

/// The kind of an artifact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Source code from a fenced block.
    #[default]
    Code,
    /// A prose document.
    Markdown,
    /// A project plan.
    Plan,
}

/// A piece of content produced by the squad, such as a code file or a
/// diagram.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Artifact {
    pub id: Uuid,
    /// Human-readable label. Not necessarily unique.
    pub title: String,
    pub kind: ArtifactKind,
    /// Trimmed block content, unique among the artifacts of a project.
    pub content: String,
    /// Lower-cased language tag.
    pub language: Option<String>,
}

impl Artifact {
    /// Creates a code artifact titled after the current local time.
    pub fn code(language: &str, content: impl Into<String>) -> Self {
        let language = language.to_lowercase();
        Self {
            id: Uuid::new_v4(),
            title: format!(
                "Snippet {} ({language})",
                Local::now().format("%H:%M:%S")
            ),
            kind: ArtifactKind::Code,
            content: content.into(),
            language: Some(language),
        }
    }

    /// Returns the language tag, or `text` if there is none.
    #[inline]
    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE)
    }

    /// Returns `true` if this artifact can be run in a preview document.
    pub fn is_previewable(&self) -> bool {
        self.language
            .as_deref()
            .is_some_and(|lang| PREVIEWABLE_LANGUAGES.contains(&lang))
    }
}

/// Returns the most recent artifact that can be previewed.
pub fn latest_previewable(artifacts: &[Artifact]) -> Option<&Artifact> {
    artifacts.iter().rev().find(|a| a.is_previewable())
}

/// Collects the fenced code blocks of `text` as new artifacts.
///
/// Blocks with blank content are skipped, and so are blocks whose trimmed
/// content equals that of an artifact in `existing` or of a block earlier
/// in `text`.
pub fn extract(text: &str, existing: &[Artifact]) -> Vec<Artifact> {
    let mut found: Vec<Artifact> = vec![];
    for caps in fence_regex().captures_iter(text) {
        let content = caps.name("content").map_or("", |m| m.as_str()).trim();
        if content.is_empty() {
            continue;
        }
        let seen = existing
            .iter()
            .chain(found.iter())
            .any(|a| a.content == content);
        if seen {
            trace!("skipped a duplicated code block");
            continue;
        }

        let language =
            caps.name("lang").map_or(DEFAULT_LANGUAGE, |m| m.as_str());
        found.push(Artifact::code(language, content));
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract() {
        let text = "[Neo]: Here you go:\n```js\nconsole.log(1)\n```\n\
                    and a page:\n```HTML\n<p>hi</p>\n```";
        let artifacts = extract(text, &[]);
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].language(), "js");
        assert_eq!(artifacts[0].content, "console.log(1)");
        assert_eq!(artifacts[0].kind, ArtifactKind::Code);
        assert!(artifacts[0].title.starts_with("Snippet "));
        assert!(artifacts[0].title.ends_with(" (js)"));
        assert_eq!(artifacts[1].language(), "html");
        assert_ne!(artifacts[0].id, artifacts[1].id);

        // Running again over the same text yields nothing new.
        assert!(extract(text, &artifacts).is_empty());
    }

    #[test]
    fn test_default_language() {
        let artifacts = extract("```\nplain words\n```", &[]);
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].language.as_deref(), Some("text"));
        assert!(!artifacts[0].is_previewable());
    }

    #[test]
    fn test_skips_blank_and_duplicated_blocks() {
        let text = "```js\n   \n```\n```js\nrun()\n```\n```jsx\n  run()  \n```";
        let artifacts = extract(text, &[]);
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].content, "run()");
        assert!(artifacts.iter().all(|a| !a.content.trim().is_empty()));
    }

    #[test]
    fn test_unterminated_fence() {
        assert!(extract("```js\nconsole.log(", &[]).is_empty());
    }

    #[test]
    fn test_language_tokens() {
        let text = "```c++\nint x;\n```\n```c#\nvar y;\n```";
        let artifacts = extract(text, &[]);
        let langs: Vec<_> = artifacts.iter().map(|a| a.language()).collect();
        assert_eq!(langs, ["c++", "c#"]);
    }

    #[test]
    fn test_latest_previewable() {
        let artifacts = vec![
            Artifact::code("tsx", "export default function App() {}"),
            Artifact::code("html", "<p>page</p>"),
            Artifact::code("mermaid", "graph TD\nA-->B"),
        ];
        let latest = latest_previewable(&artifacts).map(|a| a.language());
        assert_eq!(latest, Some("html"));
        assert!(latest_previewable(&artifacts[2..]).is_none());
    }
}
