//! Splits a model reply into per-persona segments.
//!
//! The model is told to prefix each turn with `[Name]:`, but replies drift
//! to `**[Name]**:`, `__Name__:` or a bare `Name:`. All of those forms start
//! a new segment when they appear at the start of the text or right after a
//! newline. A bare name is any run of word characters and whitespace, so
//! ordinary prose such as `Note: ...` and `key: value` lines inside code
//! blocks start segments as well.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::catalog::Persona;

/// The label shown for text that carries no speaker header.
pub const UNATTRIBUTED_LABEL: &str = "DevSquad";

/// The role title shown for speakers outside of the persona catalog.
pub const UNKNOWN_ROLE_LABEL: &str = "System / Assistant";

static HEADER_REGEX: OnceLock<Regex> = OnceLock::new();

/// Matches a speaker header at the start of the haystack. The haystack
/// either starts the text or starts at a newline, which `\s*` consumes.
fn header_regex() -> &'static Regex {
    HEADER_REGEX.get_or_init(|| {
        Regex::new(
            r"(?x)
            ^\s*
            (?:\*\*|__)?
            (?:
                \[\s*(?P<bracketed>.*?)\s*\]
                |
                (?P<bare>[\w\s]+)
            )
            (?:\*\*|__)?
            \s*:\s*
            ",
        )
        .expect("Failed to compile speaker header regex")
    })
}

/// The speaker a segment is attributed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Speaker<'a> {
    /// No header, or a header with an empty name.
    Unattributed,
    /// A member of the persona catalog.
    Persona(&'a Persona),
    /// A header naming someone outside of the catalog, e.g. `System`.
    Unknown(Cow<'a, str>),
}

impl Speaker<'_> {
    /// Returns the name to display for this speaker.
    pub fn display_name(&self) -> &str {
        match self {
            Speaker::Unattributed => UNATTRIBUTED_LABEL,
            Speaker::Persona(persona) => persona.name,
            Speaker::Unknown(name) => name,
        }
    }

    /// Returns the role title to display for this speaker.
    pub fn role_title(&self) -> &str {
        match self {
            Speaker::Persona(persona) => persona.role.title(),
            Speaker::Unattributed | Speaker::Unknown(_) => UNKNOWN_ROLE_LABEL,
        }
    }

}

impl<'a> Speaker<'a> {
    /// Returns the persona, if the speaker is one.
    #[inline]
    pub fn persona(&self) -> Option<&'a Persona> {
        match self {
            Speaker::Persona(persona) => Some(*persona),
            _ => None,
        }
    }
}

/// A contiguous piece of a reply spoken by a single speaker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Who spoke this segment.
    pub speaker: Speaker<'a>,
    /// The text to display, with the header and surrounding whitespace
    /// removed.
    pub text: &'a str,
    /// The byte range of the part of the source this segment came from,
    /// header included. The ranges of all parts tile the source; parts
    /// made of whitespace only produce no segment.
    pub source: Range<usize>,
}

/// Splits `text` into segments, resolving speaker names against `personas`.
///
/// This is a pure function of its input and can be called on every
/// streaming prefix of a reply.
pub fn segment<'a>(
    text: &'a str,
    personas: &'a [Persona],
) -> Vec<Segment<'a>> {
    let regex = header_regex();
    let mut starts = vec![0];
    starts.extend(
        text.match_indices('\n')
            .map(|(idx, _)| idx)
            .filter(|&idx| idx > 0 && regex.is_match(&text[idx..])),
    );

    let ends = starts.iter().skip(1).copied().chain([text.len()]);
    starts
        .iter()
        .copied()
        .zip(ends)
        .filter_map(|(start, end)| parse_part(text, start..end, personas))
        .collect()
}

fn parse_part<'a>(
    text: &'a str,
    range: Range<usize>,
    personas: &'a [Persona],
) -> Option<Segment<'a>> {
    let part = &text[range.clone()];
    let trimmed = part.trim();
    if trimmed.is_empty() {
        return None;
    }

    let Some(caps) = header_regex().captures(part) else {
        return Some(Segment {
            speaker: Speaker::Unattributed,
            text: trimmed,
            source: range,
        });
    };

    let raw_name = caps
        .name("bracketed")
        .or_else(|| caps.name("bare"))
        .map_or("", |m| m.as_str());
    let speaker = resolve_speaker(raw_name, personas);

    let content = part[caps.get(0).map_or(0, |m| m.end())..].trim_end();
    // A header without content yet, e.g. a trailing `[Atlas]:` mid-stream.
    let text = if content.is_empty() { trimmed } else { content };

    Some(Segment {
        speaker,
        text,
        source: range,
    })
}

fn resolve_speaker<'a>(
    raw_name: &'a str,
    personas: &'a [Persona],
) -> Speaker<'a> {
    let name = if raw_name.contains(['*', '_']) {
        Cow::Owned(raw_name.replace(['*', '_'], "").trim().to_owned())
    } else {
        Cow::Borrowed(raw_name.trim())
    };
    if name.is_empty() {
        return Speaker::Unattributed;
    }
    match personas.iter().find(|p| p.answers_to(&name)) {
        Some(persona) => Speaker::Persona(persona),
        None => Speaker::Unknown(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PERSONAS;

    fn names<'a>(segments: &'a [Segment<'a>]) -> Vec<&'a str> {
        segments.iter().map(|s| s.speaker.display_name()).collect()
    }

    #[test]
    fn test_no_header() {
        let segments = segment("  Just thinking out loud.\n\n", &PERSONAS);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].speaker, Speaker::Unattributed);
        assert_eq!(segments[0].text, "Just thinking out loud.");
        assert_eq!(segments[0].speaker.display_name(), UNATTRIBUTED_LABEL);

        assert!(segment("", &PERSONAS).is_empty());
        assert!(segment(" \n\t", &PERSONAS).is_empty());
    }

    #[test]
    fn test_bracketed_headers() {
        let segments =
            segment("[Atlas]: Hi\n[Sarah]: Hello there", &PERSONAS);
        assert_eq!(names(&segments), ["Atlas", "Sarah"]);
        assert_eq!(segments[0].text, "Hi");
        assert_eq!(segments[1].text, "Hello there");
        assert_eq!(segments[1].speaker.role_title(), "Product Manager");
    }

    #[test]
    fn test_header_forms() {
        let text = "**[Marcus]**: Use Postgres.\n\
                    __Neo__: On it.\n\
                    Chloe: Tables below.\n\
                    [ data analyst ] : Same person, by role.";
        let segments = segment(text, &PERSONAS);
        assert_eq!(names(&segments), ["Marcus", "Neo", "Chloe", "Chloe"]);
        assert_eq!(segments[0].text, "Use Postgres.");
        assert_eq!(segments[3].text, "Same person, by role.");
    }

    #[test]
    fn test_multiline_segments() {
        let text = "[Atlas]: Welcome.\nLet's plan.\n\n[Neo]: Code:\n```js\nrun()\n```\n";
        let segments = segment(text, &PERSONAS);
        assert_eq!(names(&segments), ["Atlas", "Neo"]);
        assert_eq!(segments[0].text, "Welcome.\nLet's plan.");
        assert_eq!(segments[1].text, "Code:\n```js\nrun()\n```");
    }

    #[test]
    fn test_intro_text() {
        let segments = segment("Hello team\n[Atlas]: Hi", &PERSONAS);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].speaker, Speaker::Unattributed);
        assert_eq!(segments[0].text, "Hello team");
        assert_eq!(names(&segments)[1], "Atlas");
    }

    #[test]
    fn test_unknown_and_empty_names() {
        let segments = segment("[System]: Rebooting\n[]: nobody", &PERSONAS);
        assert_eq!(segments[0].speaker, Speaker::Unknown("System".into()));
        assert_eq!(segments[0].speaker.role_title(), UNKNOWN_ROLE_LABEL);
        assert_eq!(segments[1].speaker, Speaker::Unattributed);
        assert_eq!(segments[1].text, "nobody");
    }

    #[test]
    fn test_trailing_header_while_streaming() {
        let segments = segment("[Atlas]: Done.\n[Neo]:", &PERSONAS);
        assert_eq!(names(&segments), ["Atlas", "Neo"]);
        assert_eq!(segments[1].text, "[Neo]:");
    }

    #[test]
    fn test_every_prefix() {
        let text = "[Atlas]: Welcome aboard.\n**[Sarah]**: Stories:\n1. Login\n[Neo]: ```html\n<p>é</p>\n```";
        for (idx, _) in text.char_indices() {
            let prefix = &text[..idx];
            let segments = segment(prefix, &PERSONAS);
            for seg in &segments {
                assert!(!seg.text.trim().is_empty());
                assert!(seg.source.end <= prefix.len());
            }
        }
    }

    #[test]
    fn test_sources_tile_text() {
        let text = "Intro\n[Atlas]: A\n\n[Sarah]: B\n  \n[Neo]: C";
        let segments = segment(text, &PERSONAS);
        assert_eq!(segments.len(), 4);
        assert_eq!(segments[0].source.start, 0);

        // Only whitespace falls between the parts that became segments.
        let mut cursor = 0;
        for seg in &segments {
            assert!(text[cursor..seg.source.start].trim().is_empty());
            cursor = seg.source.end;
        }
        assert_eq!(cursor, text.len());
    }

    #[test]
    fn test_prose_label_splits_reply() {
        // Known limitation: a bare label in prose starts a new segment.
        let segments =
            segment("[Atlas]: Plan ready.\nNote: ship today", &PERSONAS);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].speaker, Speaker::Unknown("Note".into()));
        assert_eq!(segments[1].text, "ship today");
    }

    #[test]
    fn test_code_block_key_splits_reply() {
        // Known limitation: `key: value` lines inside code blocks are
        // mistaken for speaker headers.
        let text = "[Marcus]: Config:\n```yaml\nname: devsquad\n```";
        let segments = segment(text, &PERSONAS);
        assert_eq!(names(&segments), ["Marcus", "name"]);
        assert_eq!(segments[1].text, "devsquad\n```");
    }
}
