use std::fmt::Write;

use devsquad_core::catalog::{Persona, Template, Tool};
use devsquad_core::segment::{Segment, Speaker};
use devsquad_core::{Artifact, ChatStatus};
use owo_colors::{AnsiColors, OwoColorize};

/// The gutter drawn in front of every line of a reply.
pub const BAR_CHAR: &str = "▎";

/// Maps a persona accent token such as `blue-500` to a terminal color.
pub fn accent_color(accent: &str) -> AnsiColors {
    let hue = accent.split('-').next().unwrap_or(accent);
    match hue {
        "blue" => AnsiColors::BrightBlue,
        "purple" => AnsiColors::BrightMagenta,
        "orange" | "yellow" => AnsiColors::Yellow,
        "green" | "emerald" => AnsiColors::BrightGreen,
        "teal" | "cyan" => AnsiColors::BrightCyan,
        "red" => AnsiColors::BrightRed,
        _ => AnsiColors::White,
    }
}

fn speaker_color(speaker: &Speaker<'_>) -> AnsiColors {
    match speaker.persona() {
        Some(persona) => accent_color(persona.colors.accent),
        None => AnsiColors::BrightBlack,
    }
}

/// Renders the segments of a reply, one block per speaker.
pub fn render_reply(segments: &[Segment<'_>]) -> String {
    let mut out = String::new();
    for (idx, segment) in segments.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let color = speaker_color(&segment.speaker);
        let bar = BAR_CHAR.color(color);
        // Writing into a `String` never fails.
        let _ = writeln!(
            out,
            "{bar}{} {}",
            segment.speaker.display_name().color(color).bold(),
            segment.speaker.role_title().dimmed(),
        );
        for line in segment.text.lines() {
            let _ = writeln!(out, "{bar}{}", line.bright_white());
        }
    }
    out
}

/// Describes who is talking at the end of a partial reply.
pub fn activity_label(status: ChatStatus, segments: &[Segment<'_>]) -> String {
    match (status, segments.last()) {
        (ChatStatus::Streaming, Some(segment)) => {
            format!("✍️  {} is typing...", segment.speaker.display_name())
        }
        (ChatStatus::Streaming, None) => "✍️  Typing...".to_owned(),
        _ => "🤔 Thinking...".to_owned(),
    }
}

/// Lists artifacts with their 1-based numbers.
pub fn render_artifacts(artifacts: &[Artifact]) -> String {
    if artifacts.is_empty() {
        return "No artifacts yet.".dimmed().to_string();
    }
    let mut out = String::new();
    for (idx, artifact) in artifacts.iter().enumerate() {
        let lines = artifact.content.lines().count();
        let _ = write!(out, "{:>3}. {} ", idx + 1, artifact.title.bold());
        let _ = write!(out, "{}", format!("{lines} lines").dimmed());
        if artifact.is_previewable() {
            let _ = write!(out, " {}", "[previewable]".bright_green());
        }
        out.push('\n');
    }
    out
}

/// Lists the squad.
pub fn render_team(personas: &[Persona]) -> String {
    let mut out = String::new();
    for persona in personas {
        let color = accent_color(persona.colors.accent);
        let _ = writeln!(
            out,
            "{} {} {}",
            persona.name.color(color).bold(),
            format!("({})", persona.role).dimmed(),
            persona.description,
        );
    }
    out
}

/// Lists integrations, marking the enabled ones.
pub fn render_tools(tools: &[Tool], enabled: &[&Tool]) -> String {
    let mut out = String::new();
    for tool in tools {
        let mark = if enabled.iter().any(|t| t.id == tool.id) {
            "[x]".bright_green().to_string()
        } else {
            "[ ]".dimmed().to_string()
        };
        let _ = writeln!(
            out,
            "{mark} {:<10} {} {}",
            tool.id,
            tool.name.bold(),
            tool.description.dimmed(),
        );
    }
    out
}

/// Lists starter projects.
pub fn render_templates(templates: &[Template]) -> String {
    let mut out = String::new();
    for template in templates {
        let _ = writeln!(
            out,
            "{:<20} {} {}",
            template.id,
            template.name.bold(),
            template.description.dimmed(),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use devsquad_core::catalog::{PERSONAS, TEMPLATES, TOOLS};
    use devsquad_core::segment::segment;

    use super::*;

    #[test]
    fn test_render_reply() {
        let text = "[Atlas]: Hi\n[Oracle]: Two\nlines";
        let segments = segment(text, &PERSONAS);
        let out = render_reply(&segments);
        assert!(out.contains("Atlas"));
        assert!(out.contains("Team Leader"));
        assert!(out.contains("Oracle"));
        assert!(out.contains("System / Assistant"));
        // A header line plus one line per text line, and a blank separator.
        assert_eq!(out.lines().count(), 6);
        assert_eq!(out.matches(BAR_CHAR).count(), 5);
    }

    #[test]
    fn test_activity_label() {
        let segments = segment("[Atlas]: Hi\n[Neo]: ```", &PERSONAS);
        assert_eq!(
            activity_label(ChatStatus::Streaming, &segments),
            "✍️  Neo is typing..."
        );
        assert_eq!(
            activity_label(ChatStatus::Thinking, &[]),
            "🤔 Thinking..."
        );
    }

    #[test]
    fn test_accent_colors() {
        let colors: Vec<_> =
            PERSONAS.iter().map(|p| accent_color(p.colors.accent)).collect();
        assert!(!colors.contains(&AnsiColors::White));
        assert_eq!(accent_color("pink-500"), AnsiColors::White);
    }

    #[test]
    fn test_listings() {
        assert!(render_artifacts(&[]).contains("No artifacts yet."));
        let artifacts = [
            Artifact::code("py", "print(1)\nprint(2)"),
            Artifact::code("html", "<p/>"),
        ];
        let out = render_artifacts(&artifacts);
        assert_eq!(out.lines().count(), 2);
        assert!(out.contains("  1. "));
        assert!(out.contains("2 lines"));
        assert_eq!(out.matches("[previewable]").count(), 1);

        let out = render_tools(&TOOLS, &[&TOOLS[1]]);
        assert_eq!(out.lines().count(), TOOLS.len());
        assert_eq!(out.matches("[x]").count(), 1);

        assert_eq!(render_team(&PERSONAS).lines().count(), PERSONAS.len());
        assert!(render_templates(&TEMPLATES).contains("portfolio"));
    }
}
