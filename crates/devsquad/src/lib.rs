//! A terminal front-end for the squad: a team of AI personas that plan,
//! design and build software together in one chat.
//!
//! The crate includes a CLI tool for chatting in the terminal. The command
//! parser and renderers are also usable as a library.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

/// Parsing of slash commands typed into the chat prompt.
pub mod command;
/// Rendering of chat output for the terminal.
pub mod render;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use devsquad_core::{Artifact, build_preview_document};

/// Writes the preview document of `artifact` into `dir` and returns the
/// path of the written file.
///
/// The file name is derived from the artifact id, so writing the same
/// artifact again replaces the previous document.
pub fn write_preview(artifact: &Artifact, dir: &Path) -> io::Result<PathBuf> {
    let path =
        dir.join(format!("devsquad-preview-{}.html", artifact.id.simple()));
    fs::create_dir_all(dir)?;
    fs::write(&path, build_preview_document(artifact))?;
    debug!("wrote preview of {} to {}", artifact.title, path.display());
    Ok(path)
}

/// Re-exports of [`devsquad_core`] crate.
pub mod core {
    pub use devsquad_core::*;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_preview() {
        let dir = std::env::temp_dir()
            .join(format!("devsquad-test-{}", std::process::id()));
        let artifact = Artifact::code("html", "<!DOCTYPE html><p>hi</p>");

        let path = write_preview(&artifact, &dir).unwrap();
        assert!(path.starts_with(&dir));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("html"));
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "<!DOCTYPE html><p>hi</p>");

        let again = write_preview(&artifact, &dir).unwrap();
        assert_eq!(again, path);

        fs::remove_dir_all(&dir).ok();
    }
}
