//! File attachments.
//!
//! Attached files are read as text and appended to the outgoing user message,
//! one block per file:
//!
//! ```text
//!
//!
//! --- File: notes.txt ---
//! <file contents>
//! ```
//!
//! A file that cannot be read contributes [`READ_FAILURE`] instead of its
//! contents. Attachments only ever exist as text inside the sent message.

use std::fs;
use std::path::Path;

use tracing::warn;

pub const READ_FAILURE: &str = "[Failed to read file content]";

fn block(name: &str, content: &str) -> String {
    format!("\n\n--- File: {name} ---\n{content}")
}

/// Render every attachment in `paths`, in order.
pub fn render<P: AsRef<Path>>(paths: &[P]) -> String {
    let mut rendered = String::new();

    for path in paths {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match fs::read_to_string(path) {
            Ok(content) => rendered.push_str(&block(&name, &content)),
            Err(err) => {
                warn!("Failed to read file {}: {}", path.display(), err);
                rendered.push_str(&block(&name, READ_FAILURE));
            }
        }
    }

    rendered
}

/// Text actually sent upstream for `input` plus rendered attachments.
pub fn compose(input: &str, rendered: &str) -> String {
    format!("{}{}", input.trim(), rendered).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_render_readable_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "fn main() {{}}").unwrap();
        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();

        let rendered = render(&[file.path()]);
        assert_eq!(rendered, format!("\n\n--- File: {name} ---\nfn main() {{}}"));
    }

    #[test]
    fn test_render_missing_file_uses_marker() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone.txt");

        let rendered = render(&[missing]);
        assert_eq!(rendered, "\n\n--- File: gone.txt ---\n[Failed to read file content]");
    }

    #[test]
    fn test_render_keeps_order() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "alpha").unwrap();
        fs::write(&b, "beta").unwrap();

        let rendered = render(&[a, b]);
        let alpha = rendered.find("alpha").unwrap();
        let beta = rendered.find("beta").unwrap();
        assert!(alpha < beta);
    }

    #[test]
    fn test_compose_trims() {
        assert_eq!(compose("  hi  ", ""), "hi");
        assert_eq!(
            compose("", "\n\n--- File: a ---\nx"),
            "--- File: a ---\nx"
        );
        assert_eq!(
            compose(" look ", "\n\n--- File: a ---\nx\n"),
            "look\n\n--- File: a ---\nx"
        );
    }
}
