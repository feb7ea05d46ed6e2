use std::io::Write;
use std::process::Command;

use tempfile::NamedTempFile;

use crate::error::{HubNoteError, Result};

/// Detect the user's preferred editor.
/// Checks VISUAL -> EDITOR -> git config core.editor -> "vi"
pub fn detect_editor() -> String {
    for var in ["VISUAL", "EDITOR"] {
        if let Ok(editor) = std::env::var(var) {
            if !editor.trim().is_empty() {
                return editor;
            }
        }
    }

    if let Ok(output) = Command::new("git").args(["config", "core.editor"]).output() {
        if output.status.success() {
            let editor = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !editor.is_empty() {
                return editor;
            }
        }
    }

    "vi".to_string()
}

/// Open `initial` in the editor and return what was saved.
/// `Ok(None)` means the text came back empty or unchanged.
pub fn edit(initial: &str, editor_cmd: &str) -> Result<Option<String>> {
    // Removed when dropped, whichever way this returns
    let mut scratch = tempfile::Builder::new()
        .prefix("hubnote-")
        .suffix(".md")
        .tempfile()?;
    scratch.write_all(initial.as_bytes())?;
    scratch.flush()?;

    let status = Command::new("sh")
        .arg("-c")
        .arg(format!("{} \"$1\"", editor_cmd))
        .arg("hubnote-editor")
        .arg(scratch.path())
        .status()?;
    if !status.success() {
        return Err(HubNoteError::Validation(format!(
            "Editor exited with {}",
            status
        )));
    }

    let edited = read_back(&scratch)?;
    Ok(changed_text(initial, &edited))
}

/// Editors often save by renaming over the path, so read it by name.
fn read_back(scratch: &NamedTempFile) -> Result<String> {
    Ok(std::fs::read_to_string(scratch.path())?)
}

/// Trimmed edit result, or None if it is empty or identical to the original.
pub fn changed_text(original: &str, edited: &str) -> Option<String> {
    let edited = edited.trim();
    (!edited.is_empty() && edited != original.trim()).then(|| edited.to_string())
}

/// Reply template quoting a comment.
pub fn quote(author: &str, body: &str) -> String {
    let mut out: String = body
        .trim()
        .lines()
        .map(|line| {
            if line.is_empty() {
                ">\n".to_string()
            } else {
                format!("> {}\n", line)
            }
        })
        .collect();
    out.push_str(&format!("\n@{} ", author));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_or_empty_text_is_dropped() {
        assert_eq!(changed_text("hello", "hello\n"), None);
        assert_eq!(changed_text("hello", "   \n"), None);
        assert_eq!(changed_text("", "new body\n"), Some("new body".to_string()));
    }

    #[test]
    fn quote_prefixes_every_line() {
        assert_eq!(
            quote("alice", "first line\n\nsecond line\n"),
            "> first line\n>\n> second line\n\n@alice "
        );
    }

    #[test]
    fn edit_with_scripted_editor() {
        // Appends a line in place of an interactive editor
        let result = edit("draft", "sh -c 'echo reply >> \"$0\"'").unwrap();
        assert_eq!(result, Some("draftreply".to_string()));
    }

    #[test]
    fn failing_editor_is_an_error() {
        assert!(edit("draft", "false").is_err());
    }

    #[test]
    fn scratch_file_is_removed_after_edit() {
        let log = tempfile::NamedTempFile::new().unwrap();
        // Records the path it was handed, then exits non-zero
        let cmd = format!("sh -c 'echo \"$0\" > {}; exit 1'", log.path().display());
        assert!(edit("draft", &cmd).is_err());

        let seen = std::fs::read_to_string(log.path()).unwrap();
        let seen = std::path::Path::new(seen.trim());
        assert!(seen.file_name().unwrap().to_string_lossy().starts_with("hubnote-"));
        assert!(!seen.exists());
    }

    #[test]
    fn quote_prefill_is_not_a_change_by_itself() {
        let prefill = quote("bob", "lgtm");
        assert_eq!(changed_text(&prefill, &prefill), None);
    }
}
