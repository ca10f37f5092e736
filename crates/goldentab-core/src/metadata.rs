//! Bookmark title metadata codec.
//!
//! Bookmark titles carry their flags in a trailing brace group:
//!
//! ```text
//! Research {*,workspace}
//! Paper {*,note:read section 3}
//! ```
//!
//! [`build_title`] is the only code path that writes a title with embedded
//! metadata. Flags this module does not understand are carried through
//! [`TitleMetadata::flags`] untouched.
//!
//! A display title that itself ends in a brace group (`"Notes (Q3) {draft}"`)
//! cannot be told apart from a metadata-bearing title; the last brace group
//! always wins and the display part is captured non-greedily.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Display title used when a title is empty or has an empty display part.
pub const UNTITLED: &str = "Untitled";

/// Flag marking a bookmark as starred. Always serialized first.
pub const STARRED_FLAG: &str = "*";

/// Flag marking a folder as a workspace.
pub const WORKSPACE_FLAG: &str = "workspace";

/// Prefix of the note pseudo-flag (`note:<text>`).
pub const NOTE_PREFIX: &str = "note:";

/// Default upper bound on note length, in characters.
pub const DEFAULT_NOTE_MAX_LEN: usize = 250;

static TITLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?) \{([^}]*)\}$").expect("title pattern is valid"));

/// Flags decoded from a bookmark title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleMetadata {
    pub starred: bool,
    pub workspace: bool,
    /// Free-form note stored as a `note:<text>` flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Every token found in the brace group, in order, including the ones
    /// mirrored by the boolean fields.
    #[serde(rename = "_flags", default)]
    pub flags: Vec<String>,
}

impl TitleMetadata {
    pub fn has_note(&self) -> bool {
        self.note.as_deref().is_some_and(|n| !n.is_empty())
    }
}

/// A title split into its display part and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTitle {
    pub display_title: String,
    pub metadata: TitleMetadata,
}

/// Splits a raw bookmark title into display text and metadata.
pub fn parse_title(title: &str) -> ParsedTitle {
    if title.is_empty() {
        return ParsedTitle {
            display_title: UNTITLED.to_string(),
            metadata: TitleMetadata::default(),
        };
    }

    let Some(captures) = TITLE_PATTERN.captures(title) else {
        return ParsedTitle {
            display_title: title.to_string(),
            metadata: TitleMetadata::default(),
        };
    };

    let display = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let display_title = if display.is_empty() {
        UNTITLED.to_string()
    } else {
        display.to_string()
    };

    let flags: Vec<String> = captures
        .get(2)
        .map(|m| m.as_str())
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();

    let note = flags
        .iter()
        .find_map(|f| f.strip_prefix(NOTE_PREFIX))
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    ParsedTitle {
        display_title,
        metadata: TitleMetadata {
            starred: flags.iter().any(|f| f == STARRED_FLAG),
            workspace: flags.iter().any(|f| f == WORKSPACE_FLAG),
            note,
            flags,
        },
    }
}

/// Encodes display text and metadata back into a raw title.
///
/// Starts from `metadata.flags`, then reconciles the starred flag (moved to
/// the front), the workspace flag (appended when newly set) and the note
/// token (replaced in place, appended when new). No suffix is emitted when
/// the resulting flag list is empty.
pub fn build_title(display_title: &str, metadata: &TitleMetadata) -> String {
    let mut flags: Vec<String> = metadata
        .flags
        .iter()
        .filter(|f| f.as_str() != STARRED_FLAG)
        .cloned()
        .collect();

    if metadata.starred {
        flags.insert(0, STARRED_FLAG.to_string());
    }

    let has_workspace = flags.iter().any(|f| f == WORKSPACE_FLAG);
    if metadata.workspace && !has_workspace {
        flags.push(WORKSPACE_FLAG.to_string());
    } else if !metadata.workspace && has_workspace {
        flags.retain(|f| f != WORKSPACE_FLAG);
    }

    let note = metadata
        .note
        .as_deref()
        .map(|n| sanitize_note(n, DEFAULT_NOTE_MAX_LEN))
        .filter(|n| !n.is_empty());
    let note_position = flags.iter().position(|f| f.starts_with(NOTE_PREFIX));
    flags.retain(|f| !f.starts_with(NOTE_PREFIX));
    if let Some(note) = note {
        let token = format!("{NOTE_PREFIX}{note}");
        match note_position {
            Some(index) if index <= flags.len() => flags.insert(index, token),
            _ => flags.push(token),
        }
    }

    if flags.is_empty() {
        return display_title.to_string();
    }
    format!("{} {{{}}}", display_title, flags.join(","))
}

/// Makes note text safe to embed in a flag list.
///
/// Separators of the title grammar become spaces, surrounding whitespace is
/// trimmed and the result is cut to `max_len` characters.
pub fn sanitize_note(text: &str, max_len: usize) -> String {
    let replaced: String = text
        .chars()
        .map(|c| match c {
            ',' | '{' | '}' | '\n' | '\r' => ' ',
            other => other,
        })
        .collect();
    let truncated: String = replaced.trim().chars().take(max_len).collect();
    truncated.trim_end().to_string()
}

pub fn is_starred(title: &str) -> bool {
    parse_title(title).metadata.starred
}

pub fn is_workspace(title: &str) -> bool {
    parse_title(title).metadata.workspace
}

/// Returns only the display part of a title.
pub fn display_title(title: &str) -> String {
    parse_title(title).display_title
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(starred: bool, workspace: bool) -> TitleMetadata {
        TitleMetadata {
            starred,
            workspace,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_plain_title() {
        let parsed = parse_title("Rust Book");
        assert_eq!(parsed.display_title, "Rust Book");
        assert_eq!(parsed.metadata, TitleMetadata::default());
    }

    #[test]
    fn test_parse_empty_title_is_untitled() {
        assert_eq!(parse_title("").display_title, UNTITLED);
        assert_eq!(parse_title(" {*}").display_title, UNTITLED);
        assert!(parse_title(" {*}").metadata.starred);
    }

    #[test]
    fn test_parse_flags() {
        let parsed = parse_title("Research { *, workspace ,, pinned }");
        assert_eq!(parsed.display_title, "Research");
        assert!(parsed.metadata.starred);
        assert!(parsed.metadata.workspace);
        assert_eq!(parsed.metadata.flags, vec!["*", "workspace", "pinned"]);
    }

    #[test]
    fn test_parse_uses_last_brace_group() {
        let parsed = parse_title("Meeting notes (Q3) {draft}");
        assert_eq!(parsed.display_title, "Meeting notes (Q3)");
        assert_eq!(parsed.metadata.flags, vec!["draft"]);

        let parsed = parse_title("a {x} {*}");
        assert_eq!(parsed.display_title, "a {x}");
        assert!(parsed.metadata.starred);
    }

    #[test]
    fn test_build_without_flags_has_no_suffix() {
        assert_eq!(build_title("Plain", &TitleMetadata::default()), "Plain");
        assert_eq!(build_title("Plain", &meta(false, false)), "Plain");
    }

    #[test]
    fn test_build_puts_star_first_and_workspace_last() {
        let mut metadata = meta(true, true);
        metadata.flags = vec!["pinned".to_string()];
        assert_eq!(build_title("R", &metadata), "R {*,pinned,workspace}");

        let metadata = parse_title("R {pinned,*}").metadata;
        assert_eq!(build_title("R", &metadata), "R {*,pinned}");
    }

    #[test]
    fn test_build_removes_cleared_flags() {
        let mut metadata = parse_title("R {*,foo,workspace}").metadata;
        metadata.starred = false;
        metadata.workspace = false;
        assert_eq!(build_title("R", &metadata), "R {foo}");
    }

    #[test]
    fn test_round_trip_for_all_flag_combinations() {
        let notes = [None, Some("check the appendix".to_string())];
        for display in ["Paper", "Research folder", "x"] {
            for starred in [false, true] {
                for workspace in [false, true] {
                    for note in &notes {
                        let metadata = TitleMetadata {
                            starred,
                            workspace,
                            note: note.clone(),
                            flags: vec!["foreign".to_string()],
                        };
                        let parsed = parse_title(&build_title(display, &metadata));
                        assert_eq!(parsed.display_title, display);
                        assert_eq!(parsed.metadata.starred, starred);
                        assert_eq!(parsed.metadata.workspace, workspace);
                        assert_eq!(&parsed.metadata.note, note);
                        assert!(parsed.metadata.flags.contains(&"foreign".to_string()));
                    }
                }
            }
        }
    }

    #[test]
    fn test_reencode_is_identity_for_normalized_titles() {
        for title in ["Paper {*}", "Research {workspace}", "X {*,a,b,workspace}", "Plain"] {
            let parsed = parse_title(title);
            assert_eq!(build_title(&parsed.display_title, &parsed.metadata), title);
        }
    }

    #[test]
    fn test_note_replaced_in_place_and_removed() {
        let mut metadata = parse_title("P {*,note:old,workspace}").metadata;
        assert_eq!(metadata.note.as_deref(), Some("old"));

        metadata.note = Some("new text".to_string());
        assert_eq!(build_title("P", &metadata), "P {*,note:new text,workspace}");

        metadata.note = Some(String::new());
        assert_eq!(build_title("P", &metadata), "P {*,workspace}");
    }

    #[test]
    fn test_note_is_sanitized() {
        let metadata = TitleMetadata {
            note: Some("a, b {c}".to_string()),
            ..Default::default()
        };
        let title = build_title("P", &metadata);
        let parsed = parse_title(&title);
        assert_eq!(parsed.display_title, "P");
        assert_eq!(parsed.metadata.note.as_deref(), Some("a  b  c"));
    }

    #[test]
    fn test_sanitize_note_truncates() {
        let long = "x".repeat(300);
        assert_eq!(sanitize_note(&long, DEFAULT_NOTE_MAX_LEN).chars().count(), 250);
    }

    #[test]
    fn test_predicates() {
        assert!(is_starred("Paper {*}"));
        assert!(!is_starred("Paper"));
        assert!(is_workspace("Research {workspace}"));
        assert_eq!(display_title("Research {workspace}"), "Research");
    }
}
