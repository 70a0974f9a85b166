//! Reference markers embedded in entry content.
//!
//! A marker of the form `#[[<id>]]` links one entry to another by its
//! identity. While both sides of a link are offline creations the marker
//! holds a provisional id; once the linked entry is assigned a server id
//! the marker is rewritten in place so the backlink stays resolvable.

use std::collections::HashSet;

use regex::Regex;

/// Extract the ids referenced by a text via `#[[<id>]]` markers.
///
/// Ids are returned deduplicated, in no particular order.
///
/// # Examples
///
/// ```
/// use satchel_core::rewrite::extract_references;
///
/// let refs = extract_references("see #[[42]] and #[[offline_1000_abc]]");
/// assert!(refs.contains(&"42".to_string()));
/// assert!(refs.contains(&"offline_1000_abc".to_string()));
/// ```
#[must_use]
pub fn extract_references(text: &str) -> Vec<String> {
    let re = Regex::new(r"#\[\[([^\[\]]+)\]\]").expect("Invalid regex");
    re.captures_iter(text)
        .map(|cap| cap[1].to_string())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect()
}

/// Replace every `#[[old_id]]` marker with `#[[new_id]]`.
///
/// Returns the rewritten content, or `None` when the text holds no marker
/// for `old_id` (so callers can skip persisting unchanged entries).
#[must_use]
pub fn rewrite_marker(text: &str, old_id: &str, new_id: &str) -> Option<String> {
    let old_marker = format!("#[[{old_id}]]");
    if !text.contains(&old_marker) {
        return None;
    }
    let new_marker = format!("#[[{new_id}]]");
    Some(text.replace(&old_marker, &new_marker))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn extract_references_finds_server_and_provisional_ids() {
        let refs = extract_references("trip notes #[[7]] and #[[offline_1000_def]] done");
        assert_eq!(refs.len(), 2);
        assert!(refs.contains(&"7".to_string()));
        assert!(refs.contains(&"offline_1000_def".to_string()));
    }

    #[test]
    fn extract_references_deduplicates() {
        let refs = extract_references("#[[9]] then #[[9]] again");
        assert_eq!(refs, vec!["9".to_string()]);
    }

    #[test]
    fn extract_references_ignores_plain_hashtags_and_empty_markers() {
        assert!(extract_references("just a #hashtag and #[[]]").is_empty());
    }

    #[test]
    fn rewrite_marker_replaces_all_occurrences() {
        let rewritten =
            rewrite_marker("a #[[offline_1_a]] b #[[offline_1_a]]", "offline_1_a", "42").unwrap();
        assert_eq!(rewritten, "a #[[42]] b #[[42]]");
    }

    #[test]
    fn rewrite_marker_returns_none_when_absent() {
        assert_eq!(rewrite_marker("no links here", "offline_1_a", "42"), None);
    }

    #[test]
    fn rewrite_marker_leaves_other_references_alone() {
        let rewritten = rewrite_marker("#[[offline_1_a]] #[[offline_1_b]]", "offline_1_a", "42")
            .unwrap();
        assert_eq!(rewritten, "#[[42]] #[[offline_1_b]]");
    }
}
