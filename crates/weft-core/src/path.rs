//! Dotted property paths.
//!
//! A path is a sequence of identifier segments separated by `.`, addressing
//! one node in a [`PropertyStore`](crate::store::PropertyStore) tree.

/// Iterate over the segments of a dotted path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.')
}

/// Final segment of a path (`"a.b.c"` → `"c"`).
pub fn last_segment(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Append a segment to a path prefix. An empty prefix yields the segment
/// itself, so incremental walks can start from `""`.
pub fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_owned()
    } else {
        let mut out = String::with_capacity(prefix.len() + 1 + segment.len());
        out.push_str(prefix);
        out.push('.');
        out.push_str(segment);
        out
    }
}

/// Whether `path` addresses a node at or below `prefix`.
pub fn is_descendant_of(path: &str, prefix: &str) -> bool {
    path == prefix || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_split_on_dots() {
        let segs: Vec<_> = segments("a.b.c").collect();
        assert_eq!(segs, vec!["a", "b", "c"]);
    }

    #[test]
    fn single_segment_path() {
        let segs: Vec<_> = segments("user").collect();
        assert_eq!(segs, vec!["user"]);
        assert_eq!(last_segment("user"), "user");
    }

    #[test]
    fn join_from_empty_prefix() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a", "b"), "a.b");
    }

    #[test]
    fn last_segment_of_nested_path() {
        assert_eq!(last_segment("items.length"), "length");
    }

    #[test]
    fn descendant_requires_segment_boundary() {
        assert!(is_descendant_of("a.b", "a"));
        assert!(is_descendant_of("a", "a"));
        assert!(!is_descendant_of("ab", "a"));
        assert!(!is_descendant_of("a", "a.b"));
    }
}
