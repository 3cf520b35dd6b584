//! Path normalization for catalog references.
//!
//! Catalog entries point at cover images and book files with paths relative
//! to the catalog file, written however the author's OS wrote them. Pages
//! live in a different directory, so before a reference reaches a template it
//! is re-rooted and turned into a browser-safe URL path.
//!
//! ## Rooting Policy
//!
//! There is exactly one: a reference is resolved against the directory that
//! holds the catalog file, then re-expressed relative to the output
//! directory.
//!
//! ```text
//! media/meta_data.json          img_src = "images/dune.jpg"
//! pages/index1.html        →    src     = "../media/images/dune.jpg"
//! ```
//!
//! Both directories are made absolute once, when configuration is resolved.
//! Everything in this module is plain string manipulation after that: no
//! filesystem access, no current-directory lookups.
//!
//! ## Encoding
//!
//! Each segment is percent-encoded on its own so the separating slashes
//! survive. Only RFC 3986 unreserved characters are left as-is.
//!
//! A segment that is already in encoded form (unreserved characters and
//! `%XX` triplets only, decoding to valid UTF-8) is kept as it is, which
//! makes [`url_path`] idempotent. Anything else is encoded from its raw
//! text, so `50% off.pdf` becomes `50%25%20off.pdf` and `a%FF.pdf` becomes
//! `a%25FF.pdf`. The one ambiguous case is a file whose name is itself a
//! valid encoding, such as `%41.txt`: it is taken as encoded.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::path::Path;

/// Characters encoded inside a single path segment: everything except
/// `A-Z a-z 0-9 - _ . ~`.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Split a path into lexically normalized segments.
///
/// Backslashes count as separators, empty and `.` segments vanish, and `..`
/// removes the previous segment when there is one to remove. Leading `..`
/// segments of a relative path are kept.
fn push_segments(segments: &mut Vec<String>, path: &str) {
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if last != ".." => {
                    segments.pop();
                }
                _ => segments.push("..".to_string()),
            },
            other => segments.push(other.to_string()),
        }
    }
}

fn segments_of(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    push_segments(&mut segments, path);
    segments
}

fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\')
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// True when `segment` is already in encoded form: only unreserved
/// characters and `%XX` triplets, with at least one triplet.
fn is_encoded(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    let mut triplets = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let valid = bytes.len() > i + 2
                    && bytes[i + 1].is_ascii_hexdigit()
                    && bytes[i + 2].is_ascii_hexdigit();
                if !valid {
                    return false;
                }
                triplets += 1;
                i += 3;
            }
            b if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') => i += 1,
            _ => return false,
        }
    }
    triplets > 0
}

fn encode_segment(segment: &str) -> String {
    if is_encoded(segment) && percent_decode_str(segment).decode_utf8().is_ok() {
        return segment.to_string();
    }
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Turn a relative or absolute path into a URL path.
///
/// - `sub dir/My Book.pdf` → `sub%20dir/My%20Book.pdf`
/// - `..\media\./cover.jpg` → `../media/cover.jpg`
/// - `/books/Война и мир.epub` → `/books/%D0%92%D0%BE...`
pub fn url_path(path: &str) -> String {
    let encoded: Vec<String> = segments_of(path)
        .iter()
        .map(|s| encode_segment(s))
        .collect();
    let joined = encoded.join("/");
    if is_absolute(path) {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Lexical relative path from `from_dir` to `to`, both given as segments of
/// absolute paths.
fn relative_segments(from_dir: &[String], to: &[String]) -> Vec<String> {
    let common = from_dir
        .iter()
        .zip(to)
        .take_while(|(a, b)| a == b)
        .count();
    let mut out: Vec<String> = std::iter::repeat_n("..".to_string(), from_dir.len() - common).collect();
    out.extend(to[common..].iter().cloned());
    out
}

/// Relative path from the directory `from_dir` to `to`, joined with `/`.
///
/// Both paths are expected to be absolute. Returns `.` when they are the
/// same location.
pub fn relative_path(from_dir: &Path, to: &Path) -> String {
    let rel = relative_segments(&segments_of(&path_str(from_dir)), &segments_of(&path_str(to)));
    if rel.is_empty() {
        ".".to_string()
    } else {
        rel.join("/")
    }
}

/// The two anchors of the rooting policy.
#[derive(Debug, Clone)]
pub struct PathRoots {
    source_dir: Vec<String>,
    output_dir: Vec<String>,
}

impl PathRoots {
    /// `source_dir` is the directory holding the catalog file, `output_dir`
    /// the directory pages are written to. Both must already be absolute.
    pub fn new(source_dir: &Path, output_dir: &Path) -> Self {
        Self {
            source_dir: segments_of(&path_str(source_dir)),
            output_dir: segments_of(&path_str(output_dir)),
        }
    }

    /// Re-express a catalog reference relative to the output directory.
    ///
    /// Absolute references are taken as they are and only made relative.
    pub fn reroot(&self, reference: &str) -> String {
        let target = if is_absolute(reference) {
            segments_of(reference)
        } else {
            let mut segments = self.source_dir.clone();
            push_segments(&mut segments, reference);
            segments
        };
        let rel = relative_segments(&self.output_dir, &target);
        if rel.is_empty() {
            ".".to_string()
        } else {
            rel.join("/")
        }
    }
}

/// Full normalization of one reference: re-root, then encode.
pub fn normalize_reference(reference: &str, roots: &PathRoots) -> String {
    url_path(&roots.reroot(reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn roots() -> PathRoots {
        PathRoots::new(
            &PathBuf::from("/site/media"),
            &PathBuf::from("/site/pages"),
        )
    }

    #[test]
    fn encodes_each_segment_and_keeps_slashes() {
        assert_eq!(url_path("sub dir/My Book.pdf"), "sub%20dir/My%20Book.pdf");
    }

    #[test]
    fn encodes_non_ascii_as_utf8() {
        assert_eq!(url_path("книги/а.txt"), "%D0%BA%D0%BD%D0%B8%D0%B3%D0%B8/%D0%B0.txt");
    }

    #[test]
    fn keeps_unreserved_characters() {
        assert_eq!(url_path("a-b_c.d~e/f"), "a-b_c.d~e/f");
    }

    #[test]
    fn encodes_reserved_characters_inside_segments() {
        assert_eq!(url_path("what?#&.pdf"), "what%3F%23%26.pdf");
    }

    #[test]
    fn collapses_dot_segments() {
        assert_eq!(url_path("a/./b/../c.jpg"), "a/c.jpg");
        assert_eq!(url_path("../media//x.jpg"), "../media/x.jpg");
    }

    #[test]
    fn converts_backslashes() {
        assert_eq!(url_path(r"..\media\books\x y.pdf"), "../media/books/x%20y.pdf");
    }

    #[test]
    fn preserves_leading_slash() {
        assert_eq!(url_path("/media/a b.jpg"), "/media/a%20b.jpg");
    }

    #[test]
    fn url_path_is_idempotent() {
        for input in [
            "sub dir/My Book.pdf",
            "../media/книги/Анна Каренина.fb2",
            "50%off/deal.pdf",
            "/abs/a+b/c.jpg",
            r"win\style path\x.jpg",
        ] {
            let once = url_path(input);
            assert_eq!(url_path(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn decoding_segments_recovers_original_text() {
        let original = ["sub dir", "Братья Карамазовы (1880).pdf"];
        let encoded = url_path(&original.join("/"));
        let decoded: Vec<String> = encoded
            .split('/')
            .map(|s| percent_decode_str(s).decode_utf8().unwrap().into_owned())
            .collect();
        assert_eq!(decoded, original);
    }

    #[test]
    fn lone_percent_is_encoded() {
        assert_eq!(url_path("100%.pdf"), "100%25.pdf");
    }

    #[test]
    fn literal_percent_names_round_trip() {
        for (name, encoded) in [
            ("a%FF.pdf", "a%25FF.pdf"),
            ("50% off.pdf", "50%25%20off.pdf"),
            ("100%.pdf", "100%25.pdf"),
            ("%zz notes.txt", "%25zz%20notes.txt"),
        ] {
            assert_eq!(url_path(name), encoded, "encoding {name:?}");
            let decoded = percent_decode_str(encoded).decode_utf8().unwrap();
            assert_eq!(decoded, name);
            assert_eq!(url_path(encoded), encoded);
        }
    }

    #[test]
    fn already_encoded_segments_are_kept() {
        assert_eq!(url_path("sub%20dir/My%20Book.pdf"), "sub%20dir/My%20Book.pdf");
        assert_eq!(url_path("%D0%B0.txt"), "%D0%B0.txt");
    }

    #[test]
    fn plain_segments_are_not_treated_as_encoded() {
        assert!(!is_encoded("plain.pdf"));
        assert!(!is_encoded("a%2"));
        assert!(!is_encoded("a b%20c"));
        assert!(is_encoded("a%20b"));
    }

    #[test]
    fn reroot_from_catalog_dir_to_output_dir() {
        assert_eq!(roots().reroot("images/dune.jpg"), "../media/images/dune.jpg");
    }

    #[test]
    fn reroot_handles_parent_references() {
        assert_eq!(roots().reroot("../books/dune.pdf"), "../books/dune.pdf");
        assert_eq!(roots().reroot("../pages/local.png"), "local.png");
    }

    #[test]
    fn reroot_absolute_reference() {
        assert_eq!(roots().reroot("/srv/covers/a.jpg"), "../../srv/covers/a.jpg");
    }

    #[test]
    fn reroot_with_nested_output_dir() {
        let roots = PathRoots::new(&PathBuf::from("/site"), &PathBuf::from("/site/out/pages"));
        assert_eq!(roots.reroot("media/a.jpg"), "../../media/a.jpg");
    }

    #[test]
    fn normalize_reference_scenario_subdirectory_with_spaces() {
        let roots = PathRoots::new(&PathBuf::from("/site/pages"), &PathBuf::from("/site/pages"));
        assert_eq!(
            normalize_reference("sub dir/My Book.pdf", &roots),
            "sub%20dir/My%20Book.pdf"
        );
    }

    #[test]
    fn normalize_reference_reroots_and_encodes() {
        assert_eq!(
            normalize_reference("books\\Sci Fi\\Dune.epub", &roots()),
            "../media/books/Sci%20Fi/Dune.epub"
        );
    }

    #[test]
    fn relative_path_between_directories() {
        assert_eq!(
            relative_path(&PathBuf::from("/site"), &PathBuf::from("/site/pages/index1.html")),
            "pages/index1.html"
        );
        assert_eq!(
            relative_path(&PathBuf::from("/site/a"), &PathBuf::from("/site/b/c")),
            "../b/c"
        );
        assert_eq!(relative_path(&PathBuf::from("/x"), &PathBuf::from("/x")), ".");
    }
}
