//! Line diffs between a remote text file and a candidate, for `sheetsync reconcile --diff`.

use similar::TextDiff;

use sheetsync_core::types::RemoteFile;

/// Unified diff of `remote` → `candidate`.
///
/// Returns `None` when either side is not UTF-8 text (xlsx/xls workbooks),
/// and an empty string when the two only differ in line endings.
pub fn text_diff(remote: &RemoteFile, candidate: &[u8]) -> Option<String> {
    let old = std::str::from_utf8(&remote.bytes).ok()?;
    let new = std::str::from_utf8(candidate).ok()?;
    let old = normalize_line_endings(old);
    let new = normalize_line_endings(new);
    if old == new {
        return Some(String::new());
    }

    let old_header = format!("a/{}", remote.remote.path);
    let new_header = format!("b/{}", remote.remote.path);
    Some(
        TextDiff::from_lines(&old, &new)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string(),
    )
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

#[cfg(test)]
mod tests {
    use sheetsync_core::types::{RemoteRef, VersionToken};

    use crate::content_hash;

    use super::*;

    fn remote_file(bytes: &[u8]) -> RemoteFile {
        RemoteFile {
            remote: RemoteRef::new("acme/dash", "data/payment_terms.csv", "main"),
            bytes: bytes.into(),
            hash: content_hash(bytes),
            version: VersionToken::from("A"),
        }
    }

    #[test]
    fn edited_row_produces_unified_diff() {
        let remote = remote_file(b"NO,NILAI\n1,100\n2,200\n");
        let diff = text_diff(&remote, b"NO,NILAI\n1,100\n2,250\n").expect("text diff");
        assert!(diff.contains("--- a/data/payment_terms.csv"));
        assert!(diff.contains("+++ b/data/payment_terms.csv"));
        assert!(diff.contains("-2,200"));
        assert!(diff.contains("+2,250"));
        assert!(diff.contains("@@"));
    }

    #[test]
    fn binary_side_has_no_text_diff() {
        let remote = remote_file(b"PK\x03\x04\xff\xfe");
        assert!(text_diff(&remote, b"NO,NILAI\n").is_none());
    }

    #[test]
    fn crlf_only_change_is_empty_diff() {
        let remote = remote_file(b"a,b\r\n1,2\r\n");
        assert_eq!(text_diff(&remote, b"a,b\n1,2\n").as_deref(), Some(""));
    }
}
