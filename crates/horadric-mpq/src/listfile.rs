//! The `(listfile)` manifest
//!
//! Hash tables only store hashes, so file names can only be recovered from
//! the listfile: a text entry with one archived path per CRLF-terminated line.

/// Name of the manifest entry
pub const LISTFILE_NAME: &str = "(listfile)";

/// Line terminator used in listfiles
pub const LISTFILE_DELIMITER: &str = "\r\n";

/// Split listfile text into entry names.
///
/// Trailing NUL padding is dropped, content after the last delimiter only
/// counts when it is non-empty, and blank lines are skipped.
pub fn split_entries(text: &str) -> impl Iterator<Item = &str> {
    text.trim_end_matches('\0')
        .split(LISTFILE_DELIMITER)
        .filter(|line| !line.is_empty())
}

/// Parse raw listfile bytes into owned names
pub fn parse(data: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(data);
    split_entries(&text).map(str::to_string).collect()
}

/// Render names as listfile content
pub fn render<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<u8> {
    let mut out = String::new();
    for name in names {
        out.push_str(name);
        out.push_str(LISTFILE_DELIMITER);
    }
    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_without_trailing_delimiter() {
        let names: Vec<&str> = split_entries("a\\b.txt\r\nc\\d.dc6").collect();
        assert_eq!(names, vec!["a\\b.txt", "c\\d.dc6"]);
    }

    #[test]
    fn test_split_with_trailing_delimiter() {
        let names: Vec<&str> = split_entries("a\\b.txt\r\nc\\d.dc6\r\n").collect();
        assert_eq!(names, vec!["a\\b.txt", "c\\d.dc6"]);
    }

    #[test]
    fn test_nul_padding_and_blank_lines() {
        let names = parse(b"one\r\n\r\ntwo\r\n\0\0\0");
        assert_eq!(names, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_empty_listfile() {
        assert!(parse(b"").is_empty());
        assert!(parse(b"\r\n").is_empty());
    }

    #[test]
    fn test_render() {
        assert_eq!(render(["x", "y\\z"]), b"x\r\ny\\z\r\n".to_vec());
    }
}
