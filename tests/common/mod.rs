use std::fs;
use std::path::PathBuf;

/// Path for a generated test artifact under tests/output/.
pub fn output_path(name: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output");
    fs::create_dir_all(&dir).ok();
    dir.join(name)
}

/// Byte offset of the first occurrence of `needle` in `haystack`.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Number of (possibly overlapping) occurrences of `needle`.
pub fn count(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}
