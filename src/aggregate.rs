/*!
 * Aggregation of relevant file contents into one digest string
 */

/// Concatenate `(path, content)` pairs into `"<path>:\n<content>\n\n"` blocks
///
/// Blocks follow the iteration order of `entries`; no entries yields an
/// empty string.
pub fn combined_content<'a, I, S>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a S)>,
    S: AsRef<str> + ?Sized + 'a,
{
    let mut combined = String::new();
    for (path, content) in entries {
        combined.push_str(path);
        combined.push_str(":\n");
        combined.push_str(content.as_ref());
        combined.push_str("\n\n");
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let entries: Vec<(&str, &String)> = Vec::new();
        assert_eq!(combined_content(entries), "");
    }

    #[test]
    fn test_blocks_keep_order() {
        let a = "x".to_string();
        let b = "y\n".to_string();
        let combined = combined_content(vec![("b.js", &b), ("a.js", &a)]);
        assert_eq!(combined, "b.js:\ny\n\n\na.js:\nx\n\n");
    }
}
