/// Decode raw bytes as plain text.
///
/// Untrusted uploads are frequently mislabeled, so invalid UTF-8 degrades to
/// a lossy decode instead of failing the file. Control characters other than
/// tab/newline/carriage-return are stripped — they confuse both the anchor
/// regexes and the capability prompt.
pub fn decode_text(bytes: &[u8]) -> String {
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    };
    strip_control_chars(&text)
}

fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}
