/// Locate the first balanced `{…}` object in capability output.
///
/// Models wrap JSON in prose and markdown fences despite instructions, so a
/// naive regex is not enough: braces inside string literals must not count.
/// Returns the candidate slice without validating that it parses.
pub fn extract_first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object() {
        assert_eq!(extract_first_json_object(r#"{"a": 1}"#), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn object_with_surrounding_prose() {
        let text = "Here is the extraction:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_first_json_object(text), Some("{\"a\": 1}"));
    }

    #[test]
    fn nested_objects_balanced() {
        let text = r#"noise {"a": {"b": {"c": 3}}} trailing {"d": 4}"#;
        assert_eq!(
            extract_first_json_object(text),
            Some(r#"{"a": {"b": {"c": 3}}}"#)
        );
    }

    #[test]
    fn braces_inside_strings_ignored() {
        let text = r#"{"note": "fees {not} a brace }", "x": 1}"#;
        assert_eq!(extract_first_json_object(text), Some(text));
    }

    #[test]
    fn escaped_quotes_inside_strings() {
        let text = r#"{"note": "he said \"}\" loudly", "x": 1}"#;
        assert_eq!(extract_first_json_object(text), Some(text));
    }

    #[test]
    fn unbalanced_returns_none() {
        assert_eq!(extract_first_json_object(r#"{"a": 1"#), None);
    }

    #[test]
    fn no_object_returns_none() {
        assert_eq!(extract_first_json_object("no json here"), None);
        assert_eq!(extract_first_json_object(""), None);
    }
}
