//! String helpers used for labels, messages and HTML output.

/// Capitalizes the first character of a string.
///
/// # Examples
///
/// ```
/// use docforms_core::utils::text::capfirst;
///
/// assert_eq!(capfirst("item"), "Item");
/// assert_eq!(capfirst(""), "");
/// assert_eq!(capfirst("HELLO"), "HELLO");
/// ```
pub fn capfirst(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |c| {
        let mut result = c.to_uppercase().to_string();
        result.extend(chars);
        result
    })
}

/// Turns a field name into a human label: underscores become spaces and the
/// first letter is capitalized.
///
/// ```
/// use docforms_core::utils::text::pretty_name;
///
/// assert_eq!(pretty_name("first_name"), "First name");
/// assert_eq!(pretty_name("text"), "Text");
/// ```
pub fn pretty_name(name: &str) -> String {
    capfirst(&name.replace('_', " "))
}

/// Splits a CamelCase type name into lowercase words.
///
/// ```
/// use docforms_core::utils::text::camel_case_to_spaces;
///
/// assert_eq!(camel_case_to_spaces("BlogPost"), "blog post");
/// assert_eq!(camel_case_to_spaces("Item"), "item");
/// ```
pub fn camel_case_to_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if prev_lower {
                out.push(' ');
            }
            out.extend(c.to_lowercase());
            prev_lower = false;
        } else {
            out.push(c);
            prev_lower = c.is_lowercase() || c.is_ascii_digit();
        }
    }
    out.trim().to_string()
}

/// Escapes the five HTML-significant characters.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Joins a list the way error messages name several things: `a, b, c`.
pub fn join_names<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capfirst_unicode() {
        assert_eq!(capfirst("élan"), "Élan");
    }

    #[test]
    fn test_pretty_name() {
        assert_eq!(pretty_name("unique_with_field"), "Unique with field");
        assert_eq!(pretty_name(""), "");
    }

    #[test]
    fn test_camel_case_to_spaces() {
        assert_eq!(camel_case_to_spaces("EmbeddedAddress"), "embedded address");
        assert_eq!(camel_case_to_spaces("Photo2Album"), "photo2 album");
        assert_eq!(camel_case_to_spaces("lower"), "lower");
    }

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_join_names() {
        assert_eq!(join_names(&["a", "b"]), "a, b");
        assert_eq!(join_names::<&str>(&[]), "");
    }
}
