use url::Url;

/// Resolve inline-edit text to a navigation target.
///
/// The trimmed text is used as-is when it parses as an absolute URL;
/// otherwise `http://` is prefixed once. Returns `None` when neither form
/// parses, in which case the edit is dropped without touching the tab.
/// The returned string is the accepted input, not the parser's normalized form.
pub fn resolve_edit_url(input: &str) -> Option<String> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }
    if Url::parse(text).is_ok() {
        return Some(text.to_string());
    }
    let prefixed = format!("http://{}", text);
    Url::parse(&prefixed).ok().map(|_| prefixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_url_kept_verbatim() {
        assert_eq!(
            resolve_edit_url("  https://example.com/a?b=c  ").as_deref(),
            Some("https://example.com/a?b=c")
        );
    }

    #[test]
    fn bare_host_gets_http_prefix() {
        assert_eq!(
            resolve_edit_url("example.com").as_deref(),
            Some("http://example.com")
        );
    }

    #[test]
    fn text_with_spaces_is_rejected() {
        assert_eq!(resolve_edit_url("not a url"), None);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(resolve_edit_url("   "), None);
    }
}
