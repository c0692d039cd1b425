//! Locating the JSON payload embedded in a rendered document.
//!
//! The same logical endpoint can come back either as a bare API response,
//! which the browser wraps in its JSON viewer (`<pre>…</pre>`), or as a page
//! with the JSON inlined somewhere in the markup. Validity is not checked
//! here; that is the decoder's job.

use std::sync::LazyLock;

use regex::Regex;

static PRE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<pre[^>]*>(.*?)</pre>").expect("valid regex"));

/// Text believed to hold the page JSON. Not validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(String);

impl RawPayload {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for RawPayload {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns the candidate JSON payload of `document`, if any.
///
/// Priority:
/// 1. inner text of the first `<pre>` block (trimmed, basic entities decoded);
/// 2. the span from the first `{` to the last `}` inclusive.
#[must_use]
pub fn extract_payload(document: &str) -> Option<RawPayload> {
    if let Some(inner) = PRE_BLOCK.captures(document).and_then(|c| c.get(1)) {
        tracing::trace!("payload found in <pre> block");
        return Some(RawPayload(decode_basic_entities(inner.as_str().trim())));
    }

    let first = document.find('{')?;
    let last = document.rfind('}')?;
    if first < last {
        tracing::trace!("payload found by brace scan");
        return Some(RawPayload(document[first..=last].to_owned()));
    }

    None
}

/// Undoes the escaping a browser applies when serializing a text node.
///
/// `&amp;` goes last so that `&amp;lt;` decodes to the literal `&lt;`.
fn decode_basic_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pre_block_takes_priority_over_braces() {
        let doc = r#"<html><script>var x = {"b":2};</script><pre>{"a":1}</pre></html>"#;
        assert_eq!(extract_payload(doc).unwrap().as_str(), r#"{"a":1}"#);
    }

    #[test]
    fn pre_tag_with_attributes_and_mixed_case() {
        let doc = "<body><PRE style=\"word-wrap: break-word\">\n  {\"a\":1}\n</Pre></body>";
        assert_eq!(extract_payload(doc).unwrap().as_str(), r#"{"a":1}"#);
    }

    #[test]
    fn pre_block_spanning_lines() {
        let doc = "<pre>{\n\"a\":\n1\n}</pre>";
        assert_eq!(extract_payload(doc).unwrap().as_str(), "{\n\"a\":\n1\n}");
    }

    #[test]
    fn pre_block_entities_are_decoded() {
        let doc = r#"<pre>{"name":"Tom &amp; Jerry &lt;3"}</pre>"#;
        assert_eq!(
            extract_payload(doc).unwrap().as_str(),
            r#"{"name":"Tom & Jerry <3"}"#
        );
    }

    #[test]
    fn double_escaped_ampersand_decodes_once() {
        assert_eq!(decode_basic_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn brace_scan_spans_first_to_last() {
        let doc = r#"<html><body>{"widgetStates":{"x":"y"}} trailing</body></html>"#;
        assert_eq!(
            extract_payload(doc).unwrap().as_str(),
            r#"{"widgetStates":{"x":"y"}}"#
        );
    }

    #[test]
    fn no_pre_and_no_braces_yields_none() {
        assert_eq!(extract_payload("<html><body>loading…</body></html>"), None);
        assert_eq!(extract_payload(""), None);
    }

    #[test]
    fn closing_brace_before_opening_yields_none() {
        assert_eq!(extract_payload("} nothing here {"), None);
    }

    #[test]
    fn extraction_is_idempotent() {
        let docs = [
            r#"<pre>{"a":1}</pre>"#,
            r#"<div>{"b":2}</div>"#,
            "no json at all",
        ];
        for doc in docs {
            assert_eq!(extract_payload(doc), extract_payload(doc));
        }
    }
}
