//! Ordered form body and the service's percent-encoder.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Bytes outside `[A-Za-z0-9_.-]` are percent-encoded byte-wise. This has to
/// match the service's decoder exactly: space becomes `%20`, never `+`.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-');

pub(crate) fn encode(value: &str) -> String {
    utf8_percent_encode(value, FORM).to_string()
}

/// An ordered list of form pairs. Repeated keys are allowed; multi-valued
/// options are represented as one pair per value.
#[derive(Debug, Default)]
pub(crate) struct Body {
    pairs: Vec<(String, String)>,
}

impl Body {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Renders the body as a url-encoded string, preserving pair order.
    pub(crate) fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_a_single_pair() {
        let mut body = Body::new();
        body.push("key", "123456");
        assert_eq!(body.encode(), "key=123456");
    }

    #[test]
    fn encodes_multiple_pairs_in_order() {
        let mut body = Body::new();
        body.push("key", "123456");
        body.push("email", "test@domain.org");
        assert_eq!(body.encode(), "key=123456&email=test%40domain.org");
    }

    #[test]
    fn space_is_percent_twenty_not_plus() {
        assert_eq!(encode("Peaceful Warriors"), "Peaceful%20Warriors");
        assert_eq!(encode("a+b"), "a%2Bb");
    }

    #[test]
    fn safe_set_is_exactly_alphanumerics_underscore_dot_dash() {
        assert_eq!(encode("First_Name-2.0"), "First_Name-2.0");
        assert_eq!(encode("a='b'"), "a%3D%27b%27");
    }

    #[test]
    fn non_ascii_is_encoded_byte_wise() {
        assert_eq!(encode("é"), "%C3%A9");
    }
}
