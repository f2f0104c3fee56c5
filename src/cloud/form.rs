//! `application/x-www-form-urlencoded` request bodies.

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Encode key/value pairs as a form body.
pub fn encode(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Percent-encode one URL path segment.
pub fn path_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
