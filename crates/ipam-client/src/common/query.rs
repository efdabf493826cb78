//! Query string helpers

/// Build a query string from key/value pairs
pub fn build_query_string(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Append a query string to a URL, if there is anything to append
pub fn with_query(url: &str, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        url.to_string()
    } else {
        format!("{}?{}", url, build_query_string(params))
    }
}
