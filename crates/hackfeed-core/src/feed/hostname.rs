/// Extracts the hostname shown next to a story.
///
/// With a scheme (`"://"` present) the hostname is the third `/`-delimited
/// segment, otherwise the first one. A single leading `"www."` is stripped.
/// Ports and userinfo are kept as they appear. A URL without the expected
/// segment yields an empty string.
pub fn hostname_of(url: &str) -> String {
    let segment = if url.contains("://") {
        url.split('/').nth(2)
    } else {
        url.split('/').next()
    }
    .unwrap_or("");

    segment.strip_prefix("www.").unwrap_or(segment).to_string()
}
