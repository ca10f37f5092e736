//! URL normalisation used to match tabs against bookmarks.

/// Canonical form for comparing a tab URL with a bookmark URL.
///
/// Lowercases, drops the `http(s)://` scheme, a leading `www.`, one trailing
/// slash and the fragment. The query string is kept.
pub fn normalize_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    let lower = url.to_lowercase();
    let mut rest = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    rest = rest.strip_prefix("www.").unwrap_or(rest);
    rest = rest.strip_suffix('/').unwrap_or(rest);
    rest.split('#').next().unwrap_or_default().to_string()
}
