use url::Url;

const SKIPPED_EXTENSIONS: [&str; 12] = [
    ".pdf", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".css", ".js", ".xml",
    ".zip",
];

/// Canonical form used for de-duplication: no fragment, no query, and no
/// trailing slash except on the root path.
pub fn normalize(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    normalized.set_query(None);
    let trimmed = normalized.path().trim_end_matches('/').to_string();
    if trimmed.is_empty() {
        normalized.set_path("/");
    } else {
        normalized.set_path(&trimmed);
    }
    normalized
}

pub fn same_origin(left: &Url, right: &Url) -> bool {
    left.scheme() == right.scheme()
        && left.host_str() == right.host_str()
        && left.port_or_known_default() == right.port_or_known_default()
}

/// `true` when the path sits under one of `prefixes`, matching whole
/// segments only (`/api` excludes `/api/llms` but not `/apiary`).
pub fn is_excluded(url: &Url, prefixes: &[String]) -> bool {
    let path = url.path();
    prefixes.iter().any(|prefix| {
        let prefix = prefix.trim_end_matches('/');
        if prefix.is_empty() {
            return false;
        }
        path == prefix
            || path
                .strip_prefix(prefix)
                .map(|rest| rest.starts_with('/'))
                .unwrap_or(false)
    })
}

pub fn looks_like_page(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    !SKIPPED_EXTENSIONS
        .iter()
        .any(|extension| path.ends_with(extension))
}

/// Resolves `href` against `base`; only `http` and `https` targets survive.
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let resolved = base.join(href).ok()?;
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}
