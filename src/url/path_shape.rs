use url::Url;

/// Minimum length of the last path segment of a product page
const MIN_SLUG_LEN: usize = 3;

/// Returns true if the URL path looks like a product detail page
///
/// The last non-empty path segment must be at least three characters long,
/// must not be purely numeric, and must not equal one of the `common_endings`
/// (compared case-insensitively). Listing and category pages otherwise leak
/// into the product candidates.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use furnish_scout::url::is_product_path;
///
/// let endings = vec!["collection".to_string()];
/// let url = Url::parse("https://example.com/sofas/velvet-sofa-02").unwrap();
/// assert!(is_product_path(&url, &endings));
///
/// let url = Url::parse("https://example.com/sofas/collection").unwrap();
/// assert!(!is_product_path(&url, &endings));
/// ```
pub fn is_product_path(url: &Url, common_endings: &[String]) -> bool {
    let last = match url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
    {
        Some(segment) => segment.to_lowercase(),
        None => return false,
    };

    if last.chars().count() < MIN_SLUG_LEN {
        return false;
    }

    if last.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    !common_endings
        .iter()
        .any(|ending| ending.eq_ignore_ascii_case(&last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endings() -> Vec<String> {
        ["collection", "catalog", "shop"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn check(url: &str) -> bool {
        is_product_path(&Url::parse(url).unwrap(), &endings())
    }

    #[test]
    fn test_rejects_common_ending() {
        assert!(!check("https://example.com/sofas/collection"));
        assert!(!check("https://example.com/Shop/"));
        assert!(!check("https://example.com/CATALOG"));
    }

    #[test]
    fn test_rejects_numeric_segment() {
        assert!(!check("https://example.com/sofas/123"));
    }

    #[test]
    fn test_rejects_short_segment() {
        assert!(!check("https://example.com/sofas/ab"));
    }

    #[test]
    fn test_rejects_root() {
        assert!(!check("https://example.com/"));
        assert!(!check("https://example.com"));
    }

    #[test]
    fn test_accepts_product_slug() {
        assert!(check("https://example.com/sofas/velvet-sofa-02"));
        assert!(check("https://example.com/sofas/velvet-sofa-02/"));
    }

    #[test]
    fn test_ending_must_match_whole_segment() {
        // "collection" inside a longer slug is still a product
        assert!(check("https://example.com/p/collection-armchair-x"));
    }
}
