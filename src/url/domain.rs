use url::Url;

/// Extracts the domain from a URL
///
/// Returns the lowercase host with any leading `www.` removed, so that
/// `www.example.com` and `example.com` compare equal.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use furnish_scout::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let host = h.to_lowercase();
        match host.strip_prefix("www.") {
            Some(stripped) => stripped.to_string(),
            None => host,
        }
    })
}

/// Returns true if `candidate` lives on the same site as `site`
///
/// A candidate on the site's host or on any of its subdomains counts as the
/// same site; ports and schemes are ignored.
pub fn same_site(candidate: &Url, site: &Url) -> bool {
    match (extract_domain(candidate), extract_domain(site)) {
        (Some(candidate), Some(site)) => {
            candidate == site || candidate.ends_with(&format!(".{}", site))
        }
        _ => false,
    }
}

/// Returns the first DNS label of a URL's host, used to name exported files
///
/// `https://www.acme-living.com/sofas` yields `acme-living`.
pub fn host_label(url: &Url) -> Option<String> {
    extract_domain(url)
        .and_then(|domain| domain.split('.').next().map(|s| s.to_string()))
        .filter(|label| !label.is_empty())
}
