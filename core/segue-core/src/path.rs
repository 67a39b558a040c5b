//! Route path handling for navigation intents.
//!
//! Destinations look like `/work#testimonials`: a route path plus an optional
//! fragment naming the section to land on. Two paths refer to the same page
//! when they match after stripping a single trailing slash. Case is preserved:
//! `/About` and `/about` are different routes.

use serde::Serialize;

/// Schemes that leave the site and must never be intercepted.

/// Normalizes a route path for comparison.
///
/// - `"/about/"` -> `"/about"`
/// - `"/"` -> `"/"` (root is preserved)
/// - `"/about//"` -> `"/about/"` (only one slash is stripped)
pub fn normalize_route_path(path: &str) -> &str {
    if path == "/" {
        return path;
    }
    path.strip_suffix('/').unwrap_or(path)
}

/// Returns true if both paths name the same page.
pub fn same_route(a: &str, b: &str) -> bool {
    normalize_route_path(a) == normalize_route_path(b)
}

/// Splits a destination on the first `#`.
///
/// An empty fragment (`"/about#"`) is treated as no fragment.
pub fn split_destination(destination: &str) -> (&str, Option<&str>) {
    match destination.split_once('#') {
        Some((path, fragment)) if !fragment.is_empty() => (path, Some(fragment)),
        Some((path, _)) => (path, None),
        None => (destination, None),
    }
}

/// Returns true for destinations that leave the site: anything with a URI
/// scheme (`https:`, `mailto:`, `javascript:`, ...) or a protocol-relative `//`.
pub fn is_external(destination: &str) -> bool {
    let destination = destination.trim_start();
    destination.starts_with("//") || has_scheme(destination)
}

/// `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`
fn has_scheme(destination: &str) -> bool {
    let Some((scheme, _)) = destination.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// What a single click asks for, derived at click time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationIntent {
    pub target_path: String,
    pub target_fragment: Option<String>,
    pub requires_content_wait: bool,
}

impl NavigationIntent {
    /// Derives the intent of navigating to `destination` while `current_path` is shown.
    ///
    /// An empty destination path means "this page", so `#contact` never waits for content.
    pub fn derive(destination: &str, current_path: &str) -> Self {
        let (path, fragment) = split_destination(destination);
        let target_path = if path.is_empty() { current_path } else { path };

        Self {
            target_path: target_path.to_string(),
            target_fragment: fragment.map(str::to_string),
            requires_content_wait: !same_route(target_path, current_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_single_trailing_slash() {
        assert_eq!(normalize_route_path("/about/"), "/about");
        assert_eq!(normalize_route_path("/about"), "/about");
        assert_eq!(normalize_route_path("/about//"), "/about/");
    }

    #[test]
    fn test_normalize_preserves_root() {
        assert_eq!(normalize_route_path("/"), "/");
    }

    #[test]
    fn test_normalize_preserves_case() {
        assert_eq!(normalize_route_path("/Work/"), "/Work");
        assert!(!same_route("/Work", "/work"));
    }

    #[test]
    fn test_split_destination_variants() {
        assert_eq!(split_destination("/#contact"), ("/", Some("contact")));
        assert_eq!(split_destination("/work"), ("/work", None));
        assert_eq!(split_destination("/work#"), ("/work", None));
        assert_eq!(split_destination("#skills"), ("", Some("skills")));
        assert_eq!(split_destination("/a#b#c"), ("/a", Some("b#c")));
    }

    #[test]
    fn test_same_page_fragment_does_not_wait() {
        let intent = NavigationIntent::derive("/#contact", "/");
        assert_eq!(intent.target_path, "/");
        assert_eq!(intent.target_fragment.as_deref(), Some("contact"));
        assert!(!intent.requires_content_wait);
    }

    #[test]
    fn test_trailing_slash_counts_as_same_page() {
        assert!(!NavigationIntent::derive("/about/", "/about").requires_content_wait);
        assert!(!NavigationIntent::derive("/about", "/about/").requires_content_wait);
    }

    #[test]
    fn test_bare_fragment_targets_current_page() {
        let intent = NavigationIntent::derive("#skills", "/about");
        assert_eq!(intent.target_path, "/about");
        assert!(!intent.requires_content_wait);
    }

    #[test]
    fn test_different_page_waits_for_content() {
        let intent = NavigationIntent::derive("/", "/about");
        assert!(intent.requires_content_wait);
        assert_eq!(intent.target_fragment, None);
    }

    #[test]
    fn test_external_destinations() {
        assert!(is_external("https://github.com/someone"));
        assert!(is_external("MAILTO:hello@example.com"));
        assert!(is_external("//cdn.example.com/x"));
        assert!(!is_external("/work#testimonials"));
        assert!(!is_external("#contact"));
    }

    #[test]
    fn test_any_uri_scheme_is_external() {
        assert!(is_external("javascript:void(0)"));
        assert!(is_external("sms:+15550100"));
        assert!(is_external("ftp://files.example.com"));
        assert!(is_external("  tel:+15550100"));
        assert!(!is_external("/work:archive"));
        assert!(!is_external("#section:2"));
        assert!(!is_external("2024:recap"));
        assert!(!is_external("about"));
    }
}
