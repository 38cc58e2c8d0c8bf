use regex::Regex;
use std::sync::OnceLock;

/// Extract every bracketed case identifier (`[XPJ-112]`) from a title.
///
/// Identifiers are returned without brackets, in order of appearance,
/// duplicates included.
///
/// ```
/// use publisher::extract_case_ids;
///
/// assert_eq!(extract_case_ids("renders header [XPJ-112]"), vec!["XPJ-112"]);
/// assert!(extract_case_ids("no identifiers here").is_empty());
/// ```
pub fn extract_case_ids(title: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let regex = RE.get_or_init(|| {
        // ASCII classes only: `\w` and `\d` would admit any Unicode letter or digit.
        Regex::new(r"\[([A-Za-z0-9_]+-[0-9]+)\]")
            .expect("Failed to compile case identifier pattern")
    });

    regex
        .captures_iter(title)
        .map(|caps| caps[1].to_string())
        .collect()
}
