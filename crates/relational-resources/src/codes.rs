//! Slugs and access codes.

use rand::distributions::Alphanumeric;
use rand::Rng;

fn random_alphanumeric(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Lowercase ASCII words joined by single dashes.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("resource");
    }
    slug
}

/// `slugify(title)` plus a random lowercase suffix, e.g. `active-listening-x3k9qa`.
pub fn unique_slug(title: &str, suffix_len: usize) -> String {
    format!(
        "{}-{}",
        slugify(title),
        random_alphanumeric(suffix_len).to_ascii_lowercase()
    )
}

/// Uppercase alphanumeric code shared with invitees of an activity.
pub fn access_code(len: usize) -> String {
    random_alphanumeric(len).to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Active Listening: 101!"), "active-listening-101");
        assert_eq!(slugify("  --Été  "), "t");
        assert_eq!(slugify("???"), "resource");
    }

    #[test]
    fn test_unique_slug_shape() {
        let slug = unique_slug("Family Talks", 6);
        let (base, suffix) = slug.rsplit_once('-').unwrap();
        assert_eq!(base, "family-talks");
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_access_code_shape() {
        let code = access_code(6);
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
