//! URL slugs for catalog entries.

/// Slug used when a name has no ASCII alphanumerics at all.
pub const FALLBACK_SLUG: &str = "item";

/// Derive a slug from a display name.
///
/// Lowercases ASCII alphanumerics and collapses every other run of
/// characters into a single `-`.
///
/// ```
/// use luxuffy_core::slug::slugify;
///
/// assert_eq!(slugify("Ankara Print  Tote (Large)"), "ankara-print-tote-large");
/// assert_eq!(slugify("!!!"), "item");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        slug
    }
}

/// Pick the first free slug among `base`, `base-2`, `base-3`, ...
///
/// `taken` reports whether a candidate is already used.
#[must_use]
pub fn unique_slug(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_owned();
    }
    (2_u32..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_trims_and_collapses() {
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("Agbada-2024"), "agbada-2024");
        assert_eq!(slugify("Café Mocha"), "caf-mocha");
    }

    #[test]
    fn test_slugify_fallback() {
        assert_eq!(slugify(""), FALLBACK_SLUG);
        assert_eq!(slugify("---"), FALLBACK_SLUG);
    }

    #[test]
    fn test_unique_slug_suffixes() {
        let existing = ["tote", "tote-2"];
        let taken = |s: &str| existing.contains(&s);
        assert_eq!(unique_slug("tote", taken), "tote-3");
        assert_eq!(unique_slug("bag", taken), "bag");
    }
}
