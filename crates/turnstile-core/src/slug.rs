//! Slug derivation for plan names.

/// Derive a URL-safe slug from a plan name: lowercase, runs of
/// non-alphanumeric characters collapse to a single hyphen, leading and
/// trailing hyphens trimmed.
///
/// Uniqueness is not checked here; the catalog surfaces collisions as a
/// duplicate-slug error rather than renaming.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            for lower in c.to_lowercase() {
                slug.push(lower);
            }
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_lowercase() {
        assert_eq!(slugify("Gold"), "gold");
    }

    #[test]
    fn test_spaces_become_hyphens() {
        assert_eq!(slugify("Gold Plus Annual"), "gold-plus-annual");
    }

    #[test]
    fn test_repeated_separators_collapse() {
        assert_eq!(slugify("Gold  --  Plus"), "gold-plus");
    }

    #[test]
    fn test_leading_trailing_trimmed() {
        assert_eq!(slugify("  Gold! "), "gold");
        assert_eq!(slugify("(Gold)"), "gold");
    }

    #[test]
    fn test_numbers_kept() {
        assert_eq!(slugify("Tier 2 (2024)"), "tier-2-2024");
    }

    #[test]
    fn test_all_symbols_yields_empty() {
        assert_eq!(slugify("!!!"), "");
    }
}
