//! crates/studio_core/src/slug.rs
//!
//! URL-safe identifiers derived from human-readable titles.

use regex::Regex;
use std::sync::LazyLock;

static NON_ALPHANUMERIC_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("static regex"));

/// Lower-cases `input`, collapses every run of non-alphanumeric characters to a
/// single `-` and trims leading/trailing hyphens.
///
/// ```
/// use studio_core::slug::slugify;
///
/// assert_eq!(slugify("Family & Milestones!"), "family-milestones");
/// assert_eq!(slugify("family-milestones"), "family-milestones");
/// ```
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    NON_ALPHANUMERIC_RUN
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_runs_and_trims() {
        assert_eq!(slugify("Family & Milestones!"), "family-milestones");
        assert_eq!(slugify("  Weddings  "), "weddings");
        assert_eq!(slugify("--Newborn -- Portraits--"), "newborn-portraits");
        assert_eq!(slugify("Events 2024"), "events-2024");
    }

    #[test]
    fn is_idempotent() {
        for title in ["Family & Milestones!", "A  B", "Ünïcode Café", "x"] {
            let once = slugify(title);
            assert_eq!(slugify(&once), once);
        }
    }

    #[test]
    fn non_ascii_letters_become_separators() {
        assert_eq!(slugify("Café Shoot"), "caf-shoot");
    }

    #[test]
    fn nothing_alphanumeric_gives_empty() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }
}
