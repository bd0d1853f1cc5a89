//! Scope string handling.
//!
//! Scopes are space-separated tokens. Splitting is on ASCII space only and
//! drops empty entries; all operations treat a scope string as a set.

/// Split a scope string on ASCII spaces, skipping empty tokens.
pub fn split_scopes(scope: &str) -> Vec<&str> {
    scope.split(' ').filter(|s| !s.is_empty()).collect()
}

/// True when `target` appears as a token of `scope`.
pub fn contains_scope(scope: &str, target: &str) -> bool {
    split_scopes(scope).iter().any(|s| *s == target)
}

/// Set equality of two scope strings.
pub fn compare_scopes(a: &str, b: &str) -> bool {
    let mut left = split_scopes(a);
    let mut right = split_scopes(b);
    left.sort_unstable();
    left.dedup();
    right.sort_unstable();
    right.dedup();
    left == right
}

/// Union of two scope strings, emitted in canonical form.
pub fn merge_scopes(a: &str, b: &str) -> String {
    let mut tokens: Vec<&str> = split_scopes(a);
    tokens.extend(split_scopes(b));
    tokens.sort_unstable();
    tokens.dedup();
    tokens.join(" ")
}

/// Canonical form: sorted, deduplicated, single-space separated.
pub fn canonicalize(scope: &str) -> String {
    let mut tokens = split_scopes(scope);
    tokens.sort_unstable();
    tokens.dedup();
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_skips_empty_tokens() {
        assert_eq!(split_scopes("openid  profile "), vec!["openid", "profile"]);
        assert_eq!(split_scopes(""), Vec::<&str>::new());
        assert_eq!(split_scopes("   "), Vec::<&str>::new());
    }

    #[test]
    fn test_split_is_ascii_space_only() {
        // Tabs and newlines are not separators.
        assert_eq!(split_scopes("openid\tprofile"), vec!["openid\tprofile"]);
        assert_eq!(split_scopes("openid\nprofile"), vec!["openid\nprofile"]);
    }

    #[test]
    fn test_contains_scope() {
        assert!(contains_scope("openid profile email", "profile"));
        assert!(!contains_scope("openid profile", "email"));
        assert!(!contains_scope("openid profile", "prof"));
    }

    #[test]
    fn test_compare_scopes_is_set_equality() {
        assert!(compare_scopes("openid profile", "profile openid"));
        assert!(compare_scopes("openid openid", "openid"));
        assert!(!compare_scopes("openid profile", "openid"));
        assert!(compare_scopes("", "  "));
    }

    #[test]
    fn test_merge_is_union() {
        let merged = merge_scopes("openid profile", "profile email");
        assert!(compare_scopes(&merged, "openid profile email"));
    }

    #[test]
    fn test_canonicalize_idempotent() {
        let canon = canonicalize("profile  openid profile");
        assert_eq!(canon, "openid profile");
        assert_eq!(canonicalize(&canon), canon);
    }

    fn scope_strategy() -> impl Strategy<Value = String> {
        proptest::collection::vec("[a-z]{1,8}(\\.[a-z]{1,8})?", 0..6)
            .prop_map(|tokens| tokens.join(" "))
    }

    proptest! {
        #[test]
        fn prop_canonicalize_idempotent(s in scope_strategy()) {
            let once = canonicalize(&s);
            prop_assert_eq!(canonicalize(&once), once);
        }

        #[test]
        fn prop_merge_commutative(a in scope_strategy(), b in scope_strategy()) {
            prop_assert!(compare_scopes(&merge_scopes(&a, &b), &merge_scopes(&b, &a)));
        }

        #[test]
        fn prop_merge_associative(
            a in scope_strategy(),
            b in scope_strategy(),
            c in scope_strategy(),
        ) {
            let left = merge_scopes(&merge_scopes(&a, &b), &c);
            let right = merge_scopes(&a, &merge_scopes(&b, &c));
            prop_assert!(compare_scopes(&left, &right));
        }

        #[test]
        fn prop_merge_contains_both_sides(a in scope_strategy(), b in scope_strategy()) {
            let merged = merge_scopes(&a, &b);
            for token in split_scopes(&a).into_iter().chain(split_scopes(&b)) {
                prop_assert!(contains_scope(&merged, token));
            }
        }
    }
}
