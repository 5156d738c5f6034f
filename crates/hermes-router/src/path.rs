//! Route path normalization and validation.

/// Normalizes a route path.
///
/// Runs of `/` collapse to one, the result always starts with exactly one
/// `/`, and a trailing `/` is dropped unless the path is the root.
///
/// # Example
///
/// ```
/// use hermes_router::normalize;
///
/// assert_eq!(normalize("//api///users/"), "/api/users");
/// assert_eq!(normalize(""), "/");
/// assert_eq!(normalize("users/:id"), "/users/:id");
/// ```
#[must_use]
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Joins path pieces and normalizes the result.
///
/// ```
/// use hermes_router::join_paths;
///
/// assert_eq!(join_paths(&["/", "/admin/", "users", "/:id"]), "/admin/users/:id");
/// ```
#[must_use]
pub fn join_paths(parts: &[&str]) -> String {
    normalize(&parts.join("/"))
}

/// Checks that a route template is well formed.
///
/// Segments may be literals, `:name` or `{name}` parameters, or a final
/// `*name` catch-all. Parameter names are alphanumerics and `_`.
/// Whitespace, `?`, `#`, and `.`/`..` segments are rejected.
pub fn validate_template(path: &str) -> Result<(), String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for (i, segment) in segments.iter().enumerate() {
        if segment.chars().any(|c| c.is_whitespace() || c == '?' || c == '#') {
            return Err(format!("segment '{segment}' contains a forbidden character"));
        }
        if *segment == "." || *segment == ".." {
            return Err(format!("relative segment '{segment}' is not allowed"));
        }
        if let Some(name) = param_name(segment) {
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(format!("invalid parameter name in segment '{segment}'"));
            }
        } else if let Some(name) = segment.strip_prefix('*') {
            if name.is_empty() {
                return Err("catch-all segment needs a name".to_string());
            }
            if i + 1 != segments.len() {
                return Err(format!("catch-all '{segment}' must be the last segment"));
            }
        } else if segment.contains(['{', '}']) {
            return Err(format!("unbalanced braces in segment '{segment}'"));
        }
    }
    Ok(())
}

/// Returns the parameter name of a `:name` or `{name}` segment.
pub(crate) fn param_name(segment: &str) -> Option<&str> {
    segment
        .strip_prefix(':')
        .or_else(|| segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("///"), "/");
        assert_eq!(normalize("a//b"), "/a/b");
        assert_eq!(normalize("/a/b/"), "/a/b");
    }

    #[test]
    fn test_validate_template() {
        assert!(validate_template("/users/:id").is_ok());
        assert!(validate_template("/users/{user_id}/posts").is_ok());
        assert!(validate_template("/files/*rest").is_ok());
        assert!(validate_template("/").is_ok());

        assert!(validate_template("/users/:").is_err());
        assert!(validate_template("/users/{id").is_err());
        assert!(validate_template("/users/{}").is_err());
        assert!(validate_template("/a b").is_err());
        assert!(validate_template("/search?q").is_err());
        assert!(validate_template("/../etc").is_err());
        assert!(validate_template("/*rest/more").is_err());
        assert!(validate_template("/users/:user-id").is_err());
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(parts in prop::collection::vec("[a-z0-9:]{0,6}", 0..6), seps in prop::collection::vec(0usize..4, 0..7)) {
            let mut raw = String::new();
            for (i, part) in parts.iter().enumerate() {
                raw.push_str(&"/".repeat(seps.get(i).copied().unwrap_or(1)));
                raw.push_str(part);
            }
            let once = normalize(&raw);
            prop_assert_eq!(normalize(&once), once.clone());
            prop_assert!(once.starts_with('/'));
            prop_assert!(!once.starts_with("//"));
            prop_assert!(!once.contains("//"));
        }
    }
}
