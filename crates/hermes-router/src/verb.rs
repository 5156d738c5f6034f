//! Verb inference for endpoints that do not declare one.

use hermes_core::Verb;

/// Infers a verb from an endpoint sub-path.
///
/// Substring checks run in priority order on the lower-cased path:
/// `get` or `list` gives `GET`, then `update` gives `PATCH`, then
/// `delete` gives `DELETE`. Everything else, `create` included, is `POST`.
///
/// # Example
///
/// ```
/// use hermes_core::Verb;
/// use hermes_router::infer_verb;
///
/// assert_eq!(infer_verb("/listUsers"), Verb::Get);
/// assert_eq!(infer_verb("/update-profile"), Verb::Patch);
/// assert_eq!(infer_verb("/submit"), Verb::Post);
/// ```
#[must_use]
pub fn infer_verb(sub_path: &str) -> Verb {
    let lower = sub_path.to_ascii_lowercase();
    if lower.contains("get") || lower.contains("list") {
        Verb::Get
    } else if lower.contains("update") {
        Verb::Patch
    } else if lower.contains("delete") {
        Verb::Delete
    } else {
        Verb::Post
    }
}

/// Returns the declared verb, or the inferred one when none was declared.
#[must_use]
pub fn resolve_verb(declared: Option<Verb>, sub_path: &str) -> Verb {
    declared.unwrap_or_else(|| infer_verb(sub_path))
}
