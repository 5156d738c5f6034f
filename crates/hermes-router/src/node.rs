//! Radix tree node implementation.
//!
//! Each node is one path segment. Nodes at route boundaries carry a verb
//! table mapping each registered [`Verb`] to a route slot.

use crate::path::param_name;
use crate::RouteError;
use hermes_core::{PathParams, Verb};
use std::collections::BTreeMap;

/// Type of path segment in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SegmentKind {
    /// Literal segment (e.g., "users")
    Static,
    /// Named parameter (`:id` or `{id}`)
    Param(String),
    /// Catch-all (`*rest`)
    Wildcard(String),
}

/// A node in the tree.
#[derive(Debug, Clone)]
pub(crate) struct Node {
    segment: String,
    kind: SegmentKind,
    /// Route slots by verb, if a route ends here
    verbs: BTreeMap<Verb, usize>,
    /// Static children, sorted by segment for binary search
    static_children: Vec<Node>,
    param_child: Option<Box<Node>>,
    wildcard_child: Option<Box<Node>>,
}

/// The outcome of matching a path.
#[derive(Debug)]
pub(crate) enum PathMatch {
    /// The path and verb matched a route.
    Found { slot: usize, params: PathParams },
    /// The path matched but the verb did not.
    WrongVerb { allowed: Vec<Verb> },
    /// Nothing matched.
    Missing,
}

impl Node {
    fn new(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            verbs: BTreeMap::new(),
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates a root node for the tree.
    pub(crate) fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    fn parse_path(path: &str) -> Vec<(String, SegmentKind)> {
        path.split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if let Some(name) = param_name(s) {
                    (s.to_string(), SegmentKind::Param(name.to_string()))
                } else if let Some(name) = s.strip_prefix('*') {
                    (s.to_string(), SegmentKind::Wildcard(name.to_string()))
                } else {
                    (s.to_string(), SegmentKind::Static)
                }
            })
            .collect()
    }

    /// Checks whether `verb path` could be inserted.
    pub(crate) fn check(&self, verb: Verb, path: &str) -> Result<(), RouteError> {
        let segments = Self::parse_path(path);
        self.check_segments(&segments, verb, path)
    }

    fn check_segments(
        &self,
        segments: &[(String, SegmentKind)],
        verb: Verb,
        path: &str,
    ) -> Result<(), RouteError> {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            if self.verbs.contains_key(&verb) {
                return Err(RouteError::Duplicate {
                    verb,
                    path: path.to_string(),
                });
            }
            return Ok(());
        };

        let child = match kind {
            SegmentKind::Static => self.find_static_child(segment),
            SegmentKind::Param(name) | SegmentKind::Wildcard(name) => {
                let existing = match kind {
                    SegmentKind::Param(_) => self.param_child.as_deref(),
                    _ => self.wildcard_child.as_deref(),
                };
                if let Some(node) = existing {
                    if let SegmentKind::Param(other) | SegmentKind::Wildcard(other) = &node.kind {
                        if other != name {
                            return Err(RouteError::ConflictingParam {
                                path: path.to_string(),
                                existing: other.clone(),
                                new: name.clone(),
                            });
                        }
                    }
                }
                existing
            }
        };
        match child {
            Some(child) => child.check_segments(remaining, verb, path),
            None => Ok(()),
        }
    }

    /// Inserts a route slot. Call [`check`](Self::check) first.
    pub(crate) fn insert(&mut self, verb: Verb, path: &str, slot: usize) {
        let segments = Self::parse_path(path);
        self.insert_segments(&segments, verb, slot);
    }

    fn insert_segments(&mut self, segments: &[(String, SegmentKind)], verb: Verb, slot: usize) {
        let Some(((segment, kind), remaining)) = segments.split_first() else {
            self.verbs.insert(verb, slot);
            return;
        };

        match kind {
            SegmentKind::Static => {
                if let Ok(i) = self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(segment))
                {
                    self.static_children[i].insert_segments(remaining, verb, slot);
                } else {
                    let mut child = Self::new(segment.clone(), SegmentKind::Static);
                    child.insert_segments(remaining, verb, slot);
                    self.static_children.push(child);
                    // Keep sorted for binary search
                    self.static_children
                        .sort_by(|a, b| a.segment.cmp(&b.segment));
                }
            }
            SegmentKind::Param(_) => {
                let child = self
                    .param_child
                    .get_or_insert_with(|| Box::new(Self::new(segment.clone(), kind.clone())));
                child.insert_segments(remaining, verb, slot);
            }
            SegmentKind::Wildcard(_) => {
                let child = self
                    .wildcard_child
                    .get_or_insert_with(|| Box::new(Self::new(segment.clone(), kind.clone())));
                child.verbs.insert(verb, slot);
            }
        }
    }

    /// Matches a request path and verb.
    pub(crate) fn match_path(&self, verb: Option<Verb>, path: &str) -> PathMatch {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut params = PathParams::new();
        match self.match_segments(&segments, &mut params) {
            Some(node) => match verb.and_then(|v| node.verbs.get(&v)) {
                Some(&slot) => PathMatch::Found { slot, params },
                None => PathMatch::WrongVerb {
                    allowed: node.verbs.keys().copied().collect(),
                },
            },
            None => PathMatch::Missing,
        }
    }

    // Static beats param beats wildcard; params are rolled back on a miss.
    fn match_segments<'a>(&'a self, segments: &[&str], params: &mut PathParams) -> Option<&'a Self> {
        let Some((segment, remaining)) = segments.split_first() else {
            return (!self.verbs.is_empty()).then_some(self);
        };

        if let Some(child) = self.find_static_child(segment) {
            if let Some(found) = child.match_segments(remaining, params) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            if let SegmentKind::Param(name) = &child.kind {
                let mark = params.len();
                params.push(name.clone(), (*segment).to_string());
                if let Some(found) = child.match_segments(remaining, params) {
                    return Some(found);
                }
                params.truncate(mark);
            }
        }

        if let Some(child) = &self.wildcard_child {
            if let SegmentKind::Wildcard(name) = &child.kind {
                params.push(name.clone(), segments.join("/"));
                return Some(child);
            }
        }

        None
    }

    fn find_static_child(&self, segment: &str) -> Option<&Self> {
        self.static_children
            .binary_search_by(|c| c.segment.as_str().cmp(segment))
            .ok()
            .map(|i| &self.static_children[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(routes: &[(Verb, &str)]) -> Node {
        let mut root = Node::root();
        for (slot, (verb, path)) in routes.iter().enumerate() {
            root.check(*verb, path).unwrap();
            root.insert(*verb, path, slot);
        }
        root
    }

    fn found(m: PathMatch) -> (usize, PathParams) {
        match m {
            PathMatch::Found { slot, params } => (slot, params),
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_static_priority_over_param() {
        let root = tree(&[(Verb::Get, "/users/:id"), (Verb::Get, "/users/me")]);
        let (slot, params) = found(root.match_path(Some(Verb::Get), "/users/me"));
        assert_eq!(slot, 1);
        assert!(params.is_empty());

        let (slot, params) = found(root.match_path(Some(Verb::Get), "/users/42"));
        assert_eq!(slot, 0);
        assert_eq!(params.get("id"), Some("42"));
    }

    #[test]
    fn test_both_param_syntaxes() {
        let root = tree(&[(Verb::Get, "/orgs/{org}/users/:user")]);
        let (_, params) = found(root.match_path(Some(Verb::Get), "/orgs/acme/users/7"));
        assert_eq!(params.get("org"), Some("acme"));
        assert_eq!(params.get("user"), Some("7"));
    }

    #[test]
    fn test_params_roll_back_on_miss() {
        let root = tree(&[(Verb::Get, "/a/:x/b"), (Verb::Get, "/a/*rest")]);
        let (slot, params) = found(root.match_path(Some(Verb::Get), "/a/1/c"));
        assert_eq!(slot, 1);
        assert_eq!(params.get("x"), None);
        assert_eq!(params.get("rest"), Some("1/c"));
    }

    #[test]
    fn test_wrong_verb_lists_allowed() {
        let root = tree(&[(Verb::Get, "/items"), (Verb::Delete, "/items")]);
        match root.match_path(Some(Verb::Post), "/items") {
            PathMatch::WrongVerb { allowed } => assert_eq!(allowed, vec![Verb::Get, Verb::Delete]),
            other => panic!("expected WrongVerb, got {other:?}"),
        }
        assert!(matches!(root.match_path(None, "/items"), PathMatch::WrongVerb { .. }));
        assert!(matches!(root.match_path(Some(Verb::Get), "/nope"), PathMatch::Missing));
    }

    #[test]
    fn test_duplicates_and_conflicts_are_detected() {
        let root = tree(&[(Verb::Get, "/users/:id")]);
        assert!(matches!(
            root.check(Verb::Get, "/users/{id}"),
            Err(RouteError::Duplicate { .. })
        ));
        assert!(matches!(
            root.check(Verb::Get, "/users/:userId/posts"),
            Err(RouteError::ConflictingParam { .. })
        ));
        assert!(root.check(Verb::Post, "/users/:id").is_ok());
    }
}
