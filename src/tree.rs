//! The URL tree model and its serializer.
//!
//! A parsed URL is a tree of [`UrlSegmentGroup`]s: each group holds a
//! contiguous run of [`UrlSegment`]s under one outlet plus named child
//! groups. Trees are plain owned values; every transformation in this crate
//! builds new groups instead of mutating existing ones, so a retained tree
//! can never be changed out from under its owner.

use std::fmt;

use indexmap::IndexMap;

use crate::escape::{encode_fragment, encode_query, encode_segment};

/// The name of the default outlet.
pub const PRIMARY_OUTLET: &str = "primary";

/// Per-segment matrix parameters (and merged recognition parameters).
pub type Params = IndexMap<String, String>;

/// A single path segment with its matrix parameters.
///
/// `/team/33;expand=true` parses into the segments `team` and `33`, the
/// latter carrying `expand=true`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UrlSegment {
    /// The decoded path part.
    pub path: String,
    /// The decoded matrix parameters attached to this segment.
    pub parameters: Params,
}

impl UrlSegment {
    /// Creates a segment without matrix parameters.
    pub fn new(path: impl Into<String>) -> UrlSegment {
        UrlSegment {
            path: path.into(),
            parameters: Params::new(),
        }
    }

    /// Creates a segment with matrix parameters.
    pub fn with_parameters(path: impl Into<String>, parameters: Params) -> UrlSegment {
        UrlSegment {
            path: path.into(),
            parameters,
        }
    }

    /// Returns the value of a matrix parameter.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

impl fmt::Display for UrlSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&serialize_path(self))
    }
}

/// A node in the URL tree: a run of segments plus named child outlets.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UrlSegmentGroup {
    /// The segments consumed at this level.
    pub segments: Vec<UrlSegment>,
    /// Child groups keyed by outlet name.
    pub children: IndexMap<String, UrlSegmentGroup>,
}

impl UrlSegmentGroup {
    /// Creates a group from its parts.
    pub fn new(segments: Vec<UrlSegment>, children: IndexMap<String, UrlSegmentGroup>) -> UrlSegmentGroup {
        UrlSegmentGroup { segments, children }
    }

    /// Returns `true` if the group has any child outlets.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Returns the number of child outlets.
    pub fn number_of_children(&self) -> usize {
        self.children.len()
    }

    /// Returns the child group on the primary outlet, if any.
    pub fn primary_child(&self) -> Option<&UrlSegmentGroup> {
        self.children.get(PRIMARY_OUTLET)
    }

    /// Iterates children with the primary outlet ordered first.
    pub(crate) fn children_primary_first(&self) -> impl Iterator<Item = (&String, &UrlSegmentGroup)> {
        let primary = self.children.get_key_value(PRIMARY_OUTLET);
        primary
            .into_iter()
            .chain(self.children.iter().filter(|(k, _)| *k != PRIMARY_OUTLET))
    }
}

/// The value of a query parameter: repeated keys collapse into `Many`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl QueryValue {
    /// The first (or only) value.
    pub fn first(&self) -> &str {
        match self {
            QueryValue::One(value) => value,
            QueryValue::Many(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }

    /// Iterates all values.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        let (one, many) = match self {
            QueryValue::One(value) => (Some(value.as_str()), None),
            QueryValue::Many(values) => (None, Some(values.iter().map(String::as_str))),
        };
        one.into_iter().chain(many.into_iter().flatten())
    }

    pub(crate) fn push(&mut self, value: String) {
        match self {
            QueryValue::One(prev) => *self = QueryValue::Many(vec![std::mem::take(prev), value]),
            QueryValue::Many(values) => values.push(value),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> QueryValue {
        QueryValue::One(value.to_owned())
    }
}

/// Query parameters keyed by name.
pub type QueryParams = IndexMap<String, QueryValue>;

/// A parsed URL: the segment tree, query parameters and fragment.
///
/// Produced by [`parse_url`](crate::parse_url), by redirect resolution, or
/// by the command-based tree editor; never mutated after construction.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UrlTree {
    /// The root group. In a canonical tree the root has no segments of its
    /// own; leading path content lives under `children["primary"]`.
    pub root: UrlSegmentGroup,
    /// Decoded query parameters.
    pub query_params: QueryParams,
    /// The decoded fragment, if any.
    pub fragment: Option<String>,
}

impl UrlTree {
    /// Returns whether `other` is contained within this tree.
    ///
    /// With `exact` the segment runs and query parameters must be equal
    /// (matrix parameters are ignored, query-key order is irrelevant);
    /// otherwise `other` may be a path prefix of this tree and its query
    /// parameters a subset.
    pub fn contains(&self, other: &UrlTree, exact: bool) -> bool {
        if exact {
            return query_params_equal(&self.query_params, &other.query_params)
                && groups_equal(&self.root, &other.root);
        }
        query_params_subset(&self.query_params, &other.query_params)
            && contains_group(&self.root, &other.root, &other.root.segments)
    }
}

impl fmt::Display for UrlTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", serialize_group(&self.root, true))?;
        f.write_str(&serialize_query_params(&self.query_params))?;
        if let Some(fragment) = &self.fragment {
            write!(f, "#{}", encode_fragment(fragment))?;
        }
        Ok(())
    }
}

fn equal_paths(left: &[UrlSegment], right: &[UrlSegment]) -> bool {
    left.len() == right.len() && left.iter().zip(right).all(|(a, b)| a.path == b.path)
}

fn groups_equal(container: &UrlSegmentGroup, containee: &UrlSegmentGroup) -> bool {
    if !equal_paths(&container.segments, &containee.segments) {
        return false;
    }
    container.children.len() == containee.children.len()
        && containee.children.iter().all(|(outlet, child)| {
            container
                .children
                .get(outlet)
                .is_some_and(|c| groups_equal(c, child))
        })
}

fn contains_group(container: &UrlSegmentGroup, containee: &UrlSegmentGroup, containee_paths: &[UrlSegment]) -> bool {
    if container.segments.len() > containee_paths.len() {
        let current = &container.segments[..containee_paths.len()];
        equal_paths(current, containee_paths) && !containee.has_children()
    } else if container.segments.len() == containee_paths.len() {
        if !equal_paths(&container.segments, containee_paths) {
            return false;
        }
        containee.children.iter().all(|(outlet, child)| {
            container
                .children
                .get(outlet)
                .is_some_and(|c| contains_group(c, child, &child.segments))
        })
    } else {
        let current = &containee_paths[..container.segments.len()];
        let next = &containee_paths[container.segments.len()..];
        if !equal_paths(&container.segments, current) {
            return false;
        }
        match container.primary_child() {
            Some(primary) => contains_group(primary, containee, next),
            None => false,
        }
    }
}

fn query_params_equal(left: &QueryParams, right: &QueryParams) -> bool {
    left == right
}

fn query_params_subset(container: &QueryParams, containee: &QueryParams) -> bool {
    containee.len() <= container.len()
        && containee
            .iter()
            .all(|(key, value)| container.get(key) == Some(value))
}

/// Merges a lone primary child into its parent.
///
/// Invariant from the matching primitives: a group whose only child is on
/// the primary outlet is equivalent to the flattened run, and the flattened
/// form is the one recognition operates on.
pub(crate) fn merge_trivial_children(group: UrlSegmentGroup) -> UrlSegmentGroup {
    if group.number_of_children() == 1 {
        if let Some(child) = group.children.get(PRIMARY_OUTLET) {
            let mut segments = group.segments;
            segments.extend(child.segments.iter().cloned());
            return UrlSegmentGroup::new(segments, child.children.clone());
        }
    }
    group
}

/// Recursively prunes empty children and merges trivial primary chains.
pub(crate) fn squash(group: &UrlSegmentGroup) -> UrlSegmentGroup {
    let mut children = IndexMap::new();
    for (outlet, child) in &group.children {
        let candidate = squash(child);
        if !candidate.segments.is_empty() || candidate.has_children() {
            children.insert(outlet.clone(), candidate);
        }
    }
    merge_trivial_children(UrlSegmentGroup::new(group.segments.clone(), children))
}

/// Squashes a candidate and restores the empty-root invariant: a root that
/// ended up with its own segments is re-wrapped under the primary outlet.
pub(crate) fn canonicalize_root(candidate: UrlSegmentGroup) -> UrlSegmentGroup {
    let squashed = squash(&candidate);
    if squashed.segments.is_empty() {
        squashed
    } else {
        let mut children = IndexMap::new();
        children.insert(PRIMARY_OUTLET.to_owned(), squashed);
        UrlSegmentGroup::new(Vec::new(), children)
    }
}

fn serialize_path(segment: &UrlSegment) -> String {
    let mut out = encode_segment(&segment.path).into_owned();
    for (key, value) in &segment.parameters {
        out.push(';');
        out.push_str(&encode_segment(key));
        out.push('=');
        out.push_str(&encode_segment(value));
    }
    out
}

fn serialize_paths(group: &UrlSegmentGroup) -> String {
    group
        .segments
        .iter()
        .map(serialize_path)
        .collect::<Vec<_>>()
        .join("/")
}

pub(crate) fn serialize_group(group: &UrlSegmentGroup, root: bool) -> String {
    if !group.has_children() {
        return serialize_paths(group);
    }
    if root {
        let primary = group
            .primary_child()
            .map(|child| serialize_group(child, false))
            .unwrap_or_default();
        let others: Vec<String> = group
            .children
            .iter()
            .filter(|(outlet, _)| *outlet != PRIMARY_OUTLET)
            .map(|(outlet, child)| format!("{outlet}:{}", serialize_group(child, false)))
            .collect();
        if others.is_empty() {
            primary
        } else {
            format!("{primary}({})", others.join("//"))
        }
    } else if group.number_of_children() == 1 && group.primary_child().is_some() {
        format!(
            "{}/{}",
            serialize_paths(group),
            serialize_group(group.primary_child().unwrap(), false)
        )
    } else {
        let children: Vec<String> = group
            .children_primary_first()
            .map(|(outlet, child)| {
                if outlet == PRIMARY_OUTLET {
                    serialize_group(child, false)
                } else {
                    format!("{outlet}:{}", serialize_group(child, false))
                }
            })
            .collect();
        format!("{}/({})", serialize_paths(group), children.join("//"))
    }
}

fn serialize_query_params(params: &QueryParams) -> String {
    let pairs: Vec<String> = params
        .iter()
        .flat_map(|(key, value)| {
            value
                .iter()
                .map(move |v| format!("{}={}", encode_query(key), encode_query(v)))
        })
        .collect();
    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}
