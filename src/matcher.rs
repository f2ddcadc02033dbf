//! Segment-matching primitives: comparing one route's path against a run
//! of segments, and splitting a group into consumed and remaining parts
//! before recursing into child configuration.

use indexmap::IndexMap;

use crate::config::{PathMatch, Route, RoutePath};
use crate::tree::{Params, UrlSegment, UrlSegmentGroup, PRIMARY_OUTLET};

/// A successful segment match.
#[derive(Clone, Debug, Default)]
pub struct SegmentMatch {
    /// The segments the route consumed, in order.
    pub consumed: Vec<UrlSegment>,
    /// The segments left over for child configuration.
    pub remaining: Vec<UrlSegment>,
    /// Positional parameters captured from `:name` tokens, keyed by name.
    pub positional: IndexMap<String, UrlSegment>,
    /// Positional parameters flattened to their paths, merged with the
    /// matrix parameters of the last consumed segment.
    pub parameters: Params,
}

/// Matches one route against the segments remaining in `group`.
///
/// An empty path pattern matches without consuming anything, unless the
/// route requires a full match and input (segments or children) remains. A
/// custom matcher, when the route carries one, replaces the token walk
/// entirely.
pub fn match_segments(group: &UrlSegmentGroup, route: &Route, segments: &[UrlSegment]) -> Option<SegmentMatch> {
    match &route.path {
        RoutePath::Pattern(pattern) => {
            if pattern.is_empty() {
                if route.path_match == PathMatch::Full && (group.has_children() || !segments.is_empty()) {
                    return None;
                }
                return Some(SegmentMatch {
                    remaining: segments.to_vec(),
                    ..SegmentMatch::default()
                });
            }
            let (consumed_len, positional) = match_pattern(pattern, route.path_match, group, segments)?;
            Some(build_match(segments, consumed_len, positional))
        }
        RoutePath::Matcher(matcher) => {
            let result = matcher.matches(segments, group, route)?;
            let consumed_len = result.consumed.len();
            Some(build_match(segments, consumed_len, result.positional))
        }
    }
}

fn match_pattern(
    pattern: &str,
    path_match: PathMatch,
    group: &UrlSegmentGroup,
    segments: &[UrlSegment],
) -> Option<(usize, IndexMap<String, UrlSegment>)> {
    let parts: Vec<&str> = pattern.split('/').collect();
    if parts.len() > segments.len() {
        return None;
    }
    if path_match == PathMatch::Full && (group.has_children() || parts.len() < segments.len()) {
        return None;
    }
    let mut positional = IndexMap::new();
    for (part, segment) in parts.iter().zip(segments) {
        if let Some(name) = part.strip_prefix(':') {
            positional.insert(name.to_owned(), segment.clone());
        } else if *part != segment.path {
            return None;
        }
    }
    Some((parts.len(), positional))
}

fn build_match(segments: &[UrlSegment], consumed_len: usize, positional: IndexMap<String, UrlSegment>) -> SegmentMatch {
    let consumed = segments[..consumed_len].to_vec();
    let remaining = segments[consumed_len..].to_vec();
    let mut parameters: Params = positional
        .iter()
        .map(|(name, segment)| (name.clone(), segment.path.clone()))
        .collect();
    if let Some(last) = consumed.last() {
        parameters.extend(last.parameters.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    SegmentMatch {
        consumed,
        remaining,
        positional,
        parameters,
    }
}

/// Whether `route` is an empty-path match for the given position.
pub(crate) fn empty_path_match(group: &UrlSegmentGroup, segments: &[UrlSegment], route: &Route) -> bool {
    if (group.has_children() || !segments.is_empty()) && route.path_match == PathMatch::Full {
        return false;
    }
    route.pattern() == Some("")
}

/// Partitions a group for recursion into `child_config`.
///
/// Two rewrites keep empty-path routes out of the literal URL: when input
/// remains and a named outlet in the child configuration could empty-path
/// match, the remainder is wrapped as the primary child next to fresh empty
/// groups for those outlets; when no input remains, empty groups are added
/// for empty-path routes whose outlets are absent. Trivial-child merging of
/// the produced trees happens during canonicalization, never here: a child
/// group still carrying unconsumed segments must survive the split intact.
pub(crate) fn split(
    group: &UrlSegmentGroup,
    consumed: &[UrlSegment],
    remaining: &[UrlSegment],
    child_config: &[&Route],
) -> (UrlSegmentGroup, Vec<UrlSegment>) {
    if !remaining.is_empty()
        && child_config
            .iter()
            .any(|r| empty_path_match(group, remaining, r) && r.outlet != PRIMARY_OUTLET)
    {
        let wrapped = UrlSegmentGroup::new(remaining.to_vec(), group.children.clone());
        let rewritten = UrlSegmentGroup::new(
            consumed.to_vec(),
            children_for_empty_paths(child_config, wrapped),
        );
        return (rewritten, Vec::new());
    }
    if remaining.is_empty()
        && child_config
            .iter()
            .any(|r| empty_path_match(group, remaining, r))
    {
        let rewritten = UrlSegmentGroup::new(
            group.segments.clone(),
            add_empty_path_children(group, remaining, child_config),
        );
        return (rewritten, remaining.to_vec());
    }
    (group.clone(), remaining.to_vec())
}

fn children_for_empty_paths(routes: &[&Route], primary: UrlSegmentGroup) -> IndexMap<String, UrlSegmentGroup> {
    let mut children = IndexMap::new();
    children.insert(PRIMARY_OUTLET.to_owned(), primary);
    for route in routes {
        if route.pattern() == Some("") && route.outlet != PRIMARY_OUTLET {
            children.insert(route.outlet.clone(), UrlSegmentGroup::default());
        }
    }
    children
}

fn add_empty_path_children(
    group: &UrlSegmentGroup,
    remaining: &[UrlSegment],
    routes: &[&Route],
) -> IndexMap<String, UrlSegmentGroup> {
    let mut children = group.children.clone();
    for route in routes {
        if empty_path_match(group, remaining, route) && !children.contains_key(&route.outlet) {
            children.insert(route.outlet.clone(), UrlSegmentGroup::default());
        }
    }
    children
}
