//! The recognition engine: matches a parsed URL tree against a route
//! configuration, expanding redirects along the way, and produces the
//! immutable tree of matched-route snapshots plus the canonical
//! (redirect-applied) URL tree.

use std::collections::HashSet;

use indexmap::IndexMap;

use log::{debug, trace};

use crate::commands::group_from_snapshot;
use crate::config::{AllowAll, ConfigLoader, NoLoader, Route, RouteData, RouteGate};
use crate::error::RecognizeError;
use crate::matcher::{empty_path_match, match_segments, split, SegmentMatch};
use crate::redirect::{apply_redirect, linearize_segments};
use crate::tree::{canonicalize_root, Params, UrlSegment, UrlSegmentGroup, UrlTree, PRIMARY_OUTLET};

/// Absolute redirects allowed within one recognition pass. Exceeding the
/// ceiling fails the navigation instead of looping forever.
const MAX_ABSOLUTE_REDIRECTS: u32 = 31;

/// How matched parameters and data propagate to descendant snapshots.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ParamsInheritanceStrategy {
    /// Inherit across empty-path boundaries only.
    #[default]
    EmptyOnly,
    /// Every snapshot inherits all ancestor parameters and data.
    Always,
}

/// Collaborators and policies for one recognition pass.
#[derive(Clone, Copy)]
pub struct RecognizeOptions<'c> {
    /// The gate consulted before lazy children are consumed.
    pub gate: &'c dyn RouteGate,
    /// The source of resolved lazy children.
    pub loader: &'c dyn ConfigLoader,
    /// The parameter-inheritance strategy.
    pub strategy: ParamsInheritanceStrategy,
}

static ALLOW_ALL: AllowAll = AllowAll;
static NO_LOADER: NoLoader = NoLoader;

impl Default for RecognizeOptions<'_> {
    fn default() -> Self {
        RecognizeOptions {
            gate: &ALLOW_ALL,
            loader: &NO_LOADER,
            strategy: ParamsInheritanceStrategy::default(),
        }
    }
}

/// One matched route: the segments it consumed, its merged parameters and
/// the configuration entry that matched. Frozen once recognition finishes.
#[derive(Clone, Debug)]
pub struct RouteSnapshot<'c> {
    /// The outlet this snapshot fills.
    pub outlet: String,
    /// The segments consumed by this match.
    pub url: Vec<UrlSegment>,
    /// Matrix and positional parameters, inherited per strategy.
    pub params: Params,
    /// Route data, inherited per strategy.
    pub data: RouteData,
    /// The configuration entry that matched; `None` only at the root.
    pub route: Option<&'c Route>,
}

/// A node in the matched-route tree.
#[derive(Clone, Debug)]
pub struct SnapshotNode<'c> {
    /// The snapshot at this node.
    pub value: RouteSnapshot<'c>,
    /// Matched children, mirroring the segment tree's shape.
    pub children: Vec<SnapshotNode<'c>>,
}

/// The result of a successful recognition.
#[derive(Clone, Debug)]
pub struct RouteState<'c> {
    /// The root of the matched-route tree.
    pub root: SnapshotNode<'c>,
    /// The canonical URL tree with all redirects applied.
    pub url: UrlTree,
}

/// Internal outcome of one matching attempt.
///
/// `NoMatch` is the recoverable signal driving backtracking; it is caught
/// at every candidate loop. The other two abort the current pass.
enum Trial {
    NoMatch,
    Absolute(UrlTree),
    Abort(RecognizeError),
}

type Attempt<'c> = Result<Vec<SnapshotNode<'c>>, Trial>;

/// Recognizes `url_tree` against `config` with default collaborators.
///
/// ```
/// use urltree::{parse_url, recognize, Route};
///
/// let config = vec![Route::new("team/:id")];
/// let tree = parse_url("/team/33").unwrap();
/// let state = recognize(&config, &tree).unwrap();
/// assert_eq!(state.root.children[0].value.params["id"], "33");
/// ```
pub fn recognize<'c>(config: &'c [Route], url_tree: &UrlTree) -> Result<RouteState<'c>, RecognizeError> {
    recognize_with(config, url_tree, RecognizeOptions::default())
}

/// Recognizes `url_tree` against `config` with explicit collaborators.
pub fn recognize_with<'c>(
    config: &'c [Route],
    url_tree: &UrlTree,
    options: RecognizeOptions<'c>,
) -> Result<RouteState<'c>, RecognizeError> {
    Recognizer {
        config,
        gate: options.gate,
        loader: options.loader,
        strategy: options.strategy,
        url_tree: url_tree.clone(),
        absolute_redirects: 0,
    }
    .run()
}

struct Recognizer<'c> {
    config: &'c [Route],
    gate: &'c dyn RouteGate,
    loader: &'c dyn ConfigLoader,
    strategy: ParamsInheritanceStrategy,
    url_tree: UrlTree,
    absolute_redirects: u32,
}

impl<'c> Recognizer<'c> {
    fn run(mut self) -> Result<RouteState<'c>, RecognizeError> {
        loop {
            match self.process_root() {
                Ok(children) => return Ok(self.freeze(children)),
                Err(Trial::Absolute(tree)) => {
                    debug!("restarting recognition at '{tree}' after absolute redirect");
                    self.url_tree = tree;
                }
                Err(Trial::NoMatch) => {
                    return Err(RecognizeError::CannotMatchAnyRoutes {
                        url: self.url_tree.to_string(),
                    })
                }
                Err(Trial::Abort(err)) => return Err(err),
            }
        }
    }

    fn process_root(&mut self) -> Attempt<'c> {
        let config: Vec<&'c Route> = self.config.iter().collect();
        let root = self.url_tree.root.clone();
        let (root, _) = split(&root, &[], &[], &config);
        self.process_group(&config, &root, PRIMARY_OUTLET)
    }

    fn process_group(&mut self, routes: &[&'c Route], group: &UrlSegmentGroup, outlet: &str) -> Attempt<'c> {
        if group.segments.is_empty() && group.has_children() {
            return self.process_children(routes, group);
        }
        self.process_segment(routes, group, &group.segments, outlet, true)
    }

    /// Resolves every child outlet, primary first, then reconciles the
    /// results: nodes produced by the same empty-path entry across outlets
    /// are merged, and outlet uniqueness is asserted.
    fn process_children(&mut self, routes: &[&'c Route], group: &UrlSegmentGroup) -> Attempt<'c> {
        let mut outlets: Vec<&String> = Vec::with_capacity(group.children.len());
        for outlet in group.children.keys() {
            if outlet == PRIMARY_OUTLET {
                outlets.insert(0, outlet);
            } else {
                outlets.push(outlet);
            }
        }
        let mut children = Vec::new();
        for outlet in outlets {
            let child = &group.children[outlet];
            let sorted = sort_by_matching_outlets(routes, outlet);
            children.extend(self.process_group(&sorted, child, outlet)?);
        }
        let mut merged = merge_empty_path_matches(children);
        check_outlet_uniqueness(&merged).map_err(Trial::Abort)?;
        sort_nodes(&mut merged);
        Ok(merged)
    }

    /// Tries every candidate route in order; the first fully successful
    /// attempt wins. A `NoMatch` from anywhere inside an attempt fails only
    /// that candidate and moves on to the next sibling.
    fn process_segment(
        &mut self,
        routes: &[&'c Route],
        group: &UrlSegmentGroup,
        segments: &[UrlSegment],
        outlet: &str,
        allow_redirects: bool,
    ) -> Attempt<'c> {
        for route in routes {
            match self.process_segment_against_route(route, routes, group, segments, outlet, allow_redirects) {
                Err(Trial::NoMatch) => continue,
                outcome => return outcome,
            }
        }
        if no_leftovers_in_url(group, segments, outlet) {
            return Ok(Vec::new());
        }
        Err(Trial::NoMatch)
    }

    fn process_segment_against_route(
        &mut self,
        route: &'c Route,
        routes: &[&'c Route],
        group: &UrlSegmentGroup,
        segments: &[UrlSegment],
        outlet: &str,
        allow_redirects: bool,
    ) -> Attempt<'c> {
        if !is_immediate_match(route, group, segments, outlet) {
            return Err(Trial::NoMatch);
        }
        match &route.redirect_to {
            None => self.match_segment_against_route(route, group, segments, outlet),
            Some(_) if allow_redirects => self.expand_redirect(route, routes, group, segments, outlet),
            Some(_) => Err(Trial::NoMatch),
        }
    }

    fn expand_redirect(
        &mut self,
        route: &'c Route,
        routes: &[&'c Route],
        group: &UrlSegmentGroup,
        segments: &[UrlSegment],
        outlet: &str,
    ) -> Attempt<'c> {
        let redirect_to = route.redirect_to.as_deref().unwrap_or_default();
        let matched = if route.is_wildcard() {
            SegmentMatch {
                consumed: segments.to_vec(),
                ..SegmentMatch::default()
            }
        } else {
            match_segments(group, route, segments).ok_or(Trial::NoMatch)?
        };
        let new_tree = apply_redirect(redirect_to, &matched.consumed, &matched.positional, &self.url_tree.query_params)
            .map_err(Trial::Abort)?;
        if redirect_to.starts_with('/') {
            self.absolute_redirects += 1;
            if self.absolute_redirects > MAX_ABSOLUTE_REDIRECTS {
                return Err(Trial::Abort(RecognizeError::InfiniteRedirect {
                    redirect_to: redirect_to.to_owned(),
                }));
            }
            return Err(Trial::Absolute(new_tree));
        }
        let mut new_segments = linearize_segments(&new_tree, redirect_to).map_err(Trial::Abort)?;
        new_segments.extend(matched.remaining);
        trace!("re-entering match with relative redirect '{redirect_to}'");
        // The redirect target itself may not redirect again in this step.
        self.process_segment(routes, group, &new_segments, outlet, false)
    }

    fn match_segment_against_route(
        &mut self,
        route: &'c Route,
        group: &UrlSegmentGroup,
        segments: &[UrlSegment],
        outlet: &str,
    ) -> Attempt<'c> {
        let (group, consumed, remaining, params) = if route.is_wildcard() {
            // A wildcard swallows the whole remainder, including any child
            // groups still hanging off this level.
            let params = segments
                .last()
                .map(|segment| segment.parameters.clone())
                .unwrap_or_default();
            let swallowed = UrlSegmentGroup::new(group.segments.clone(), IndexMap::new());
            (swallowed, segments.to_vec(), Vec::new(), params)
        } else {
            let m = match_segments(group, route, segments).ok_or(Trial::NoMatch)?;
            (group.clone(), m.consumed, m.remaining, m.parameters)
        };
        let child_config = self.child_config(route, &consumed).map_err(Trial::Abort)?;
        let child_refs: Vec<&'c Route> = child_config.iter().collect();
        let (split_group, sliced) = split(&group, &consumed, &remaining, &child_refs);
        let snapshot = RouteSnapshot {
            outlet: route.outlet.clone(),
            url: consumed,
            params,
            data: route.data.clone(),
            route: Some(route),
        };
        if sliced.is_empty() && split_group.has_children() {
            let children = self.process_children(&child_refs, &split_group)?;
            return Ok(vec![SnapshotNode { value: snapshot, children }]);
        }
        if child_refs.is_empty() && sliced.is_empty() {
            return Ok(vec![SnapshotNode { value: snapshot, children: Vec::new() }]);
        }
        let next_outlet = if route.outlet == outlet { PRIMARY_OUTLET } else { outlet };
        let children = self.process_segment(&child_refs, &split_group, &sliced, next_outlet, true)?;
        Ok(vec![SnapshotNode { value: snapshot, children }])
    }

    /// The child configuration of a route; lazy children pass through the
    /// gate first, and a rejection cancels the whole navigation.
    fn child_config(&self, route: &'c Route, segments: &[UrlSegment]) -> Result<&'c [Route], RecognizeError> {
        if !route.children.is_empty() {
            return Ok(&route.children);
        }
        if route.lazy_children {
            if !self.gate.allows(route, segments) {
                return Err(RecognizeError::NavigationCancelled {
                    path: route.pattern().unwrap_or("<matcher>").to_owned(),
                });
            }
            return Ok(self.loader.resolved_children(route).unwrap_or(&[]));
        }
        Ok(&[])
    }

    fn freeze(&self, children: Vec<SnapshotNode<'c>>) -> RouteState<'c> {
        let root = SnapshotNode {
            value: RouteSnapshot {
                outlet: PRIMARY_OUTLET.to_owned(),
                url: Vec::new(),
                params: Params::new(),
                data: RouteData::new(),
                route: None,
            },
            children,
        };
        let mut ancestors = Vec::new();
        let root = inherit(root, &mut ancestors, self.strategy);
        let url = UrlTree {
            root: canonicalize_root(group_from_snapshot(&root)),
            query_params: self.url_tree.query_params.clone(),
            fragment: self.url_tree.fragment.clone(),
        };
        RouteState { root, url }
    }
}

fn is_immediate_match(route: &Route, group: &UrlSegmentGroup, segments: &[UrlSegment], outlet: &str) -> bool {
    // A route on another outlet is skipped, except that empty-path routes
    // may match across outlets while a named outlet is being processed.
    !(route.outlet != outlet && (outlet == PRIMARY_OUTLET || !empty_path_match(group, segments, route)))
}

fn no_leftovers_in_url(group: &UrlSegmentGroup, segments: &[UrlSegment], outlet: &str) -> bool {
    segments.is_empty() && !group.children.contains_key(outlet)
}

/// Stable-reorders a configuration so entries on `outlet` come first.
fn sort_by_matching_outlets<'c>(routes: &[&'c Route], outlet: &str) -> Vec<&'c Route> {
    let mut sorted: Vec<&'c Route> = routes.iter().copied().filter(|r| r.outlet == outlet).collect();
    sorted.extend(routes.iter().copied().filter(|r| r.outlet != outlet));
    sorted
}

fn has_empty_path_config(node: &SnapshotNode<'_>) -> bool {
    node.value.route.is_some_and(|route| route.pattern() == Some(""))
}

fn same_config(left: &SnapshotNode<'_>, right: &SnapshotNode<'_>) -> bool {
    match (left.value.route, right.value.route) {
        (Some(a), Some(b)) => std::ptr::eq(a, b),
        _ => false,
    }
}

/// Merges sibling nodes produced by the same empty-path configuration
/// entry. Several outlets can independently land on one chain of
/// empty-path configs; their children are concatenated and merged again,
/// recursively, so the chain appears once in the final tree.
fn merge_empty_path_matches<'c>(nodes: Vec<SnapshotNode<'c>>) -> Vec<SnapshotNode<'c>> {
    let mut result: Vec<SnapshotNode<'c>> = Vec::new();
    let mut merged: Vec<usize> = Vec::new();
    for node in nodes {
        if !has_empty_path_config(&node) {
            result.push(node);
            continue;
        }
        if let Some(idx) = result.iter().position(|existing| same_config(existing, &node)) {
            result[idx].children.extend(node.children);
            if !merged.contains(&idx) {
                merged.push(idx);
            }
        } else {
            result.push(node);
        }
    }
    result
        .into_iter()
        .enumerate()
        .map(|(idx, node)| {
            if merged.contains(&idx) {
                SnapshotNode {
                    value: node.value,
                    children: merge_empty_path_matches(node.children),
                }
            } else {
                node
            }
        })
        .collect()
}

fn check_outlet_uniqueness(nodes: &[SnapshotNode<'_>]) -> Result<(), RecognizeError> {
    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(node.value.outlet.as_str()) {
            return Err(RecognizeError::DuplicateOutletName {
                outlet: node.value.outlet.clone(),
            });
        }
    }
    Ok(())
}

fn sort_nodes(nodes: &mut [SnapshotNode<'_>]) {
    nodes.sort_by(|a, b| {
        use std::cmp::Ordering;
        match (a.value.outlet == PRIMARY_OUTLET, b.value.outlet == PRIMARY_OUTLET) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => a.value.outlet.cmp(&b.value.outlet),
        }
    });
}

/// Entry in the inheritance walk: whether the node's config is empty-path,
/// plus its own params and data.
type AncestorEntry = (bool, Params, RouteData);

/// Recomputes every snapshot's params and data with inheritance applied.
///
/// A snapshot inherits the contiguous ancestor run reachable across
/// empty-path boundaries (either the node or its parent being an
/// empty-path config keeps the walk going); `Always` takes the full run.
fn inherit<'c>(
    node: SnapshotNode<'c>,
    ancestors: &mut Vec<AncestorEntry>,
    strategy: ParamsInheritanceStrategy,
) -> SnapshotNode<'c> {
    let own_empty = node.value.route.is_some_and(|route| route.pattern() == Some(""));
    ancestors.push((own_empty, node.value.params.clone(), node.value.data.clone()));
    let last = ancestors.len() - 1;
    let mut start = match strategy {
        ParamsInheritanceStrategy::Always => 0,
        ParamsInheritanceStrategy::EmptyOnly => {
            let mut idx = last;
            while idx >= 1 && (ancestors[idx].0 || ancestors[idx - 1].0) {
                idx -= 1;
            }
            idx
        }
    };
    let mut params = Params::new();
    let mut data = RouteData::new();
    while start <= last {
        params.extend(ancestors[start].1.iter().map(|(k, v)| (k.clone(), v.clone())));
        data.extend(ancestors[start].2.iter().map(|(k, v)| (k.clone(), v.clone())));
        start += 1;
    }
    let children = node
        .children
        .into_iter()
        .map(|child| inherit(child, ancestors, strategy))
        .collect();
    ancestors.pop();
    SnapshotNode {
        value: RouteSnapshot {
            params,
            data,
            ..node.value
        },
        children,
    }
}
