//! Route configuration: the entries recognition matches a URL against,
//! and the seams to the external collaborators (lazy-config loader and
//! navigation gate).

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ConfigError;
use crate::tree::{UrlSegment, UrlSegmentGroup, PRIMARY_OUTLET};

/// An ordered route configuration.
pub type Routes = Vec<Route>;

/// Free-form data attached to a route, inherited by matched descendants
/// according to the params-inheritance strategy.
pub type RouteData = IndexMap<String, serde_json::Value>;

/// How a route's path is matched against the segments reaching it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PathMatch {
    /// The path may consume a prefix of the remaining segments.
    #[default]
    Prefix,
    /// The path must consume every remaining segment (and the group must
    /// have no children left over).
    Full,
}

/// The result a custom [`UrlMatcher`] reports on success.
#[derive(Clone, Debug, Default)]
pub struct UrlMatchResult {
    /// The segments the matcher consumed, in order.
    pub consumed: Vec<UrlSegment>,
    /// Captured positional parameters.
    pub positional: IndexMap<String, UrlSegment>,
}

/// A custom segment-matching predicate, used in place of the default
/// token-by-token path matcher.
pub trait UrlMatcher: Send + Sync {
    /// Returns the consumed segments and captured parameters, or `None`
    /// if the route does not match.
    fn matches(&self, segments: &[UrlSegment], group: &UrlSegmentGroup, route: &Route) -> Option<UrlMatchResult>;
}

impl<F> UrlMatcher for F
where
    F: Fn(&[UrlSegment], &UrlSegmentGroup, &Route) -> Option<UrlMatchResult> + Send + Sync,
{
    fn matches(&self, segments: &[UrlSegment], group: &UrlSegmentGroup, route: &Route) -> Option<UrlMatchResult> {
        self(segments, group, route)
    }
}

/// A route's matching rule: a literal path pattern or a custom matcher.
///
/// The two are mutually exclusive by construction.
#[derive(Clone)]
pub enum RoutePath {
    /// A `/`-separated pattern; tokens starting with `:` capture the
    /// segment at that position, `**` matches any remaining segments.
    Pattern(String),
    /// A custom matcher predicate.
    Matcher(Arc<dyn UrlMatcher>),
}

impl fmt::Debug for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutePath::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            RoutePath::Matcher(_) => f.write_str("Matcher(..)"),
        }
    }
}

/// A single route configuration entry.
///
/// `Route` uses a builder-like pattern for configuration:
///
/// ```
/// use urltree::{PathMatch, Route};
///
/// let routes = vec![
///     Route::new("team/:id").children(vec![
///         Route::new("user/:name"),
///         Route::new("").redirect_to("user/me").path_match(PathMatch::Full),
///     ]),
///     Route::new("**").outlet("popup"),
/// ];
/// ```
#[derive(Clone, Debug)]
pub struct Route {
    /// The matching rule for this entry.
    pub path: RoutePath,
    /// Prefix or full matching; full requires the remaining URL at this
    /// point to be exhausted.
    pub path_match: PathMatch,
    /// The outlet this entry fills. Defaults to `"primary"`.
    pub outlet: String,
    /// A redirect template; absolute when it starts with `/`.
    pub redirect_to: Option<String>,
    /// Inline child configuration.
    pub children: Routes,
    /// Whether children are supplied lazily by a [`ConfigLoader`].
    pub lazy_children: bool,
    /// Free-form data merged into matched snapshots.
    pub data: RouteData,
}

impl Route {
    /// Creates a route matching the given path pattern.
    pub fn new(path: impl Into<String>) -> Route {
        Route {
            path: RoutePath::Pattern(path.into()),
            path_match: PathMatch::default(),
            outlet: PRIMARY_OUTLET.to_owned(),
            redirect_to: None,
            children: Vec::new(),
            lazy_children: false,
            data: RouteData::new(),
        }
    }

    /// Creates a route driven by a custom matcher.
    pub fn with_matcher(matcher: impl UrlMatcher + 'static) -> Route {
        Route {
            path: RoutePath::Matcher(Arc::new(matcher)),
            ..Route::new("")
        }
    }

    /// Sets the outlet this route fills.
    pub fn outlet(mut self, outlet: impl Into<String>) -> Route {
        self.outlet = outlet.into();
        self
    }

    /// Sets the path-matching mode.
    pub fn path_match(mut self, path_match: PathMatch) -> Route {
        self.path_match = path_match;
        self
    }

    /// Makes this route redirect to the given template.
    pub fn redirect_to(mut self, target: impl Into<String>) -> Route {
        self.redirect_to = Some(target.into());
        self
    }

    /// Sets the inline child configuration.
    pub fn children(mut self, children: Routes) -> Route {
        self.children = children;
        self
    }

    /// Marks the children of this route as lazily loaded.
    pub fn lazy(mut self) -> Route {
        self.lazy_children = true;
        self
    }

    /// Attaches a data entry to this route.
    pub fn data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Route {
        self.data.insert(key.into(), value.into());
        self
    }

    /// The literal path pattern, if this route has one.
    pub fn pattern(&self) -> Option<&str> {
        match &self.path {
            RoutePath::Pattern(pattern) => Some(pattern),
            RoutePath::Matcher(_) => None,
        }
    }

    /// Whether this route can have children at all, inline or lazy.
    pub fn has_child_config(&self) -> bool {
        !self.children.is_empty() || self.lazy_children
    }

    pub(crate) fn is_wildcard(&self) -> bool {
        self.pattern() == Some("**")
    }

    fn describe(&self) -> String {
        self.pattern().unwrap_or("<matcher>").to_owned()
    }
}

/// Supplies the already-resolved lazy children of a route.
///
/// Resolution itself (fetching, deserializing, whatever it takes) is the
/// caller's concern and happens outside recognition; implementations are
/// expected to memoize per entry so repeated recognitions against the same
/// configuration reuse the resolved list.
pub trait ConfigLoader {
    /// Returns the resolved children for `route`, or `None` when nothing
    /// has been resolved for it.
    fn resolved_children(&self, route: &Route) -> Option<&[Route]>;
}

/// A loader that never resolves anything; for eager-only configurations.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLoader;

impl ConfigLoader for NoLoader {
    fn resolved_children(&self, _route: &Route) -> Option<&[Route]> {
        None
    }
}

/// Decides whether a navigation may proceed through a route.
///
/// Consulted when a route's lazy children are about to be consumed. A
/// `false` answer cancels the whole navigation; it is never a backtrack
/// point.
pub trait RouteGate {
    /// Returns whether the navigation may pass `route`, given the segments
    /// that reached it.
    fn allows(&self, route: &Route, segments: &[UrlSegment]) -> bool;
}

/// A gate that lets every navigation through.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl RouteGate for AllowAll {
    fn allows(&self, _route: &Route, _segments: &[UrlSegment]) -> bool {
        true
    }
}

/// Validates a route configuration tree.
///
/// ```
/// use urltree::{validate_config, ConfigError, Route};
///
/// let routes = vec![Route::new("/admin")];
/// assert!(matches!(
///     validate_config(&routes),
///     Err(ConfigError::PathStartsWithSlash { .. })
/// ));
/// ```
pub fn validate_config(routes: &[Route]) -> Result<(), ConfigError> {
    for route in routes {
        if let Some(pattern) = route.pattern() {
            if pattern.starts_with('/') {
                return Err(ConfigError::PathStartsWithSlash {
                    path: route.describe(),
                });
            }
        }
        if route.redirect_to.is_some() && route.lazy_children {
            return Err(ConfigError::RedirectAndLazyChildren {
                path: route.describe(),
            });
        }
        if !route.children.is_empty() && route.lazy_children {
            return Err(ConfigError::EagerAndLazyChildren {
                path: route.describe(),
            });
        }
        validate_config(&route.children)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let route = Route::new("a");
        assert_eq!(route.outlet, PRIMARY_OUTLET);
        assert_eq!(route.path_match, PathMatch::Prefix);
        assert!(!route.has_child_config());
    }

    #[test]
    fn nested_validation() {
        let routes = vec![Route::new("a").children(vec![Route::new("b").children(vec![Route::new("/c")])])];
        assert!(matches!(
            validate_config(&routes),
            Err(ConfigError::PathStartsWithSlash { .. })
        ));
    }

    #[test]
    fn lazy_conflicts() {
        let routes = vec![Route::new("a").children(vec![Route::new("b")]).lazy()];
        assert!(matches!(
            validate_config(&routes),
            Err(ConfigError::EagerAndLazyChildren { .. })
        ));
    }
}
