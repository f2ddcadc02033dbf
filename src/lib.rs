//! A declarative URL router.
//!
//! Given a raw URL string and an ordered tree of route configuration
//! entries, this crate parses the URL into a structured [`UrlTree`],
//! matches that tree against the configuration — expanding any redirects
//! it encounters — and produces an immutable tree of matched-route
//! snapshots: the segments each entry consumed, the parameters it
//! captured, and the entry itself.
//!
//! ```rust
//! use urltree::{parse_url, recognize, Route};
//!
//! let config = vec![
//!     Route::new("team/:id").children(vec![
//!         Route::new("user/:name"),
//!         Route::new("").redirect_to("user/me"),
//!     ]),
//! ];
//!
//! let tree = parse_url("/team/33;expand=true/user/11").unwrap();
//! let state = recognize(&config, &tree).unwrap();
//!
//! let team = &state.root.children[0];
//! assert_eq!(team.value.params["id"], "33");
//! assert_eq!(team.value.params["expand"], "true");
//! assert_eq!(team.children[0].value.params["name"], "11");
//! ```
//!
//! The pieces compose as a pipeline, and each is usable on its own:
//!
//! - [`parse_url`] and [`UrlTree`]'s `Display` impl are the wire-format
//!   codec. Round trip: `parse(serialize(t))` is structurally equal to `t`.
//! - [`match_segments`] is the primitive comparing one route against a run
//!   of segments.
//! - [`recognize`] orchestrates matching: outlets are processed primary
//!   first, candidate entries in declared order with genuine backtracking,
//!   redirects are expanded with an absolute-redirect ceiling, and the
//!   result carries the canonical redirect-applied tree.
//! - [`create_url_tree`] edits a tree with navigation commands (`"../22"`,
//!   matrix-parameter objects, per-outlet maps) to build navigation
//!   targets.
//!
//! External concerns stay external: lazily-loaded child configuration is
//! consumed through [`ConfigLoader`] and navigation gates through
//! [`RouteGate`]; both have no-op defaults.

#![deny(clippy::all)]
#![forbid(unsafe_code)]

mod commands;
mod config;
mod error;
mod escape;
mod matcher;
mod parser;
mod recognize;
mod redirect;
mod tree;

pub use commands::{create_url_tree, create_url_tree_from_snapshot, UrlCommand, UrlPosition};
pub use config::{
    validate_config, AllowAll, ConfigLoader, NoLoader, PathMatch, Route, RouteData, RouteGate, RoutePath, Routes,
    UrlMatchResult, UrlMatcher,
};
pub use error::{ConfigError, CreateTreeError, ParseError, RecognizeError};
pub use matcher::{match_segments, SegmentMatch};
pub use parser::parse_url;
pub use recognize::{
    recognize, recognize_with, ParamsInheritanceStrategy, RecognizeOptions, RouteSnapshot, RouteState, SnapshotNode,
};
pub use tree::{Params, QueryParams, QueryValue, UrlSegment, UrlSegmentGroup, UrlTree, PRIMARY_OUTLET};
