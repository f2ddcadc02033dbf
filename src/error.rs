use thiserror::Error;

/// Represents errors that can occur when parsing a URL string.
///
/// Every variant carries the remainder of the input at the position the
/// parser gave up, so callers can point at the offending fragment.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ParseError {
    /// An empty path segment is directly followed by matrix parameters.
    #[error("empty path segment cannot have matrix parameters: '{rest}'")]
    EmptySegment { rest: String },
    /// A parenthesised outlet group was never closed.
    #[error("unterminated outlet group: '{rest}'")]
    UnterminatedGroup { rest: String },
    /// An outlet chain inside a sibling group has no `name:` label.
    #[error("missing outlet name: '{rest}'")]
    MissingOutletName { rest: String },
    /// The token required at this position is missing.
    #[error("expected '{expected}': '{rest}'")]
    ExpectedToken { expected: &'static str, rest: String },
    /// Input remained after the URL was fully parsed.
    #[error("unparsed trailing input: '{rest}'")]
    TrailingInput { rest: String },
    /// Percent-decoding did not produce valid UTF-8.
    #[error("invalid percent-encoding: '{rest}'")]
    InvalidEncoding { rest: String },
}

/// A failed recognition attempt.
///
/// Only terminal outcomes surface here. The recoverable no-match signal is
/// internal to the engine: it drives backtracking to the next candidate
/// route and is converted to [`RecognizeError::CannotMatchAnyRoutes`] only
/// once every candidate at every level is exhausted.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum RecognizeError {
    /// No configuration entry anywhere could consume the remaining URL.
    #[error("cannot match any routes, url segment: '{url}'")]
    CannotMatchAnyRoutes { url: String },
    /// The absolute-redirect ceiling was exceeded.
    #[error("detected possible infinite redirect when redirecting to '{redirect_to}'")]
    InfiniteRedirect { redirect_to: String },
    /// A gate collaborator rejected the navigation.
    #[error("navigation cancelled by guard on route '{path}'")]
    NavigationCancelled { path: String },
    /// A relative redirect resolved to more than one outlet.
    #[error("cannot redirect to '{redirect_to}': a relative redirect cannot contain named outlets")]
    NamedOutletsInRelativeRedirect { redirect_to: String },
    /// A `:name` token in a redirect template has no captured counterpart.
    #[error("cannot redirect to '{redirect_to}': cannot find positional parameter ':{name}'")]
    MissingPositionalParam { redirect_to: String, name: String },
    /// Two sibling matched nodes claimed the same outlet.
    ///
    /// This is an engine invariant violation, not a recoverable condition;
    /// it indicates a defect in the configuration or the engine itself.
    #[error("two sibling segments cannot use the same outlet name: '{outlet}'")]
    DuplicateOutletName { outlet: String },
    /// A redirect template failed to parse.
    #[error("invalid redirect target: {0}")]
    MalformedRedirect(#[from] ParseError),
}

/// Errors produced while building a tree from navigation commands.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum CreateTreeError {
    /// More `..` segments than the anchor has ancestors.
    #[error("invalid number of '..' segments")]
    InvalidDoubleDots,
    /// The root segment cannot carry matrix parameters.
    #[error("the root segment cannot have matrix parameters")]
    RootSegmentMatrixParams,
    /// An outlets command may only be the last command.
    #[error("an outlets command must be the last command")]
    MisplacedOutletsCommand,
    /// A relative navigation was requested without an anchor position.
    #[error("relative navigation requires an anchor position")]
    InvalidNavigationTarget,
}

/// An invalid route configuration.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ConfigError {
    /// Route paths are relative to their parent and cannot start with `/`.
    #[error("invalid configuration of route '{path}': path cannot start with a slash")]
    PathStartsWithSlash { path: String },
    /// A redirecting route cannot also load lazy children.
    #[error("invalid configuration of route '{path}': redirectTo and lazy children cannot be used together")]
    RedirectAndLazyChildren { path: String },
    /// Inline children and lazy children are mutually exclusive.
    #[error("invalid configuration of route '{path}': children and lazy children cannot be used together")]
    EagerAndLazyChildren { path: String },
}
