//! Redirect template substitution.
//!
//! A `redirectTo` template is itself a URL: its `:name` path tokens are
//! replaced by captured positional parameters, its literal tokens pick up
//! the matrix parameters of the segment they matched, and its `:name`
//! query values copy the incoming request's query parameters.

use indexmap::IndexMap;

use log::debug;

use crate::error::RecognizeError;
use crate::parser::parse_url;
use crate::tree::{QueryParams, QueryValue, UrlSegment, UrlSegmentGroup, UrlTree, PRIMARY_OUTLET};

/// Builds the substituted tree for a matched redirect.
pub(crate) fn apply_redirect(
    redirect_to: &str,
    consumed: &[UrlSegment],
    positional: &IndexMap<String, UrlSegment>,
    actual_query: &QueryParams,
) -> Result<UrlTree, RecognizeError> {
    let template = parse_url(redirect_to)?;
    let root = substitute_group(redirect_to, &template.root, consumed, positional)?;
    let query_params = substitute_query(&template.query_params, actual_query);
    debug!("expanding redirect template '{redirect_to}'");
    Ok(UrlTree {
        root,
        query_params,
        fragment: template.fragment,
    })
}

fn substitute_group(
    redirect_to: &str,
    group: &UrlSegmentGroup,
    consumed: &[UrlSegment],
    positional: &IndexMap<String, UrlSegment>,
) -> Result<UrlSegmentGroup, RecognizeError> {
    let segments = group
        .segments
        .iter()
        .map(|segment| substitute_segment(redirect_to, segment, consumed, positional))
        .collect::<Result<Vec<_>, _>>()?;
    let mut children = IndexMap::new();
    for (outlet, child) in &group.children {
        children.insert(
            outlet.clone(),
            substitute_group(redirect_to, child, consumed, positional)?,
        );
    }
    Ok(UrlSegmentGroup::new(segments, children))
}

fn substitute_segment(
    redirect_to: &str,
    template: &UrlSegment,
    consumed: &[UrlSegment],
    positional: &IndexMap<String, UrlSegment>,
) -> Result<UrlSegment, RecognizeError> {
    if let Some(name) = template.path.strip_prefix(':') {
        return positional
            .get(name)
            .cloned()
            .ok_or_else(|| RecognizeError::MissingPositionalParam {
                redirect_to: redirect_to.to_owned(),
                name: name.to_owned(),
            });
    }
    // A literal token picks up the consumed segment with the same path so
    // its matrix parameters survive the substitution.
    Ok(consumed
        .iter()
        .find(|segment| segment.path == template.path)
        .cloned()
        .unwrap_or_else(|| template.clone()))
}

fn substitute_query(template: &QueryParams, actual: &QueryParams) -> QueryParams {
    let mut params = QueryParams::new();
    for (key, value) in template {
        match value {
            QueryValue::One(v) if v.starts_with(':') => {
                if let Some(copied) = actual.get(&v[1..]) {
                    params.insert(key.clone(), copied.clone());
                }
            }
            other => {
                params.insert(key.clone(), other.clone());
            }
        }
    }
    params
}

/// Flattens a relative redirect's tree into one segment run.
///
/// A relative redirect must resolve to a single primary chain; named
/// outlets anywhere in it are a configuration error.
pub(crate) fn linearize_segments(tree: &UrlTree, redirect_to: &str) -> Result<Vec<UrlSegment>, RecognizeError> {
    let mut segments = Vec::new();
    let mut current = &tree.root;
    loop {
        segments.extend(current.segments.iter().cloned());
        if !current.has_children() {
            return Ok(segments);
        }
        if current.number_of_children() > 1 || current.primary_child().is_none() {
            return Err(RecognizeError::NamedOutletsInRelativeRedirect {
                redirect_to: redirect_to.to_owned(),
            });
        }
        current = current.primary_child().unwrap();
    }
}
