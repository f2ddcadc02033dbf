//! Recursive-descent parser for the URL wire format.
//!
//! Grammar, loosely:
//!
//! ```text
//! url      := '/'? chain? ('?' query ('&' query)*)? ('#' fragment)?
//! chain    := segment ('/' segment)* ('/' '(' outlets ')')? ('(' outlets ')')?
//! segment  := token (';' token ('=' token)?)*
//! outlets  := outlet ('//' outlet)*
//! outlet   := (name ':')? chain
//! ```
//!
//! Path and matrix tokens are runs of `[^/()?;=#]+`, query keys `[^=?&#]+`
//! and query values `[^?&#]+`, all percent-decoded.

use indexmap::IndexMap;

use crate::error::ParseError;
use crate::escape::{decode, decode_query};
use crate::tree::{Params, QueryParams, QueryValue, UrlSegment, UrlSegmentGroup, UrlTree, PRIMARY_OUTLET};

/// Parses a URL string into a [`UrlTree`].
///
/// ```
/// let tree = urltree::parse_url("/team/33;expand=true/user/11?debug=1#top").unwrap();
/// assert_eq!(tree.fragment.as_deref(), Some("top"));
/// assert_eq!(tree.to_string(), "/team/33;expand=true/user/11?debug=1#top");
/// ```
pub fn parse_url(url: &str) -> Result<UrlTree, ParseError> {
    let mut parser = UrlParser { remaining: url };
    let root = parser.parse_root()?;
    let query_params = parser.parse_query_params()?;
    let fragment = parser.parse_fragment()?;
    if !parser.remaining.is_empty() {
        return Err(ParseError::TrailingInput {
            rest: parser.remaining.to_owned(),
        });
    }
    Ok(UrlTree {
        root,
        query_params,
        fragment,
    })
}

struct UrlParser<'a> {
    remaining: &'a str,
}

impl UrlParser<'_> {
    fn parse_root(&mut self) -> Result<UrlSegmentGroup, ParseError> {
        self.consume_optional("/");
        if self.remaining.is_empty() || self.peek("?") || self.peek("#") {
            return Ok(UrlSegmentGroup::default());
        }
        Ok(UrlSegmentGroup::new(Vec::new(), self.parse_children()?))
    }

    fn parse_children(&mut self) -> Result<IndexMap<String, UrlSegmentGroup>, ParseError> {
        if self.remaining.is_empty() {
            return Ok(IndexMap::new());
        }
        self.consume_optional("/");
        let mut segments = Vec::new();
        if !self.peek("(") {
            segments.push(self.parse_segment()?);
        }
        while self.peek("/") && !self.peek("//") && !self.peek("/(") {
            self.capture("/")?;
            segments.push(self.parse_segment()?);
        }
        let mut children = IndexMap::new();
        if self.peek("/(") {
            self.capture("/")?;
            children = self.parse_parens(true)?;
        }
        let mut res = IndexMap::new();
        if self.peek("(") {
            res = self.parse_parens(false)?;
        }
        if !segments.is_empty() || !children.is_empty() {
            res.insert(PRIMARY_OUTLET.to_owned(), UrlSegmentGroup::new(segments, children));
        }
        Ok(res)
    }

    fn parse_segment(&mut self) -> Result<UrlSegment, ParseError> {
        let token = self.segment_token();
        if token.is_empty() && self.peek(";") {
            return Err(ParseError::EmptySegment {
                rest: self.remaining.to_owned(),
            });
        }
        let path = decode(&token)?;
        Ok(UrlSegment::with_parameters(path, self.parse_matrix_params()?))
    }

    fn parse_matrix_params(&mut self) -> Result<Params, ParseError> {
        let mut params = Params::new();
        while self.consume_optional(";") {
            self.parse_param(&mut params)?;
        }
        Ok(params)
    }

    fn parse_param(&mut self, params: &mut Params) -> Result<(), ParseError> {
        let key = self.segment_token();
        if key.is_empty() {
            return Ok(());
        }
        let mut value = String::new();
        if self.consume_optional("=") {
            value = self.segment_token();
        }
        params.insert(decode(&key)?, decode(&value)?);
        Ok(())
    }

    /// Parses one `(a//aux:b)` outlet group. When `allow_primary` is set an
    /// unlabeled chain lands on the primary outlet, otherwise a label is
    /// required.
    fn parse_parens(&mut self, allow_primary: bool) -> Result<IndexMap<String, UrlSegmentGroup>, ParseError> {
        let full = self.remaining.to_owned();
        let mut groups = IndexMap::new();
        self.capture("(")?;
        let mut closed = false;
        loop {
            if self.consume_optional(")") {
                closed = true;
                break;
            }
            if self.remaining.is_empty() {
                break;
            }
            let token = self.peek_segment_token();
            let outlet = match token.find(':') {
                Some(0) => {
                    return Err(ParseError::MissingOutletName {
                        rest: self.remaining.to_owned(),
                    })
                }
                Some(idx) => {
                    let name = token[..idx].to_owned();
                    self.advance(idx + 1);
                    name
                }
                None if allow_primary => PRIMARY_OUTLET.to_owned(),
                None => {
                    return Err(ParseError::MissingOutletName {
                        rest: self.remaining.to_owned(),
                    })
                }
            };
            let children = self.parse_children()?;
            let group = if children.len() == 1 && children.contains_key(PRIMARY_OUTLET) {
                children.into_values().next().unwrap()
            } else {
                UrlSegmentGroup::new(Vec::new(), children)
            };
            groups.insert(outlet, group);
            self.consume_optional("//");
        }
        if !closed {
            return Err(ParseError::UnterminatedGroup { rest: full });
        }
        Ok(groups)
    }

    fn parse_query_params(&mut self) -> Result<QueryParams, ParseError> {
        let mut params = QueryParams::new();
        if self.consume_optional("?") {
            loop {
                self.parse_query_param(&mut params)?;
                if !self.consume_optional("&") {
                    break;
                }
            }
        }
        Ok(params)
    }

    fn parse_query_param(&mut self, params: &mut QueryParams) -> Result<(), ParseError> {
        let key = self.query_key_token();
        if key.is_empty() {
            return Ok(());
        }
        let mut value = String::new();
        if self.consume_optional("=") {
            value = self.query_value_token();
        }
        let key = decode_query(&key)?;
        let value = decode_query(&value)?;
        match params.get_mut(&key) {
            Some(existing) => existing.push(value),
            None => {
                params.insert(key, QueryValue::One(value));
            }
        }
        Ok(())
    }

    fn parse_fragment(&mut self) -> Result<Option<String>, ParseError> {
        if !self.consume_optional("#") {
            return Ok(None);
        }
        let fragment = decode(self.remaining)?;
        self.remaining = "";
        Ok(Some(fragment))
    }

    // Token scanners. Each returns the raw (still encoded) token and
    // consumes it, except `peek_segment_token` which leaves the input
    // untouched so outlet labels can be split on `:` first.

    fn segment_token(&mut self) -> String {
        let token = self.peek_segment_token().to_owned();
        self.advance(token.len());
        token
    }

    fn peek_segment_token(&self) -> &str {
        let end = self
            .remaining
            .find(['/', '(', ')', '?', ';', '=', '#'])
            .unwrap_or(self.remaining.len());
        &self.remaining[..end]
    }

    fn query_key_token(&mut self) -> String {
        let end = self
            .remaining
            .find(['=', '?', '&', '#'])
            .unwrap_or(self.remaining.len());
        let token = self.remaining[..end].to_owned();
        self.advance(end);
        token
    }

    fn query_value_token(&mut self) -> String {
        let end = self
            .remaining
            .find(['?', '&', '#'])
            .unwrap_or(self.remaining.len());
        let token = self.remaining[..end].to_owned();
        self.advance(end);
        token
    }

    fn peek(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    fn consume_optional(&mut self, prefix: &str) -> bool {
        if self.peek(prefix) {
            self.advance(prefix.len());
            return true;
        }
        false
    }

    fn capture(&mut self, expected: &'static str) -> Result<(), ParseError> {
        if !self.consume_optional(expected) {
            return Err(ParseError::ExpectedToken {
                expected,
                rest: self.remaining.to_owned(),
            });
        }
        Ok(())
    }

    fn advance(&mut self, n: usize) {
        self.remaining = &self.remaining[n..];
    }
}
