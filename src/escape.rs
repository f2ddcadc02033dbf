//! Percent-encoding sets for the URL wire format.
//!
//! The wire format uses a deliberately loose encoding that leaves `@`, `:`,
//! `$` and `,` readable in the produced URL. Path segments additionally
//! escape `(`, `)` and `&` because those delimit outlet groups and query
//! pairs; matrix and query tokens keep `;` and `=` escaped for the same
//! reason.

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS, NON_ALPHANUMERIC};

use crate::error::ParseError;

/// Characters escaped by the common token encoder: everything except
/// alphanumerics, the unreserved marks `- _ . ! ~ * ' ( )`, and `@ : $ ,`.
const BASE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'@')
    .remove(b':')
    .remove(b'$')
    .remove(b',');

/// Path segments and matrix tokens also escape the outlet-group parens.
/// `&`, `;` and `=` are already in the base set.
const SEGMENT: &AsciiSet = &BASE.add(b'(').add(b')');

/// Query keys and values: parens stay readable, `& ; =` stay escaped.
const QUERY: &AsciiSet = BASE;

/// The fragment is the loosest production: only characters that would
/// terminate or corrupt the URL itself are escaped.
const FRAGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'<').add(b'>').add(b'`').add(b'%');

pub(crate) fn encode_segment(s: &str) -> Cow<'_, str> {
    utf8_percent_encode(s, SEGMENT).into()
}

pub(crate) fn encode_query(s: &str) -> Cow<'_, str> {
    utf8_percent_encode(s, QUERY).into()
}

pub(crate) fn encode_fragment(s: &str) -> Cow<'_, str> {
    utf8_percent_encode(s, FRAGMENT).into()
}

/// Percent-decodes a path or matrix token.
pub(crate) fn decode(s: &str) -> Result<String, ParseError> {
    match percent_decode_str(s).decode_utf8() {
        Ok(decoded) => Ok(decoded.into_owned()),
        Err(_) => Err(ParseError::InvalidEncoding { rest: s.to_owned() }),
    }
}

/// Percent-decodes a query token; `+` decodes to a space first.
pub(crate) fn decode_query(s: &str) -> Result<String, ParseError> {
    if s.contains('+') {
        decode(&s.replace('+', "%20"))
    } else {
        decode(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_keeps_conventional_marks() {
        assert_eq!(encode_segment("a@b:c$d,e"), "a@b:c$d,e");
        assert_eq!(encode_segment("a b"), "a%20b");
        assert_eq!(encode_segment("a(b)c"), "a%28b%29c");
        assert_eq!(encode_segment("a&b;c=d"), "a%26b%3Bc%3Dd");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
    }

    #[test]
    fn query_keeps_parens() {
        assert_eq!(encode_query("(x)"), "(x)");
        assert_eq!(encode_query("a&b=c"), "a%26b%3Dc");
    }

    #[test]
    fn decode_round_trip() {
        assert_eq!(decode("a%20b").unwrap(), "a b");
        assert_eq!(decode(&encode_segment("100% done")).unwrap(), "100% done");
        assert_eq!(decode_query("a+b").unwrap(), "a b");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(matches!(decode("%FF"), Err(ParseError::InvalidEncoding { .. })));
    }
}
