use urltree::{parse_url, ParseError, QueryValue, UrlTree, PRIMARY_OUTLET};

/// Parses, serializes and re-parses every URL, asserting the serialized
/// form and the structural equality of both parses.
macro_rules! round_trip_tests {
    ($($name:ident { $($url:literal => $expected:literal),* $(,)? }),* $(,)?) => { $(
        #[test]
        fn $name() {
            $(
                let tree = match parse_url($url) {
                    Ok(tree) => tree,
                    Err(err) => panic!("failed to parse '{}': {}", $url, err),
                };
                let serialized = tree.to_string();
                assert_eq!(serialized, $expected, "serialization of '{}'", $url);

                let reparsed = parse_url(&serialized)
                    .unwrap_or_else(|err| panic!("failed to re-parse '{}': {}", serialized, err));
                assert_eq!(tree, reparsed, "round trip of '{}'", $url);
                assert_eq!(reparsed.to_string(), serialized, "idempotent re-parse of '{}'", $url);
            )*
        }
    )* };
}

macro_rules! malformed_tests {
    ($($name:ident { $($url:literal => $pattern:pat),* $(,)? }),* $(,)?) => { $(
        #[test]
        fn $name() {
            $(
                match parse_url($url) {
                    Err($pattern) => {}
                    other => panic!("unexpected result for '{}': {:?}", $url, other),
                }
            )*
        }
    )* };
}

round_trip_tests! {
    plain_paths {
        "/" => "/",
        "" => "/",
        "/one" => "/one",
        "/one/two/three" => "/one/two/three",
        "one/two" => "/one/two",
    },
    matrix_params {
        "/team/33;expand=true" => "/team/33;expand=true",
        "/a;k1=v1;k2=v2/b" => "/a;k1=v1;k2=v2/b",
        "/a;flag" => "/a;flag=",
        "/a;k=v;flag=" => "/a;k=v;flag=",
    },
    query_params {
        "/one?a=1" => "/one?a=1",
        "/one?a=1&b=2" => "/one?a=1&b=2",
        "/one?a" => "/one?a=",
        "/?a=1" => "/?a=1",
        "/one?a=1&a=2&a=3" => "/one?a=1&a=2&a=3",
    },
    fragments {
        "/one#top" => "/one#top",
        "/#frag" => "/#frag",
        "/one?a=1#b" => "/one?a=1#b",
    },
    secondary_outlets {
        "/a/(b//aux:c)" => "/a/(b//aux:c)",
        "/a(aux:c)" => "/a(aux:c)",
        "/(aux:c)" => "/(aux:c)",
        "/a/(b//aux:c/d)" => "/a/(b//aux:c/d)",
        "/a/(b/(c//right:d)//aux:e)" => "/a/(b/(c//right:d)//aux:e)",
    },
    percent_encoding {
        "/a%20b" => "/a%20b",
        "/one;k=v%20w" => "/one;k=v%20w",
        "/one?q=a%26b" => "/one?q=a%26b",
        "/r%C3%A9sum%C3%A9" => "/r%C3%A9sum%C3%A9",
    },
}

malformed_tests! {
    empty_segment_with_matrix_params {
        "/;k=v" => ParseError::EmptySegment { .. },
        "/a/;k=v" => ParseError::EmptySegment { .. },
    },
    unterminated_groups {
        "/a/(b" => ParseError::UnterminatedGroup { .. },
        "/a/(b//aux:c" => ParseError::UnterminatedGroup { .. },
    },
    missing_outlet_names {
        "/(a)" => ParseError::MissingOutletName { .. },
        "/a(b)" => ParseError::MissingOutletName { .. },
        "/a(:b)" => ParseError::MissingOutletName { .. },
    },
    trailing_garbage {
        "/a)" => ParseError::TrailingInput { .. },
        "/a=b" => ParseError::TrailingInput { .. },
    },
}

#[test]
fn parses_structure() {
    let tree = parse_url("/team/33;expand=true/user/11").unwrap();
    let primary = &tree.root.children[PRIMARY_OUTLET];
    let paths: Vec<&str> = primary.segments.iter().map(|s| s.path.as_str()).collect();
    assert_eq!(paths, ["team", "33", "user", "11"]);
    assert_eq!(primary.segments[1].parameter("expand"), Some("true"));
    assert!(tree.root.segments.is_empty());
}

#[test]
fn parses_secondary_outlets_into_children() {
    let tree = parse_url("/a/(b//aux:c)").unwrap();
    let a = &tree.root.children[PRIMARY_OUTLET];
    assert_eq!(a.segments[0].path, "a");
    assert_eq!(a.children[PRIMARY_OUTLET].segments[0].path, "b");
    assert_eq!(a.children["aux"].segments[0].path, "c");
}

#[test]
fn repeated_query_keys_accumulate() {
    let tree = parse_url("/one?a=1&a=2").unwrap();
    assert_eq!(
        tree.query_params["a"],
        QueryValue::Many(vec!["1".to_owned(), "2".to_owned()])
    );

    let single = parse_url("/one?a=1").unwrap();
    assert_eq!(single.query_params["a"], QueryValue::One("1".to_owned()));
}

#[test]
fn query_key_order_is_insignificant_for_equality() {
    let left = parse_url("/one?a=1&b=2").unwrap();
    let right = parse_url("/one?b=2&a=1").unwrap();
    assert_eq!(left, right);
}

#[test]
fn plus_decodes_to_space_in_queries_only() {
    let tree = parse_url("/a+b?q=c+d").unwrap();
    assert_eq!(tree.root.children[PRIMARY_OUTLET].segments[0].path, "a+b");
    assert_eq!(tree.query_params["q"], QueryValue::One("c d".to_owned()));
}

#[test]
fn decodes_percent_escapes() {
    let tree = parse_url("/a%20b;k%3D=v%26/next?q%26=x%3D1#fr%20ag").unwrap();
    let primary = &tree.root.children[PRIMARY_OUTLET];
    assert_eq!(primary.segments[0].path, "a b");
    assert_eq!(primary.segments[0].parameter("k="), Some("v&"));
    assert_eq!(tree.query_params["q&"], QueryValue::One("x=1".to_owned()));
    assert_eq!(tree.fragment.as_deref(), Some("fr ag"));
}

#[test]
fn segments_with_colons_are_plain_paths() {
    let tree = parse_url("/a:b/c").unwrap();
    let primary = &tree.root.children[PRIMARY_OUTLET];
    assert_eq!(primary.segments[0].path, "a:b");
    assert_eq!(tree.to_string(), "/a:b/c");
}

#[test]
fn empty_tree_has_empty_root() {
    for url in ["", "/", "/?a=1", "/#f"] {
        let tree = parse_url(url).unwrap();
        assert!(tree.root.segments.is_empty(), "url '{url}'");
        assert!(!tree.root.has_children(), "url '{url}'");
    }
}

#[test]
fn display_matches_default_tree() {
    assert_eq!(UrlTree::default().to_string(), "/");
}
