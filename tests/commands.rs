use indexmap::IndexMap;

use urltree::{
    create_url_tree, create_url_tree_from_snapshot, parse_url, recognize, CreateTreeError, Route, UrlCommand,
    UrlPosition,
};

fn path(fragment: &str) -> UrlCommand {
    UrlCommand::from(fragment)
}

fn matrix(pairs: &[(&str, &str)]) -> UrlCommand {
    UrlCommand::Matrix(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

fn outlets(entries: &[(&str, Option<&[&str]>)]) -> UrlCommand {
    let mut map = IndexMap::new();
    for (outlet, commands) in entries {
        map.insert(
            outlet.to_string(),
            commands.map(|c| c.iter().map(|p| path(p)).collect()),
        );
    }
    UrlCommand::Outlets(map)
}

/// Applies commands at an anchor reached by descending outlet names and
/// asserts the serialized result.
macro_rules! navigate_tests {
    ($($name:ident {
        $($url:literal @ $anchor:expr, $commands:expr => $expected:literal),* $(,)?
    }),* $(,)?) => { $(
        #[test]
        fn $name() {
            $(
                let tree = parse_url($url).unwrap();
                let anchor_outlets: &[&str] = &$anchor;
                let anchor = UrlPosition::root(&tree)
                    .descend(anchor_outlets)
                    .unwrap_or_else(|| panic!("bad anchor for '{}'", $url));
                let commands: Vec<UrlCommand> = $commands;
                let result = create_url_tree(&tree, Some(&anchor), &commands, tree.query_params.clone(), None)
                    .unwrap_or_else(|err| panic!("navigation failed for '{}': {}", $url, err));
                assert_eq!(result.to_string(), $expected, "navigating '{}' from {:?}", $url, anchor_outlets);
            )*
        }
    )* };
}

navigate_tests! {
    appends_relative_fragments {
        "/team/33/(user/11)" @ ["primary", "primary"], vec![path("details")] => "/team/33/user/11/details",
        "/team/33" @ ["primary"], vec![path("user/11")] => "/team/33/user/11",
    },
    one_double_dot_replaces_the_last_segment {
        "/team/33/(user/11)" @ ["primary", "primary"], vec![path("../22")] => "/team/33/user/22",
    },
    two_double_dots_leave_the_anchor_group {
        "/team/33/(user/11)" @ ["primary", "primary"], vec![path("../../team/44/user/22")] => "/team/44/user/22",
    },
    absolute_navigation_ignores_the_anchor {
        "/team/33/(user/11)" @ ["primary", "primary"], vec![path("/other")] => "/other",
        "/a/b" @ ["primary"], vec![path("/x/y")] => "/x/y",
    },
    goes_to_the_root {
        "/team/33" @ ["primary"], vec![path("/")] => "/",
    },
    matrix_command_attaches_to_the_preceding_literal {
        "/team/33/(user/11)" @ ["primary", "primary"], vec![path("../22"), matrix(&[("expand", "true")])]
            => "/team/33/user/22;expand=true",
    },
    leading_matrix_command_reparameterizes_in_place {
        "/team/33/(user/11)" @ ["primary", "primary"], vec![matrix(&[("fresh", "1")])]
            => "/team/33/user/11;fresh=1",
    },
    matching_prefix_is_reused {
        "/team/33/(user/11)" @ ["primary"], vec![path("user/22")] => "/team/33/user/22",
    },
}

#[test]
fn outlets_command_fills_a_named_outlet() {
    let tree = parse_url("/team/33/user/11").unwrap();
    let anchor = UrlPosition::root(&tree);
    let commands = vec![path("/team/33"), outlets(&[("aux", Some(&["c"]))])];
    let result = create_url_tree(&tree, Some(&anchor), &commands, IndexMap::new(), None).unwrap();
    assert_eq!(result.to_string(), "/team/33/(user/11//aux:c)");
}

#[test]
fn outlets_command_clears_with_none() {
    let tree = parse_url("/team/33/(user/11//aux:c)").unwrap();
    let anchor = UrlPosition::root(&tree);
    let commands = vec![path("/team/33"), outlets(&[("aux", None)])];
    let result = create_url_tree(&tree, Some(&anchor), &commands, IndexMap::new(), None).unwrap();
    assert_eq!(result.to_string(), "/team/33/user/11");
}

#[test]
fn empty_commands_reproduce_the_canonical_tree() {
    let tree = parse_url("/team/33/(user/11//aux:c)?d=1#f").unwrap();
    let result = create_url_tree(&tree, None, &[], tree.query_params.clone(), tree.fragment.clone()).unwrap();
    assert_eq!(result.to_string(), "/team/33/(user/11//aux:c)?d=1#f");
}

#[test]
fn query_params_and_fragment_are_replaced() {
    let tree = parse_url("/a?x=1#old").unwrap();
    let anchor = UrlPosition::root(&tree);
    let mut query = IndexMap::new();
    query.insert("y".to_owned(), urltree::QueryValue::One("2".to_owned()));
    let result = create_url_tree(&tree, Some(&anchor), &[path("b")], query, Some("new".to_owned())).unwrap();
    assert_eq!(result.to_string(), "/b?y=2#new");
}

#[test]
fn too_many_double_dots_fail() {
    let tree = parse_url("/team/33/(user/11)").unwrap();
    let anchor = UrlPosition::root(&tree).descend(&["primary", "primary"]).unwrap();
    let result = create_url_tree(&tree, Some(&anchor), &[path("../../../../../x")], IndexMap::new(), None);
    assert_eq!(result.unwrap_err(), CreateTreeError::InvalidDoubleDots);
}

#[test]
fn root_segment_rejects_matrix_params() {
    let tree = parse_url("/a").unwrap();
    let anchor = UrlPosition::root(&tree);
    let result = create_url_tree(
        &tree,
        Some(&anchor),
        &[path("/"), matrix(&[("k", "v")])],
        IndexMap::new(),
        None,
    );
    assert_eq!(result.unwrap_err(), CreateTreeError::RootSegmentMatrixParams);
}

#[test]
fn outlets_command_must_be_last() {
    let tree = parse_url("/a").unwrap();
    let anchor = UrlPosition::root(&tree);
    let result = create_url_tree(
        &tree,
        Some(&anchor),
        &[outlets(&[("aux", Some(&["c"]))]), path("b")],
        IndexMap::new(),
        None,
    );
    assert_eq!(result.unwrap_err(), CreateTreeError::MisplacedOutletsCommand);
}

#[test]
fn relative_navigation_without_an_anchor_fails() {
    let tree = parse_url("/a").unwrap();
    let result = create_url_tree(&tree, None, &[path("b")], IndexMap::new(), None);
    assert_eq!(result.unwrap_err(), CreateTreeError::InvalidNavigationTarget);
}

#[test]
fn snapshot_rebuild_produces_the_canonical_tree() {
    let config = vec![Route::new("").children(vec![
        Route::new("b"),
        Route::new("c").outlet("aux"),
    ])];
    let tree = parse_url("/b(aux:c)").unwrap();
    let state = recognize(&config, &tree).unwrap();
    let rebuilt = create_url_tree_from_snapshot(&state.root, &[], tree.query_params.clone(), None).unwrap();
    assert_eq!(rebuilt.to_string(), "/b(aux:c)");
}

#[test]
fn snapshot_rebuild_applies_outlet_commands_through_empty_path_parents() {
    let config = vec![Route::new("").children(vec![
        Route::new("b"),
        Route::new("c").outlet("aux"),
    ])];
    let tree = parse_url("/b(aux:c)").unwrap();
    let state = recognize(&config, &tree).unwrap();
    let commands = vec![outlets(&[("aux", Some(&["d"]))])];
    let rebuilt = create_url_tree_from_snapshot(&state.root, &commands, IndexMap::new(), None).unwrap();
    assert_eq!(rebuilt.to_string(), "/b(aux:d)");
}
