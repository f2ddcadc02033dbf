//! Command-based tree editor: builds a new [`UrlTree`] from navigation
//! commands applied at a position in an existing tree.
//!
//! Commands are path fragments (`"team/33"`, `".."`), matrix-parameter
//! objects attaching to the preceding literal, or a per-outlet map applied
//! as the final command. A leading `/` in the first fragment makes the
//! navigation absolute; `".."` fragments walk up the anchor's ancestors.

use indexmap::IndexMap;

use crate::error::CreateTreeError;
use crate::recognize::SnapshotNode;
use crate::tree::{canonicalize_root, Params, QueryParams, UrlSegment, UrlSegmentGroup, UrlTree, PRIMARY_OUTLET};

/// One navigation command.
#[derive(Clone, Debug, PartialEq)]
pub enum UrlCommand {
    /// A literal path fragment; may contain several `/`-separated parts,
    /// including leading `/` (absolute) or `..` (up one level).
    Path(String),
    /// Matrix parameters for the preceding path part.
    Matrix(Params),
    /// Commands per outlet; a `None` value clears that outlet.
    Outlets(IndexMap<String, Option<Vec<UrlCommand>>>),
}

impl From<&str> for UrlCommand {
    fn from(path: &str) -> UrlCommand {
        UrlCommand::Path(path.to_owned())
    }
}

impl From<String> for UrlCommand {
    fn from(path: String) -> UrlCommand {
        UrlCommand::Path(path)
    }
}

/// A position within a [`UrlTree`]: the anchored group plus the non-owning
/// chain of its ancestors, walked upward when resolving `..` commands.
#[derive(Clone, Debug)]
pub struct UrlPosition<'t> {
    chain: Vec<&'t UrlSegmentGroup>,
}

impl<'t> UrlPosition<'t> {
    /// Anchors at the root of a tree.
    pub fn root(tree: &'t UrlTree) -> UrlPosition<'t> {
        UrlPosition { chain: vec![&tree.root] }
    }

    /// Descends into a child outlet.
    pub fn child(mut self, outlet: &str) -> Option<UrlPosition<'t>> {
        let target = *self.chain.last().unwrap();
        let child = target.children.get(outlet)?;
        self.chain.push(child);
        Some(self)
    }

    /// Descends along a chain of outlet names.
    pub fn descend(self, outlets: &[&str]) -> Option<UrlPosition<'t>> {
        outlets.iter().try_fold(self, |position, outlet| position.child(outlet))
    }

    fn target(&self) -> &'t UrlSegmentGroup {
        *self.chain.last().unwrap()
    }
}

/// Builds a new tree by applying `commands` at `relative_to`.
///
/// An absolute navigation (or an empty command list) only needs the tree;
/// a relative navigation without an anchor fails with
/// [`CreateTreeError::InvalidNavigationTarget`].
///
/// ```
/// use urltree::{create_url_tree, parse_url, UrlCommand, UrlPosition};
///
/// let tree = parse_url("/team/33/user/11").unwrap();
/// let anchor = UrlPosition::root(&tree).child("primary").unwrap();
/// let new_tree = create_url_tree(
///     &tree,
///     Some(&anchor),
///     &[UrlCommand::from("/team/44")],
///     Default::default(),
///     None,
/// )
/// .unwrap();
/// assert_eq!(new_tree.to_string(), "/team/44");
/// ```
pub fn create_url_tree(
    tree: &UrlTree,
    relative_to: Option<&UrlPosition<'_>>,
    commands: &[UrlCommand],
    query_params: QueryParams,
    fragment: Option<String>,
) -> Result<UrlTree, CreateTreeError> {
    let root = &tree.root;
    if commands.is_empty() {
        return Ok(finish(root, root, root.clone(), query_params, fragment));
    }
    let navigation = compute_navigation(commands)?;
    if navigation.to_root {
        return Ok(finish(root, root, UrlSegmentGroup::default(), query_params, fragment));
    }
    let position = find_starting_position(&navigation, root, relative_to)?;
    let new_group = if position.process_children {
        update_segment_group_children(Some(position.group), position.index, &navigation.commands)
    } else {
        update_segment_group(Some(position.group), position.index, &navigation.commands)
    };
    Ok(finish(root, position.group, new_group, query_params, fragment))
}

/// Rebuilds the canonical tree for a recognized state, optionally applying
/// further commands from the root.
pub fn create_url_tree_from_snapshot(
    root: &SnapshotNode<'_>,
    commands: &[UrlCommand],
    query_params: QueryParams,
    fragment: Option<String>,
) -> Result<UrlTree, CreateTreeError> {
    let tree = UrlTree {
        root: group_from_snapshot(root),
        query_params,
        fragment,
    };
    let query_params = tree.query_params.clone();
    let fragment = tree.fragment.clone();
    let anchor = UrlPosition::root(&tree);
    create_url_tree(&tree, Some(&anchor), commands, query_params, fragment)
}

/// Reconstructs the segment-group tree mirrored by a snapshot tree.
pub(crate) fn group_from_snapshot(node: &SnapshotNode<'_>) -> UrlSegmentGroup {
    let mut children = IndexMap::new();
    for child in &node.children {
        children.insert(child.value.outlet.clone(), group_from_snapshot(child));
    }
    UrlSegmentGroup::new(node.value.url.clone(), children)
}

struct Navigation {
    is_absolute: bool,
    to_root: bool,
    double_dots: usize,
    commands: Vec<UrlCommand>,
}

fn compute_navigation(commands: &[UrlCommand]) -> Result<Navigation, CreateTreeError> {
    if commands.len() == 1 && commands[0] == UrlCommand::Path("/".to_owned()) {
        return Ok(Navigation {
            is_absolute: true,
            to_root: true,
            double_dots: 0,
            commands: Vec::new(),
        });
    }
    let mut is_absolute = false;
    let mut double_dots = 0;
    let mut normalized: Vec<UrlCommand> = Vec::new();
    for (idx, command) in commands.iter().enumerate() {
        match command {
            UrlCommand::Path(fragment) if idx == 0 => {
                for (part_idx, part) in fragment.split('/').enumerate() {
                    if part_idx == 0 && part == "." {
                        // current level, nothing to do
                    } else if part_idx == 0 && part.is_empty() {
                        is_absolute = true;
                    } else if part == ".." {
                        double_dots += 1;
                    } else if !part.is_empty() {
                        normalized.push(UrlCommand::Path(part.to_owned()));
                    }
                }
            }
            other => normalized.push(other.clone()),
        }
    }
    if is_absolute && matches!(normalized.first(), Some(UrlCommand::Matrix(_))) {
        return Err(CreateTreeError::RootSegmentMatrixParams);
    }
    if let Some(idx) = normalized.iter().position(|c| matches!(c, UrlCommand::Outlets(_))) {
        if idx != normalized.len() - 1 {
            return Err(CreateTreeError::MisplacedOutletsCommand);
        }
    }
    Ok(Navigation {
        is_absolute,
        to_root: false,
        double_dots,
        commands: normalized,
    })
}

struct Position<'t> {
    group: &'t UrlSegmentGroup,
    process_children: bool,
    index: usize,
}

fn find_starting_position<'t>(
    navigation: &Navigation,
    root: &'t UrlSegmentGroup,
    relative_to: Option<&UrlPosition<'t>>,
) -> Result<Position<'t>, CreateTreeError> {
    if navigation.is_absolute {
        return Ok(Position {
            group: root,
            process_children: true,
            index: 0,
        });
    }
    let anchor = relative_to.ok_or(CreateTreeError::InvalidNavigationTarget)?;
    let modifier = if matches!(navigation.commands.first(), Some(UrlCommand::Matrix(_))) {
        0
    } else {
        1
    };
    let available = anchor.target().segments.len() as isize - 1 + modifier;
    apply_double_dots(anchor, available, navigation.double_dots as isize)
}

/// Walks `..` up the anchor's ancestor chain. Each level offers its own
/// segments to the counter; exhausting a level exactly lands at the start
/// of the parent group, and exhausting the chain itself is fatal.
fn apply_double_dots<'t>(
    anchor: &UrlPosition<'t>,
    available: isize,
    double_dots: isize,
) -> Result<Position<'t>, CreateTreeError> {
    let mut level = anchor.chain.len() - 1;
    let mut available = available;
    let mut remaining = double_dots;
    loop {
        if remaining < available || (remaining == 0 && available == 0) {
            return Ok(Position {
                group: anchor.chain[level],
                process_children: false,
                index: (available - remaining).max(0) as usize,
            });
        }
        remaining -= available.max(0);
        if level == 0 {
            return Err(CreateTreeError::InvalidDoubleDots);
        }
        level -= 1;
        if remaining == 0 {
            return Ok(Position {
                group: anchor.chain[level],
                process_children: false,
                index: 0,
            });
        }
        available = anchor.chain[level].segments.len() as isize;
    }
}

fn finish(
    root: &UrlSegmentGroup,
    old_group: &UrlSegmentGroup,
    new_group: UrlSegmentGroup,
    query_params: QueryParams,
    fragment: Option<String>,
) -> UrlTree {
    let candidate = if std::ptr::eq(root, old_group) {
        new_group
    } else {
        replace_segment(root, old_group, &new_group)
    };
    UrlTree {
        root: canonicalize_root(candidate),
        query_params,
        fragment,
    }
}

/// Rebuilds `current` with `old_group` (located by identity) swapped for
/// `new_group`; untouched siblings are carried over as-is.
fn replace_segment(
    current: &UrlSegmentGroup,
    old_group: &UrlSegmentGroup,
    new_group: &UrlSegmentGroup,
) -> UrlSegmentGroup {
    let mut children = IndexMap::new();
    for (outlet, child) in &current.children {
        if std::ptr::eq(child, old_group) {
            children.insert(outlet.clone(), new_group.clone());
        } else {
            children.insert(outlet.clone(), replace_segment(child, old_group, new_group));
        }
    }
    UrlSegmentGroup::new(current.segments.clone(), children)
}

fn get_outlets(commands: &[UrlCommand]) -> IndexMap<String, Option<Vec<UrlCommand>>> {
    if let Some(UrlCommand::Outlets(map)) = commands.first() {
        return map.clone();
    }
    let mut outlets = IndexMap::new();
    outlets.insert(PRIMARY_OUTLET.to_owned(), Some(commands.to_vec()));
    outlets
}

fn update_segment_group(
    group: Option<&UrlSegmentGroup>,
    start_index: usize,
    commands: &[UrlCommand],
) -> UrlSegmentGroup {
    let empty = UrlSegmentGroup::default();
    let group = group.unwrap_or(&empty);
    if group.segments.is_empty() && group.has_children() {
        return update_segment_group_children(Some(group), start_index, commands);
    }
    let prefix = prefixed_with(group, start_index, commands);
    let sliced = &commands[prefix.command_index..];
    if prefix.matched && prefix.path_index < group.segments.len() {
        let mut rebased = UrlSegmentGroup::new(group.segments[..prefix.path_index].to_vec(), IndexMap::new());
        rebased.children.insert(
            PRIMARY_OUTLET.to_owned(),
            UrlSegmentGroup::new(group.segments[prefix.path_index..].to_vec(), group.children.clone()),
        );
        update_segment_group_children(Some(&rebased), 0, sliced)
    } else if prefix.matched && sliced.is_empty() {
        UrlSegmentGroup::new(group.segments.clone(), IndexMap::new())
    } else if prefix.matched && !group.has_children() {
        create_new_segment_group(group, start_index, commands)
    } else if prefix.matched {
        update_segment_group_children(Some(group), 0, sliced)
    } else {
        create_new_segment_group(group, start_index, commands)
    }
}

fn update_segment_group_children(
    group: Option<&UrlSegmentGroup>,
    start_index: usize,
    commands: &[UrlCommand],
) -> UrlSegmentGroup {
    let empty = UrlSegmentGroup::default();
    let group = group.unwrap_or(&empty);
    if commands.is_empty() {
        return UrlSegmentGroup::new(group.segments.clone(), IndexMap::new());
    }
    let outlets = get_outlets(commands);
    // Commands addressing named outlets apply inside a lone empty-path
    // primary child rather than at this level.
    if outlets.keys().any(|outlet| outlet != PRIMARY_OUTLET)
        && group.number_of_children() == 1
        && group.primary_child().is_some_and(|child| child.segments.is_empty())
    {
        let inner = update_segment_group_children(group.primary_child(), start_index, commands);
        return UrlSegmentGroup::new(group.segments.clone(), inner.children);
    }
    let mut children = IndexMap::new();
    for (outlet, outlet_commands) in &outlets {
        if let Some(outlet_commands) = outlet_commands {
            children.insert(
                outlet.clone(),
                update_segment_group(group.children.get(outlet), start_index, outlet_commands),
            );
        }
    }
    for (outlet, child) in &group.children {
        if !outlets.contains_key(outlet) {
            children.insert(outlet.clone(), child.clone());
        }
    }
    UrlSegmentGroup::new(group.segments.clone(), children)
}

struct Prefix {
    matched: bool,
    path_index: usize,
    command_index: usize,
}

/// Consumes the run of commands that literally matches the group's
/// existing segments starting at `start_index`.
fn prefixed_with(group: &UrlSegmentGroup, start_index: usize, commands: &[UrlCommand]) -> Prefix {
    const NO_MATCH: Prefix = Prefix {
        matched: false,
        path_index: 0,
        command_index: 0,
    };
    let mut command_index = 0;
    let mut path_index = start_index;
    while path_index < group.segments.len() {
        if command_index >= commands.len() {
            return NO_MATCH;
        }
        let segment = &group.segments[path_index];
        let path = match &commands[command_index] {
            UrlCommand::Outlets(_) => break,
            UrlCommand::Path(path) => path,
            UrlCommand::Matrix(_) => return NO_MATCH,
        };
        if let Some(UrlCommand::Matrix(params)) = commands.get(command_index + 1) {
            if !compare(path, params, segment) {
                return NO_MATCH;
            }
            command_index += 2;
        } else {
            if !compare(path, &Params::new(), segment) {
                return NO_MATCH;
            }
            command_index += 1;
        }
        path_index += 1;
    }
    Prefix {
        matched: true,
        path_index,
        command_index,
    }
}

fn compare(path: &str, params: &Params, segment: &UrlSegment) -> bool {
    path == segment.path && *params == segment.parameters
}

fn create_new_segment_group(
    group: &UrlSegmentGroup,
    start_index: usize,
    commands: &[UrlCommand],
) -> UrlSegmentGroup {
    let mut paths = group.segments[..start_index.min(group.segments.len())].to_vec();
    let mut idx = 0;
    while idx < commands.len() {
        match &commands[idx] {
            UrlCommand::Outlets(outlets) => {
                return UrlSegmentGroup::new(paths, create_new_segment_children(outlets));
            }
            UrlCommand::Matrix(params) if idx == 0 => {
                // A leading matrix object re-parameterizes the segment the
                // starting position points at.
                if let Some(segment) = group.segments.get(start_index) {
                    paths.push(UrlSegment::with_parameters(segment.path.clone(), params.clone()));
                }
                idx += 1;
            }
            UrlCommand::Matrix(_) => {
                idx += 1;
            }
            UrlCommand::Path(path) => {
                if let Some(UrlCommand::Matrix(params)) = commands.get(idx + 1) {
                    paths.push(UrlSegment::with_parameters(path.clone(), params.clone()));
                    idx += 2;
                } else {
                    paths.push(UrlSegment::new(path.clone()));
                    idx += 1;
                }
            }
        }
    }
    UrlSegmentGroup::new(paths, IndexMap::new())
}

fn create_new_segment_children(
    outlets: &IndexMap<String, Option<Vec<UrlCommand>>>,
) -> IndexMap<String, UrlSegmentGroup> {
    let mut children = IndexMap::new();
    for (outlet, commands) in outlets {
        if let Some(commands) = commands {
            children.insert(
                outlet.clone(),
                create_new_segment_group(&UrlSegmentGroup::default(), 0, commands),
            );
        }
    }
    children
}
