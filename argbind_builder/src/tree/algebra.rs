use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::constant::*;
use crate::error::Error;
use crate::model::{DefaultFactory, TypeSpec};
use crate::tree::{join_path, Parameter};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// Nest a tree under the dot separated `path`.
///
/// A named tree is returned as the outermost prefix container; an unnamed root keeps its place and receives the
/// containers as its (only) child.
/// The containers are typed by `container`.
pub fn prefix_parameter(parameter: Parameter, path: &str, container: Option<TypeSpec>) -> Parameter {
    let named = parameter.name().is_some();
    let mut root = if named {
        Parameter::root().with_children(vec![parameter])
    } else {
        parameter
    };

    for segment in path
        .split(PATH_SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .rev()
    {
        let children = std::mem::take(&mut root.children);
        root.children = vec![
            Parameter::container(Some(segment.to_string()), container.clone()).with_children(children),
        ];
    }

    if named {
        root.children.pop().unwrap_or_else(Parameter::root)
    } else {
        root
    }
}

/// Concatenate the top level children of every tree under a new unnamed root.
///
/// A named tree contributes itself.
/// Duplicate names are kept; see [`consolidate`].
pub fn merge_parameter_trees(trees: impl IntoIterator<Item = Parameter>) -> Parameter {
    let mut root = Parameter::root();

    for tree in trees {
        if tree.name().is_some() {
            root.children.push(tree);
        } else {
            if tree.type_spec.is_some() {
                root.type_spec = tree.type_spec;
            }

            root.children.extend(tree.children);
        }
    }

    root
}

/// Fold same named siblings into one node, recursively.
///
/// * Types must match; a missing type yields to the other side and a tagged union yields to its selected variant.
/// * Defaults must match, unless `soft_defaults` in which case the later one wins; a missing default yields.
/// * Choices are intersected when both sides have some.
pub fn consolidate(parameter: &Parameter, soft_defaults: bool) -> Result<Parameter, Error> {
    let root = parameter.walk(|node, children| {
        let children = merge_siblings(children, node.full_name().as_deref(), soft_defaults)?;
        Ok::<_, Error>(Some(node.rebuild(children)))
    })?;

    Ok(root.unwrap_or_else(Parameter::root))
}

fn merge_siblings(
    children: Vec<Parameter>,
    parent: Option<&str>,
    soft_defaults: bool,
) -> Result<Vec<Parameter>, Error> {
    let mut merged: Vec<Parameter> = Vec::with_capacity(children.len());
    let mut positions: HashMap<String, usize> = HashMap::default();

    for child in children {
        let position = child.name().and_then(|name| positions.get(name).copied());

        match position {
            Some(position) => {
                let existing = std::mem::replace(&mut merged[position], Parameter::root());
                merged[position] = merge_pair(existing, child, parent, soft_defaults)?;
            }
            None => {
                if let Some(name) = child.name() {
                    positions.insert(name.to_string(), merged.len());
                }

                merged.push(child);
            }
        }
    }

    Ok(merged)
}

fn merge_pair(
    left: Parameter,
    right: Parameter,
    parent: Option<&str>,
    soft_defaults: bool,
) -> Result<Parameter, Error> {
    let full_name = join_path(parent, left.name().unwrap_or_default());

    #[cfg(feature = "tracing_debug")]
    {
        debug!("Consolidating '{full_name}'.");
    }

    let (refined_right, refined_left) = match (&left.type_spec, &right.type_spec) {
        (Some(l), Some(r)) => (l.is_refined_by(r), r.is_refined_by(l)),
        _ => (false, false),
    };

    if refined_right {
        return Ok(right);
    } else if refined_left {
        return Ok(left);
    }

    let type_spec = match (left.type_spec, right.type_spec) {
        (Some(l), Some(r)) if l == r => Some(l),
        (Some(l), Some(r)) => {
            return Err(Error::TypeConflict {
                name: full_name,
                left: l.to_string(),
                right: r.to_string(),
            });
        }
        (l, r) => l.or(r),
    };

    let default_factory = match (left.default_factory, right.default_factory) {
        (Some(l), Some(r)) if l == r => Some(l),
        (Some(_), Some(r)) if soft_defaults => Some(r),
        (Some(l), Some(r)) => {
            return Err(Error::DefaultConflict {
                name: full_name,
                left: l.produce().to_string(),
                right: r.produce().to_string(),
            });
        }
        (l, r) => l.or(r),
    };

    let mut children = left.children;
    children.extend(right.children);

    Ok(Parameter {
        name: left.name,
        type_spec,
        help: if right.help.is_empty() {
            left.help
        } else {
            right.help
        },
        children: merge_siblings(children, Some(&full_name), soft_defaults)?,
        default_factory,
        choices: merge_choices(left.choices.as_deref(), right.choices.as_deref()),
        argument_type: right.argument_type.or(left.argument_type),
        argument_name: right.argument_name.or(left.argument_name),
    })
}

/// Intersect two sets of choices, preserving the order of `left`.
/// An empty or missing side yields to the other.
pub(crate) fn merge_choices(left: Option<&[Value]>, right: Option<&[Value]>) -> Option<Vec<Value>> {
    match (left, right) {
        (Some(l), Some(r)) if !l.is_empty() && !r.is_empty() => {
            Some(l.iter().filter(|value| r.contains(value)).cloned().collect())
        }
        (Some(l), Some(r)) => Some(if l.is_empty() { r.to_vec() } else { l.to_vec() }),
        (l, r) => l.or(r).map(<[Value]>::to_vec),
    }
}

/// Override defaults by full name.
///
/// Every path in `defaults` must match a parameter, otherwise [`Error::UnboundDefaultReference`] lists the leftovers.
pub fn set_defaults(parameter: &Parameter, defaults: &BTreeMap<String, Value>) -> Result<Parameter, Error> {
    let mut unbound: BTreeSet<&String> = defaults.keys().collect();
    let result = parameter.walk(|node, children| {
        let mut rebuilt = node.rebuild(children);

        if let Some(full_name) = node.full_name() {
            if let Some(value) = defaults.get(&full_name) {
                unbound.remove(&full_name);
                rebuilt = rebuilt.with_default(Some(DefaultFactory::constant(value.clone())));
            }
        }

        Ok::<_, Error>(Some(rebuilt))
    })?;

    if !unbound.is_empty() {
        return Err(Error::UnboundDefaultReference(
            unbound.into_iter().cloned().collect(),
        ));
    }

    Ok(result.unwrap_or_else(Parameter::root))
}

/// Remove every parameter (and its descendants) whose full name is listed.
/// `None` when the whole tree is removed.
pub fn ignore_parameters(parameter: &Parameter, ignore: &BTreeSet<String>) -> Option<Parameter> {
    if ignore.is_empty() {
        return Some(parameter.clone());
    }

    let result: Result<Option<Parameter>, Error> = parameter.walk(|node, children| {
        match node.full_name() {
            Some(full_name) if ignore.contains(&full_name) => Ok(None),
            _ => Ok(Some(node.rebuild(children))),
        }
    });

    result.ok().flatten()
}

/// A structure navigable by dot separated paths.
pub trait PathLookup {
    /// The direct descendant named `segment`.
    fn lookup(&self, segment: &str) -> Option<&Self>;
}

impl PathLookup for Parameter {
    fn lookup(&self, segment: &str) -> Option<&Self> {
        self.find(segment)
    }
}

impl PathLookup for Value {
    fn lookup(&self, segment: &str) -> Option<&Self> {
        self.as_object().and_then(|object| object.get(segment))
    }
}

/// Navigate to the dot separated `path`; an empty path is the object itself.
pub fn get_path<'a, T: PathLookup + ?Sized>(object: &'a T, path: &str) -> Result<&'a T, Error> {
    let mut current = object;
    let mut visited: Vec<&str> = Vec::default();

    for segment in path.split(PATH_SEPARATOR).filter(|segment| !segment.is_empty()) {
        visited.push(segment);
        current = current
            .lookup(segment)
            .ok_or_else(|| Error::PathNotFound(visited.join(&PATH_SEPARATOR.to_string())))?;
    }

    Ok(current)
}

/// Navigate to the dot separated `path`, falling back to `default` when it is absent.
pub fn get_path_or<'a, T: PathLookup + ?Sized>(object: &'a T, path: &str, default: &'a T) -> &'a T {
    get_path(object, path).unwrap_or(default)
}
