use serde_json::Value;
use std::ops::Deref;
use std::rc::Rc;

use crate::constant::*;
use crate::model::{ArgumentType, DefaultFactory, TypeSpec};

pub(crate) mod algebra;

/// A node of the parameter tree.
///
/// Leaves become Cli arguments, aggregates (nodes with children) become records.
/// The root of a tree is unnamed.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: Option<String>,
    type_spec: Option<TypeSpec>,
    help: String,
    children: Vec<Parameter>,
    default_factory: Option<DefaultFactory>,
    choices: Option<Vec<Value>>,
    argument_type: Option<ArgumentType>,
    argument_name: Option<String>,
}

impl Parameter {
    /// A named parameter of the given type.
    pub fn new(name: impl Into<String>, type_spec: TypeSpec) -> Self {
        Self::container(Some(name.into()), Some(type_spec))
    }

    /// An unnamed mapping root.
    pub fn root() -> Self {
        Self::container(None, Some(TypeSpec::Mapping))
    }

    pub(crate) fn container(name: Option<String>, type_spec: Option<TypeSpec>) -> Self {
        Self {
            name,
            type_spec,
            help: String::default(),
            children: Vec::default(),
            default_factory: None,
            choices: None,
            argument_type: None,
            argument_name: None,
        }
    }

    /// Rename the parameter.
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Change the declared type.
    pub fn with_type(mut self, type_spec: Option<TypeSpec>) -> Self {
        self.type_spec = type_spec;
        self
    }

    /// Document the parameter.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Replace the children.
    pub fn with_children(mut self, children: Vec<Parameter>) -> Self {
        self.children = children;
        self
    }

    /// Replace the default.
    pub fn with_default(mut self, default_factory: Option<DefaultFactory>) -> Self {
        self.default_factory = default_factory;
        self
    }

    /// Replace the allowed values.
    pub fn with_choices(mut self, choices: Option<Vec<Value>>) -> Self {
        self.choices = choices;
        self
    }

    /// Replace the resolved argument type.
    pub fn with_argument_type(mut self, argument_type: Option<ArgumentType>) -> Self {
        self.argument_type = argument_type;
        self
    }

    /// Override the derived argument name.
    /// The override also becomes the base for the argument names of the descendants.
    pub fn with_argument_name(mut self, argument_name: Option<String>) -> Self {
        self.argument_name = argument_name;
        self
    }

    /// A copy of this node, but with different children.
    pub fn rebuild(&self, children: Vec<Parameter>) -> Self {
        Self {
            name: self.name.clone(),
            type_spec: self.type_spec.clone(),
            help: self.help.clone(),
            children,
            default_factory: self.default_factory.clone(),
            choices: self.choices.clone(),
            argument_type: self.argument_type,
            argument_name: self.argument_name.clone(),
        }
    }

    /// The local name; `None` for a root.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The declared type.
    pub fn type_spec(&self) -> Option<&TypeSpec> {
        self.type_spec.as_ref()
    }

    /// The documentation.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// The children.
    pub fn children(&self) -> &[Parameter] {
        &self.children
    }

    /// Whether this node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// The default producer.
    pub fn default_factory(&self) -> Option<&DefaultFactory> {
        self.default_factory.as_ref()
    }

    /// The current default value; `None` means the parameter has no default.
    pub fn default(&self) -> Option<Value> {
        self.default_factory.as_ref().map(DefaultFactory::produce)
    }

    /// The allowed values.
    pub fn choices(&self) -> Option<&[Value]> {
        self.choices.as_deref()
    }

    /// The resolved argument type.
    pub fn argument_type(&self) -> Option<ArgumentType> {
        self.argument_type
    }

    /// The explicit argument name override.
    pub fn explicit_argument_name(&self) -> Option<&str> {
        self.argument_name.as_deref()
    }

    /// Find the direct child by name.
    pub fn find(&self, name: &str) -> Option<&Parameter> {
        self.children.iter().find(|child| child.name() == Some(name))
    }

    /// Fold the tree bottom-up (post-order).
    ///
    /// The function receives each node, in the context of its path, along with the folded results of its children.
    /// Returning `None` removes the node from its parent's results.
    pub fn fold<T, E, F>(&self, mut function: F) -> Result<Option<T>, E>
    where
        F: FnMut(&ParameterWithPath<'_>, Vec<T>) -> Result<Option<T>, E>,
    {
        fold_node(ParameterWithPath::from(self), &mut function)
    }

    /// Rebuild the tree bottom-up (post-order).
    ///
    /// Returning `None` removes the node; the result is `None` when the root itself is removed.
    pub fn walk<E, F>(&self, function: F) -> Result<Option<Parameter>, E>
    where
        F: FnMut(&ParameterWithPath<'_>, Vec<Parameter>) -> Result<Option<Parameter>, E>,
    {
        self.fold(function)
    }

    /// Iterate every node, parents before their children (pre-order).
    pub fn enumerate_parameters(&self) -> Parameters<'_> {
        Parameters {
            stack: vec![ParameterWithPath::from(self)],
        }
    }
}

fn fold_node<'a, T, E, F>(node: ParameterWithPath<'a>, function: &mut F) -> Result<Option<T>, E>
where
    F: FnMut(&ParameterWithPath<'_>, Vec<T>) -> Result<Option<T>, E>,
{
    let parameter = node.parameter;
    let node = Rc::new(node);
    let mut results = Vec::with_capacity(parameter.children.len());

    for child in &parameter.children {
        let child = ParameterWithPath::new(child, Some(Rc::clone(&node)));

        if let Some(result) = fold_node(child, function)? {
            results.push(result);
        }
    }

    function(&*node, results)
}

/// A parameter in the context of its position in the tree.
#[derive(Debug, Clone)]
pub struct ParameterWithPath<'a> {
    parameter: &'a Parameter,
    parent: Option<Rc<ParameterWithPath<'a>>>,
}

impl<'a> From<&'a Parameter> for ParameterWithPath<'a> {
    fn from(parameter: &'a Parameter) -> Self {
        Self::new(parameter, None)
    }
}

impl<'a> ParameterWithPath<'a> {
    /// Place `parameter` under `parent`.
    pub fn new(parameter: &'a Parameter, parent: Option<Rc<ParameterWithPath<'a>>>) -> Self {
        Self { parameter, parent }
    }

    /// The parameter itself.
    pub fn parameter(&self) -> &'a Parameter {
        self.parameter
    }

    /// The parent context.
    pub fn parent(&self) -> Option<&Rc<ParameterWithPath<'a>>> {
        self.parent.as_ref()
    }

    /// The dot joined path of names from the root: `outer.inner.field`.
    /// Unnamed nodes do not contribute a segment.
    pub fn full_name(&self) -> Option<String> {
        let name = self.parameter.name()?;

        match self.parent.as_ref().and_then(|parent| parent.full_name()) {
            Some(parent) => Some(format!("{parent}{PATH_SEPARATOR}{name}")),
            None => Some(name.to_string()),
        }
    }

    /// The name of the Cli argument: the explicit override if set, otherwise the parent's argument name joined with
    /// the local name by `_`.
    pub fn argument_name(&self) -> Option<String> {
        if let Some(argument_name) = self.parameter.explicit_argument_name() {
            return Some(argument_name.to_string());
        }

        let name = self.parameter.name()?;

        match self.parent.as_ref().and_then(|parent| parent.argument_name()) {
            Some(parent) => Some(format!("{parent}{ARGUMENT_SEPARATOR}{name}")),
            None => Some(name.to_string()),
        }
    }

    /// The Cli flag, without the leading `--`: `outer-inner-field`.
    pub fn flag_name(&self) -> Option<String> {
        self.argument_name().map(|argument_name| flag_name(&argument_name))
    }

    /// Find the direct child by name, in the context of this path.
    pub fn find(&self, name: &str) -> Option<ParameterWithPath<'a>> {
        self.parameter
            .find(name)
            .map(|child| ParameterWithPath::new(child, Some(Rc::new(self.clone()))))
    }
}

impl<'a> Deref for ParameterWithPath<'a> {
    type Target = Parameter;

    fn deref(&self) -> &Self::Target {
        self.parameter
    }
}

/// Convert an argument name to its flag (without the leading `--`).
pub fn flag_name(argument_name: &str) -> String {
    argument_name.replace(ARGUMENT_SEPARATOR, &FLAG_SEPARATOR.to_string())
}

/// Convert a flag (with or without the leading `--`) to its argument name.
pub fn argument_name(flag: &str) -> String {
    flag.trim_start_matches(LONG_PREFIX)
        .replace(FLAG_SEPARATOR, &ARGUMENT_SEPARATOR.to_string())
}

pub(crate) fn join_path(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}{PATH_SEPARATOR}{name}"),
        None => name.to_string(),
    }
}

/// Pre-order iterator over a tree, see [`Parameter::enumerate_parameters`].
pub struct Parameters<'a> {
    stack: Vec<ParameterWithPath<'a>>,
}

impl<'a> Iterator for Parameters<'a> {
    type Item = ParameterWithPath<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let parameter = node.parameter;

        if !parameter.children.is_empty() {
            let shared = Rc::new(node.clone());

            for child in parameter.children.iter().rev() {
                self.stack
                    .push(ParameterWithPath::new(child, Some(Rc::clone(&shared))));
            }
        }

        Some(node)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rstest::rstest;
    use std::convert::Infallible;

    pub(crate) fn leaf(name: &str) -> Parameter {
        Parameter::new(name, TypeSpec::Int)
    }

    pub(crate) fn node(name: &str, children: Vec<Parameter>) -> Parameter {
        Parameter::new(name, TypeSpec::Mapping).with_children(children)
    }

    // root
    //   a
    //     b
    //       c
    //     d
    //   e
    pub(crate) fn sample() -> Parameter {
        Parameter::root().with_children(vec![
            node("a", vec![node("b", vec![leaf("c")]), leaf("d")]),
            leaf("e"),
        ])
    }

    fn full_names(parameter: &Parameter) -> Vec<Option<String>> {
        parameter
            .enumerate_parameters()
            .map(|p| p.full_name())
            .collect()
    }

    #[test]
    fn enumerate_pre_order() {
        assert_eq!(
            full_names(&sample()),
            vec![
                None,
                Some("a".to_string()),
                Some("a.b".to_string()),
                Some("a.b.c".to_string()),
                Some("a.d".to_string()),
                Some("e".to_string()),
            ]
        );
    }

    #[test]
    fn fold_post_order() {
        // Setup
        let mut visits = Vec::default();

        // Execute
        let result: Result<Option<usize>, Infallible> = sample().fold(|p, children: Vec<usize>| {
            visits.push(p.name().unwrap_or("root").to_string());
            Ok(Some(1 + children.iter().sum::<usize>()))
        });

        // Verify
        assert_matches!(result, Ok(Some(6)));
        assert_eq!(visits, vec!["c", "b", "d", "a", "e", "root"]);
    }

    #[test]
    fn walk_removes() {
        // Execute
        let result: Result<Option<Parameter>, Infallible> = sample().walk(|p, children| {
            if p.full_name().as_deref() == Some("a.b") {
                Ok(None)
            } else {
                Ok(Some(p.rebuild(children)))
            }
        });

        // Verify
        assert_matches!(result, Ok(Some(tree)) => {
            assert_eq!(
                full_names(&tree),
                vec![None, Some("a".to_string()), Some("a.d".to_string()), Some("e".to_string())]
            );
        });
    }

    #[test]
    fn walk_identity() {
        let tree = sample();
        let result: Result<Option<Parameter>, Infallible> =
            tree.walk(|p, children| Ok(Some(p.rebuild(children))));
        assert_eq!(result.ok().flatten(), Some(tree));
    }

    #[test]
    fn walk_removes_root() {
        let result: Result<Option<Parameter>, Infallible> = sample().walk(|_, _| Ok(None));
        assert_matches!(result, Ok(None));
    }

    #[rstest]
    #[case("a.b.c", Some("a_b_c"), Some("a-b-c"))]
    #[case("a.d", Some("a_d"), Some("a-d"))]
    #[case("e", Some("e"), Some("e"))]
    fn argument_names(
        #[case] full_name: &str,
        #[case] expected: Option<&str>,
        #[case] expected_flag: Option<&str>,
    ) {
        // Setup
        let tree = sample();

        // Execute
        let found = tree
            .enumerate_parameters()
            .find(|p| p.full_name().as_deref() == Some(full_name));

        // Verify
        assert_matches!(found, Some(p) => {
            assert_eq!(p.argument_name().as_deref(), expected);
            assert_eq!(p.flag_name().as_deref(), expected_flag);
        });
    }

    #[test]
    fn argument_name_override_is_inherited() {
        // Setup
        let tree = Parameter::root().with_children(vec![node(
            "a",
            vec![node("b", vec![leaf("c")]).with_argument_name(Some("x".to_string()))],
        )]);

        // Execute
        let names: Vec<Option<String>> = tree
            .enumerate_parameters()
            .map(|p| p.argument_name())
            .collect();

        // Verify
        assert_eq!(
            names,
            vec![None, Some("a".to_string()), Some("x".to_string()), Some("x_c".to_string())]
        );
    }

    #[test]
    fn root_has_no_names() {
        let root = Parameter::root();
        let path = ParameterWithPath::from(&root);
        assert_eq!(path.full_name(), None);
        assert_eq!(path.argument_name(), None);
    }

    #[test]
    fn find_child() {
        // Setup
        let tree = sample();
        let root = ParameterWithPath::from(&tree);

        // Execute
        let found = root.find("a").and_then(|a| a.find("b"));

        // Verify
        assert_matches!(found, Some(b) => {
            assert_eq!(b.full_name().as_deref(), Some("a.b"));
        });
        assert_matches!(root.find("z"), None);
    }

    #[test]
    fn default_is_fresh() {
        let parameter = leaf("a").with_default(Some(DefaultFactory::constant(3)));
        assert_eq!(parameter.default(), Some(serde_json::json!(3)));
        assert_eq!(leaf("a").default(), None);
    }

    #[rstest]
    #[case("--use-x", "use_x")]
    #[case("data-inner", "data_inner")]
    fn argument_name_of_flag(#[case] flag: &str, #[case] expected: &str) {
        assert_eq!(argument_name(flag), expected);
    }
}
