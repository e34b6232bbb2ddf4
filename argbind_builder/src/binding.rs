use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::env;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::HandlerRegistry;
use crate::model::{ArgumentValues, DefaultFactory, TypeSpec};
use crate::reflect::Reflect;
use crate::runtime::tokens::parse_arguments_manually;
use crate::runtime::{ClapRuntime, MemoryRuntime, ParsedArguments, Runtime};
use crate::tree::algebra::{
    consolidate, get_path, ignore_parameters, merge_choices, merge_parameter_trees, prefix_parameter,
    set_defaults,
};
use crate::tree::Parameter;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// A user hook contributing parameters before parsing; see [`Binding::before_parse`].
pub type BeforeParse =
    Arc<dyn Fn(&Parameter, &dyn Runtime, &ArgumentValues) -> Result<Option<Parameter>, Error> + Send + Sync>;

/// A user hook post-processing the bound result; see [`Binding::after_parse`].
pub type AfterParse = Arc<dyn Fn(&Parameter, &ArgumentValues, Value) -> Result<Value, Error> + Send + Sync>;

/// Binds a parameter tree to a runtime: registers its arguments, then turns parsed arguments back into a value.
///
/// ### Example
/// ```ignore
/// let binding = Binding::of::<Config>()?.prefix("config");
/// let mut runtime = ClapRuntime::new("program");
/// binding.register(&mut runtime, &tokens)?;
/// let parsed = runtime.parse_from(&tokens)?;
/// let config: Config = binding.bind_as(&parsed)?;
/// ```
#[derive(Clone)]
pub struct Binding {
    parameters: Parameter,
    registry: Arc<HandlerRegistry>,
    prefix: Option<String>,
    defaults: BTreeMap<String, Value>,
    ignore: BTreeSet<String>,
    soft_defaults: bool,
    before_parse: Vec<BeforeParse>,
    after_parse: Vec<AfterParse>,
}

impl Binding {
    /// Bind an explicit parameter tree.
    pub fn new(parameters: Parameter) -> Self {
        Self {
            parameters,
            registry: Arc::new(HandlerRegistry::default()),
            prefix: None,
            defaults: BTreeMap::default(),
            ignore: BTreeSet::default(),
            soft_defaults: false,
            before_parse: Vec::default(),
            after_parse: Vec::default(),
        }
    }

    /// Bind the reflected parameter tree of `T`.
    pub fn of<T: Reflect>() -> Result<Self, Error> {
        Ok(Self::new(Parameter::of::<T>()?))
    }

    /// Use a different handler chain.
    pub fn registry(mut self, registry: Arc<HandlerRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Nest every parameter under the dot separated `prefix` (ex: `data` turns `--x` into `--data-x`).
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Override the default of the parameter at the dot separated `path` (relative to the prefix).
    pub fn default_value(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(path.into(), value.into());
        self
    }

    /// Exclude the parameter at the dot separated `path` (relative to the prefix), along with its descendants.
    ///
    /// Ignored parameters are neither registered nor bound; supply them with [`Binding::bind_with`].
    pub fn ignore(mut self, path: impl Into<String>) -> Self {
        self.ignore.insert(path.into());
        self
    }

    /// Let later defaults silently replace conflicting earlier ones.
    pub fn soft_defaults(mut self, soft_defaults: bool) -> Self {
        self.soft_defaults = soft_defaults;
        self
    }

    /// Contribute parameters before parsing, based on the parameters and arguments known so far.
    /// Invoked on every registration pass; returning an already registered parameter is harmless.
    pub fn before_parse(
        mut self,
        hook: impl Fn(&Parameter, &dyn Runtime, &ArgumentValues) -> Result<Option<Parameter>, Error>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.before_parse.push(Arc::new(hook));
        self
    }

    /// Post-process the bound result, before the prefix is stripped.
    pub fn after_parse(
        mut self,
        hook: impl Fn(&Parameter, &ArgumentValues, Value) -> Result<Value, Error> + Send + Sync + 'static,
    ) -> Self {
        self.after_parse.push(Arc::new(hook));
        self
    }

    /// The parameter tree being bound.
    pub fn parameters(&self) -> &Parameter {
        &self.parameters
    }

    fn absolute(&self, path: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}.{path}"),
            None => path.to_string(),
        }
    }

    fn ignored(&self) -> BTreeSet<String> {
        self.ignore.iter().map(|path| self.absolute(path)).collect()
    }

    // Prefix, normalize and apply the configured and runtime defaults.
    fn prepare(&self, runtime: &dyn Runtime) -> Result<Parameter, Error> {
        let parameters = match &self.prefix {
            Some(prefix) => prefix_parameter(self.parameters.clone(), prefix, Some(TypeSpec::Mapping)),
            None => self.parameters.clone(),
        };
        let parameters = self
            .registry
            .preprocess(&parameters)
            .unwrap_or_else(Parameter::root);
        let defaults: BTreeMap<String, Value> = self
            .defaults
            .iter()
            .map(|(path, value)| (self.absolute(path), value.clone()))
            .collect();
        let parameters = set_defaults(&parameters, &defaults)?;
        let ignored = self.ignored();
        let parameters = read_runtime_defaults(&parameters, runtime, &ignored, self.soft_defaults)?;

        Ok(ignore_parameters(&parameters, &ignored).unwrap_or_else(Parameter::root))
    }

    /// Register the arguments of the tree with the runtime.
    ///
    /// The `tokens` (excluding the program name) are scanned for values that select additional parameters, such as
    /// the member of a tagged union.
    /// Registration repeats until no new parameters appear.
    pub fn register(&self, runtime: &mut dyn Runtime, tokens: &[&str]) -> Result<(), Error> {
        let parameters = self.prepare(runtime)?;
        let stash = match runtime.parameters() {
            Some(existing) => consolidate(
                &merge_parameter_trees([existing.clone(), parameters.clone()]),
                self.soft_defaults,
            )?,
            None => parameters.clone(),
        };
        runtime.set_parameters(stash);

        for parameter in parameters.enumerate_parameters() {
            if parameter.name().is_some() {
                self.registry.add_parameter(&parameter, runtime)?;
            }
        }

        let ignored = self.ignored();
        let mut values = parse_arguments_manually(tokens, leaf_defaults(&parameters));

        loop {
            let current = runtime.parameters().cloned().unwrap_or_else(Parameter::root);
            let mut contributed = self.registry.before_parse(&current, runtime, &values)?;

            for hook in &self.before_parse {
                if let Some(parameter) = hook(&current, &*runtime, &values)? {
                    contributed.push(parameter);
                }
            }

            if contributed.is_empty() {
                break;
            }

            let Some(contributed) = self.registry.preprocess(&merge_parameter_trees(contributed)) else {
                break;
            };

            let known: HashSet<String> = current
                .enumerate_parameters()
                .filter_map(|p| p.full_name())
                .collect();
            let merged = consolidate(
                &merge_parameter_trees([current, contributed]),
                self.soft_defaults,
            )?;
            let merged = ignore_parameters(&merged, &ignored).unwrap_or_else(Parameter::root);
            let mut fresh = 0;

            for parameter in merged.enumerate_parameters() {
                match parameter.full_name() {
                    Some(full_name) if !known.contains(&full_name) => {
                        self.registry.add_parameter(&parameter, runtime)?;
                        fresh += 1;
                    }
                    _ => {}
                }
            }

            #[cfg(feature = "tracing_debug")]
            {
                debug!("Registration pass added {fresh} parameters.");
            }

            values = parse_arguments_manually(tokens, leaf_defaults(&merged));
            runtime.set_parameters(merged);

            if fresh == 0 {
                break;
            }
        }

        Ok(())
    }

    /// Bind the parsed arguments to a value shaped like the tree (under the prefix, if any).
    pub fn bind(&self, parsed: &ParsedArguments) -> Result<Value, Error> {
        self.bind_with(parsed, Map::default())
    }

    /// Bind the parsed arguments, adding (or replacing) top level entries with `supplied` values.
    pub fn bind_with(&self, parsed: &ParsedArguments, supplied: Map<String, Value>) -> Result<Value, Error> {
        let parameters = match parsed.parameters() {
            Some(parameters) => parameters.clone(),
            None => self.prepare(&MemoryRuntime::new())?,
        };
        let parameters = ignore_parameters(&parameters, &self.ignored()).unwrap_or_else(Parameter::root);
        let values = parsed.values();

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Binding {} arguments (prefix {:?}).", values.len(), self.prefix);
        }

        let bound = self.registry.bind(&parameters, parsed)?;
        let bound = self.registry.after_parse(&parameters, values, bound)?;
        let bound = self
            .after_parse
            .iter()
            .try_fold(bound, |bound, hook| hook(&parameters, values, bound))?;
        let mut bound = match &self.prefix {
            Some(prefix) => get_path(&bound, prefix)?.clone(),
            None => bound,
        };

        if let Value::Object(object) = &mut bound {
            object.extend(supplied);
        }

        Ok(bound)
    }

    /// Bind the parsed arguments and deserialize them into `T`.
    pub fn bind_as<T: DeserializeOwned>(&self, parsed: &ParsedArguments) -> Result<T, Error> {
        Ok(serde_json::from_value(self.bind(parsed)?)?)
    }

    /// Register, parse and bind in one go, using a [`ClapRuntime`] named `program`.
    pub fn parse_tokens<T: DeserializeOwned>(&self, program: &str, tokens: &[&str]) -> Result<T, Error> {
        let mut runtime = ClapRuntime::new(program);
        self.register(&mut runtime, tokens)?;
        let parsed = runtime.parse_from(tokens)?;
        self.bind_as(&parsed)
    }

    /// Register, parse and bind the process arguments.
    ///
    /// On error (including `--help`) the message is printed and the process exits.
    pub fn parse<T: DeserializeOwned>(&self) -> T {
        let mut arguments = env::args();
        let program = arguments.next().unwrap_or_default();
        let tokens: Vec<String> = arguments.collect();
        let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();

        match self.parse_tokens(&program, &tokens) {
            Ok(value) => value,
            Err(Error::Cli(error)) => error.exit(),
            Err(error) => {
                eprintln!("{error}");
                std::process::exit(error.exit_code());
            }
        }
    }
}

// The defaults of every leaf, keyed by argument name.
fn leaf_defaults(parameters: &Parameter) -> ArgumentValues {
    parameters
        .enumerate_parameters()
        .filter(|p| p.is_leaf())
        .filter_map(|p| Some((p.argument_name()?, p.default()?)))
        .collect()
}

/// Reconcile a tree with the arguments a runtime already has.
///
/// For every leaf whose argument is already registered:
/// * a default that differs from the existing optional argument's default is a [`Error::DefaultConflict`], unless
///   `soft_defaults`;
/// * a type that cannot be stored by the existing argument is a [`Error::TypeConflict`];
/// * a leaf without a default takes the existing optional argument's default;
/// * the choices are intersected.
pub fn read_runtime_defaults(
    parameters: &Parameter,
    runtime: &dyn Runtime,
    ignore: &BTreeSet<String>,
    soft_defaults: bool,
) -> Result<Parameter, Error> {
    let result = parameters.walk(|node, children| {
        let rebuilt = node.rebuild(children);
        let ignored = node
            .full_name()
            .map_or(false, |full_name| ignore.contains(&full_name));

        if ignored || !rebuilt.is_leaf() {
            return Ok(Some(rebuilt));
        }

        let (Some(type_spec), Some(argument_name)) = (rebuilt.type_spec(), node.argument_name()) else {
            return Ok(Some(rebuilt));
        };

        let Some(existing) = runtime.find_argument(&argument_name) else {
            return Ok(Some(rebuilt));
        };

        let default = rebuilt.default();

        if let Some(default) = &default {
            if !existing.required() && existing.default() != Some(default) && !soft_defaults {
                return Err(Error::DefaultConflict {
                    name: argument_name,
                    left: existing
                        .default()
                        .map_or_else(|| "none".to_string(), Value::to_string),
                    right: default.to_string(),
                });
            }
        }

        if !type_spec.is_compatible(existing.argument_type()) {
            return Err(Error::TypeConflict {
                name: argument_name,
                left: existing.argument_type().to_string(),
                right: type_spec.to_string(),
            });
        }

        let default_factory = match (default, existing.required()) {
            (None, false) => existing.default().cloned().map(DefaultFactory::constant),
            _ => rebuilt.default_factory().cloned(),
        };
        let choices = merge_choices(existing.choices(), rebuilt.choices());

        Ok(Some(rebuilt.with_default(default_factory).with_choices(choices)))
    })?;

    Ok(result.unwrap_or_else(Parameter::root))
}
