//! Builder module for `argbind`.
//! See [documentation root](https://docs.rs/argbind/latest/argbind/index.html) for full details.
#![deny(missing_docs)]
mod binding;
mod constant;
mod error;
mod handler;
mod model;
#[allow(missing_docs)]
pub mod prelude;
mod reflect;
mod runtime;
mod tree;

pub use binding::{read_runtime_defaults, AfterParse, BeforeParse, Binding};
pub use error::Error;
pub use handler::{
    AllArgumentsHandler, ConditionalHandler, DefaultHandler, FromStrHandler, Handler, HandlerRegistry, ListHandler,
    Preprocessed,
};
pub use model::*;
pub use reflect::{Field, FieldKind, Reflect, Schema};
pub use runtime::{Argument, ArgumentAction, ClapRuntime, MemoryRuntime, ParsedArguments, Runtime};
pub use tree::algebra::{
    consolidate, get_path, get_path_or, ignore_parameters, merge_parameter_trees, prefix_parameter, set_defaults,
    PathLookup,
};
pub use tree::{argument_name, flag_name, Parameter, ParameterWithPath, Parameters};

pub use serde_json::Value;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;
