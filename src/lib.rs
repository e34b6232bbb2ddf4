//! `argbind` binds nested configuration types to a flat command line.
//!
//! Describe the configuration once, as plain Rust types, and `argbind` derives the Cli from it:
//! * *Nested configuration, flat flags*:
//! a field `x` of a struct field `inner` becomes `--inner-x`.
//! The parsed flags are bound back into the nested shape and deserialized via `serde`.
//! * *Defaults as factories*:
//! every binding receives a fresh default value; mutable defaults are never shared between parses.
//! * *Tagged unions*:
//! an enum whose variants wrap records becomes a discriminant flag (`--optimizer adam`).
//! The fields of the selected variant are only registered once the discriminant is known.
//! * *Composable*:
//! several bindings (optionally under distinct prefixes) may share one runtime, and re-declaring an existing
//! argument merges with it instead of clashing.
//! * *Extensible*:
//! the handling of each family of types is a [`Handler`] in an ordered [`HandlerRegistry`].
//!
//! # Usage
//! More demos are outlined in [the source](https://github.com/sawatzkylindsey/argbind/tree/main/demos).
//!
//! via [derive Api](./derive/index.html):
//! ```no_run
#![doc = include_str!("../demos/train_model.rs")]
//! ```
//!
//! ```console
//! $ train_model --optimizer sgd --optimizer-momentum 0.5 --no-shuffle
//! Train {
//!     epochs: 10,
//!     shuffle: false,
//!     layers: [
//!         64,
//!         32,
//!     ],
//!     optimizer: Sgd(
//!         Sgd {
//!             lr: 0.01,
//!             momentum: 0.5,
//!         },
//!     ),
//!     seed: None,
//! }
//!
//! $ train_model --epochs 3
//! error: the following required arguments were not provided:
//!   --optimizer <optimizer>
//! ```
//!
//! # Parameter trees
//! Every configuration is first reflected into a [`Parameter`] tree.
//! The leaves become arguments; their full dotted paths (`inner.x`) give the argument names (`inner_x`) and flags
//! (`--inner-x`).
//! Trees may also be built by hand, and combined with [`merge_parameter_trees`], [`prefix_parameter`] and
//! [`consolidate`].
//!
//! # Binding
//! A [`Binding`] registers a tree with a [`Runtime`] (typically a [`ClapRuntime`]), and then binds the
//! [`ParsedArguments`] back into a [`Value`] shaped like the tree:
//! ```no_run
#![doc = include_str!("../demos/nested_config.rs")]
//! ```
//!
//! # Types
//! | Rust type | Cli |
//! |-----------|-----|
//! | `bool` | `--flag` / `--no-flag` (a leading `use_` is dropped from the negation) |
//! | integers, floats, `String`, `PathBuf` | `--flag VALUE` |
//! | `Vec<T>` of the above | `--flag a,b,c` |
//! | `Option<T>` | as `T`, defaulting to null |
//! | `#[argbind(from_str)] T` | `--flag VALUE`, converted with [`std::str::FromStr`] |
//! | unit enum | `--flag CHOICE` |
//! | record enum | `--flag LABEL`, followed by the selected record's flags |
//! | record | one flag per field |
pub mod derive;
pub use argbind_builder::*;
