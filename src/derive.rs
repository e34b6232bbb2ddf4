//! Derive Api for `argbind` configuration.
//!
//! ### Getting Started
//! Instrument a configuration type `S` with `#[derive(Reflect)]` (and `serde`'s `#[derive(Deserialize)]`).
//! `Binding::of::<S>()` then registers, parses and binds the Cli parameters fitting `S`.
//!
//! ```no_run
#![doc = include_str!("../demos/train_model.rs")]
//! ```
//!
//! ### Records
//! Structs with named fields are records.
//! Each field becomes a parameter named after the field; nested records nest the names.
//!
//! | Field attribute | Effect |
//! |-----------------|--------|
//! | `/// doc comment` | The help message. |
//! | `#[argbind(help = "..")]` | The help message (overrides the doc comment). |
//! | `#[argbind(default = <expr>)]` | The default, evaluated anew for every binding. String literals are converted with `Into`. |
//! | `#[argbind(default)]` | The default is `Default::default()`. |
//! | `#[argbind(from_str)]` | Convert the Cli token with `FromStr`. |
//! | `#[argbind(skip)]` | Exclude the field; supply it via [`crate::Binding::bind_with`] or `#[serde(default)]`. |
//!
//! Fields without a default are required, except `Option<T>` fields which default to null.
//!
//! A record may pull in the fields of other records with `#[argbind(forward = Base)]` (repeatable).
//! This mirrors a constructor that forwards its remaining keywords to a base.
//!
//! ### Tagged unions
//! Enums whose variants each wrap a single record are tagged unions.
//! The field holding the union becomes the discriminant, with the snake cased variant names as its choices
//! (override one with `#[argbind(label = "..")]`).
//! The selected variant's fields are flagged `--<field>-<name>`, or just `--<name>` under
//! `#[argbind(prefix = false)]`.
//! The bound value is `{label: {..}}`, which is `serde`'s externally tagged representation; pair the derive
//! with `#[serde(rename_all = "snake_case")]`.
//!
//! ### Choices
//! Enums whose variants are all units become a fixed set of snake cased choices.
//! As above, pair the derive with `#[serde(rename_all = "snake_case")]`.
pub use argbind_derive::Reflect;
