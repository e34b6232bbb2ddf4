//! Traits which, typically, may be imported without concern: `use argbind::prelude::*`.

// Needed to call `T::schema()` / `T::type_spec()`, and by the `Reflect` derive.
pub use crate::model::Typed;
pub use crate::reflect::Reflect;

// Needed to call `register` / `parse_from` on a runtime.
pub use crate::runtime::Runtime;

// Needed to implement a custom handler.
pub use crate::handler::Handler;

// Needed to look up paths in a bound value or a parameter tree.
pub use crate::tree::algebra::PathLookup;
