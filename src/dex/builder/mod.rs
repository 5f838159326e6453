//! Editable method bodies
//!
//! [`MutableMethodImplementation`] holds a method as a list of [`Location`]s, each carrying an
//! instruction along with the labels and debug items pinned to it. Branches refer to [`Label`]s, so
//! inserting, removing, or replacing instructions never requires patching offsets. Picking actual
//! encodings is deferred to [relaxation](MutableMethodImplementation::relax), which happens
//! automatically before anything is read back out.
//!
//! [`MethodImplementationBuilder`] is a convenience on top for writing a method from top to bottom
//! with named labels.

mod convert;
mod label;
mod located_items;
mod location;
mod method_builder;
mod mutable_method;
mod relaxation;

pub use label::*;
pub use located_items::*;
pub use location::Location;
pub use method_builder::*;
pub use mutable_method::*;

use crate::dex::Instruction;

/// Instruction whose branch targets are labels
pub type BuilderInstruction = Instruction<Label>;
