//! Dalvik method bodies
//!
//! ### Structure
//!
//! A method body is a register count, a code array of 16-bit code units, a list of try blocks,
//! and a stream of debug items. Two representations of it are provided:
//!
//!   - [`ImmutableMethodImplementation`] mirrors the binary layout: instructions are keyed by their
//!     code address and branch targets are relative offsets. It can be decoded from and encoded to
//!     a code array (see [`binary_format`]).
//!
//!   - [`builder::MutableMethodImplementation`] is for editing: branch targets are labels, so
//!     instructions can be inserted, removed, or replaced without fixing up offsets by hand.
//!
//! ### Editing
//!
//! ```
//! use dexasm::dex::builder::MutableMethodImplementation;
//! use dexasm::dex::{ImmutableMethodImplementation, Instruction, Opcode};
//!
//! # fn main() -> Result<(), dexasm::dex::Error> {
//! let code = [0x0e, 0x00]; // return-void
//! let method = ImmutableMethodImplementation::from_bytes(1, &code, vec![], vec![])?;
//!
//! let mut mutable = MutableMethodImplementation::from_implementation(&method)?;
//! let end = mutable.label_for_index(0)?;
//! mutable.insert_instruction(0, Instruction::Format10t { opcode: Opcode::Goto, target: end })?;
//!
//! let edited = mutable.to_immutable()?;
//! assert_eq!(edited.code_bytes()?, vec![0x28, 0x01, 0x0e, 0x00]);
//! # Ok(())
//! # }
//! ```

pub mod binary_format;
pub mod builder;
mod debug;
mod errors;
mod instruction;
mod method;
mod opcode;

pub use debug::*;
pub use errors::*;
pub use instruction::*;
pub use method::*;
pub use opcode::*;
