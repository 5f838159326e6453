//! Read, edit, and re-emit Dalvik bytecode method bodies
//!
//! The interesting part of this crate is [`dex::builder`], which provides a mutable view of a
//! method body where branches refer to [labels](dex::builder::Label) rather than code offsets.
//! Instruction sizes, `goto` widths, and payload padding are all worked out lazily when the
//! method is read back out.

pub mod dex;
pub mod util;
