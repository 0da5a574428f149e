//! Typed binary codec for remote ledger programs.
//!
//! Provides:
//! - [`Address`]: 32-byte addresses with Base58 text form
//! - [`Layout`] / [`StructLayout`] / [`UnionLayout`]: composable wire descriptors
//! - [`Value`]: the dynamic values layouts encode and decode
//! - [`Discriminator`] / [`DiscriminatorRegistry`]: 8-byte operation and account tags
//! - lossless JSON interchange (`to_json` / `from_json` on every layout)

pub mod address;
pub mod discriminator;
pub mod error;
mod json;
pub mod layout;
pub mod union;
pub mod value;

pub use address::Address;
pub use discriminator::{Discriminator, DiscriminatorRegistry};
pub use error::CodecError;
pub use layout::{Field, Layout, StructLayout};
pub use union::{UnionLayout, Variant};
pub use value::{EnumValue, StructValue, Value};
