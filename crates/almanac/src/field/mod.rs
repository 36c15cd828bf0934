//! Field registry: which parser handles which corpus field.
//!
//! Replaces per-field adapter functions with a data-driven table. Each
//! [`FieldSpec`] names a field, the grammar it is parsed with and, for
//! quantities, the unit it is expected to carry.
//!
//! # Example
//!
//! ```
//! use almanac::field::{FieldRegistry, FieldKind};
//!
//! let registry = FieldRegistry::builtin();
//! let value = registry
//!     .extract("Population growth rate", Some("0.67% (2024 est.)"))
//!     .unwrap();
//! assert_eq!(value.kind(), FieldKind::Quantity);
//! assert_eq!(value.as_quantity().unwrap().value, Some(0.67));
//! ```

mod registry;
mod spec;

pub use registry::{FieldRegistry, RegistryConfig};
pub use spec::{normalize_key, FieldKind, FieldSpec, FieldValue};
