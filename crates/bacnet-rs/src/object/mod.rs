// crates/bacnet-rs/src/object/mod.rs
//! The object/property model (§4.4): object types, properties, the commandable
//! Priority_Array algorithm, a small set of concrete object implementations, and the
//! per-device object registry that the service layer (§4.5) dispatches against.

pub mod analog;
pub mod binary;
pub mod device;
pub mod error;
pub mod priority_array;
pub mod property;
pub mod registry;
pub mod value;

pub use error::{ErrorClass, ErrorCode};
pub use priority_array::PriorityArray;
pub use property::{ObjectType, PropertyIdentifier};
pub use registry::{BacnetObject, ObjectRegistry};
pub use value::PropertyValue;
