// crates/bacnet-rs/src/service/mod.rs
//! Application-layer services (§4.5): ReadProperty, WriteProperty,
//! ReadPropertyMultiple, Who-Is/I-Am and SubscribeCOV, plus the dispatch glue
//! that drives them against an [`crate::object::ObjectRegistry`].

pub mod codec;
pub mod dispatch;
pub mod read_property;
pub mod read_property_multiple;
pub mod subscribe_cov;
pub mod who_is_i_am;
pub mod write_property;

pub use dispatch::handle_confirmed_request;
pub use read_property::{ReadPropertyAck, ReadPropertyRequest};
pub use read_property_multiple::{ReadPropertyMultipleAck, ReadPropertyMultipleRequest};
pub use subscribe_cov::SubscribeCovRequest;
pub use who_is_i_am::{IAmRequest, WhoIsRequest};
pub use write_property::WritePropertyRequest;
