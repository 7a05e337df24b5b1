//! Plug and slot attributes, and the connected endpoints interface logic reads them through.
//!
//! Every endpoint layers two attribute sets:
//!
//! - *static* attributes, declared in the snap metadata and never modified afterwards, and
//! - *dynamic* attributes, computed by interface logic once the connection is established.
//!
//! Reads consult the static set first. Writes only ever touch the dynamic set, and are rejected
//! for any name that was statically specified.

pub use attrs::{Attrs, FromAttr, Value, copy_attributes};
pub use connection::{
    ConnRef, ConnectedEndpoint, ConnectedPlug, ConnectedSlot, ParseConnRefError, PlugRef, SlotRef,
};
pub use error::AttributeError;
pub use info::{Attrer, Declaration, PlugInfo, SlotInfo};

mod attrs;
mod connection;
mod error;
mod info;
