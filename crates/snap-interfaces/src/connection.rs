use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attrs::{Attrs, FromAttr, Value, copy_attributes};
use crate::error::AttributeError;
use crate::info::{Attrer, Declaration, PlugInfo, SlotInfo, decode};

/// A handle to a plug, e.g., `consumer:plug`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlugRef {
    pub snap: String,
    pub name: String,
}

/// A handle to a slot, e.g., `producer:slot`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotRef {
    pub snap: String,
    pub name: String,
}

impl fmt::Display for PlugRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.snap, self.name)
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.snap, self.name)
    }
}

/// A handle to a connection between a plug and a slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnRef {
    pub plug: PlugRef,
    pub slot: SlotRef,
}

impl ConnRef {
    pub fn new(plug: PlugRef, slot: SlotRef) -> Self {
        Self { plug, slot }
    }

    /// The stable identifier of the connection, e.g., `consumer:plug producer:slot`.
    pub fn id(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.plug, self.slot)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed connection identifier: `{0}`")]
pub struct ParseConnRefError(String);

impl FromStr for ConnRef {
    type Err = ParseConnRefError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseConnRefError(id.to_string());
        let (plug, slot) = id.split_once(' ').ok_or_else(malformed)?;
        let split = |part: &str| -> Result<(String, String), ParseConnRefError> {
            match part.split_once(':') {
                Some((snap, name))
                    if !snap.is_empty() && !name.is_empty() && !name.contains(':') =>
                {
                    Ok((snap.to_string(), name.to_string()))
                }
                _ => Err(malformed()),
            }
        };
        let (plug_snap, plug_name) = split(plug)?;
        let (slot_snap, slot_name) = split(slot)?;
        Ok(Self {
            plug: PlugRef {
                snap: plug_snap,
                name: plug_name,
            },
            slot: SlotRef {
                snap: slot_snap,
                name: slot_name,
            },
        })
    }
}

/// One side of an established connection: a declaration plus the dynamic attributes computed for
/// it by interface logic.
///
/// The declaration is shared and never modified; its attributes act as a read-only overlay that
/// shadows any dynamic attribute of the same name.
#[derive(Debug, Clone)]
pub struct ConnectedEndpoint<D> {
    info: Arc<D>,
    dynamic_attrs: Attrs,
}

/// The plug side of a connection.
pub type ConnectedPlug = ConnectedEndpoint<PlugInfo>;

/// The slot side of a connection.
pub type ConnectedSlot = ConnectedEndpoint<SlotInfo>;

impl<D: Declaration> ConnectedEndpoint<D> {
    /// Wrap a declaration, seeding the dynamic attributes with a deep copy of `dynamic_attrs`.
    pub fn new(info: impl Into<Arc<D>>, dynamic_attrs: &Attrs) -> Self {
        Self {
            info: info.into(),
            dynamic_attrs: copy_attributes(dynamic_attrs),
        }
    }

    /// The declaration this endpoint was established from.
    pub fn info(&self) -> &D {
        &self.info
    }

    pub fn snap(&self) -> &str {
        self.info.snap()
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn interface(&self) -> &str {
        self.info.interface()
    }

    /// The handle identifying the declaration of this endpoint.
    pub fn reference(&self) -> D::Ref {
        self.info.reference()
    }

    /// The security tags of the apps bound to this endpoint, sorted.
    pub fn security_tags(&self) -> Vec<String> {
        let mut tags: Vec<_> = self
            .info
            .apps()
            .iter()
            .map(|app| format!("snap.{}.{app}", self.info.snap()))
            .collect();
        tags.sort();
        tags
    }

    /// A deep copy of the static attributes.
    pub fn static_attrs(&self) -> Attrs {
        copy_attributes(self.info.attrs())
    }

    /// A deep copy of the dynamic attributes.
    pub fn dynamic_attrs(&self) -> Attrs {
        copy_attributes(&self.dynamic_attrs)
    }

    /// Read the static attribute `name` as a `T`, ignoring dynamic attributes.
    pub fn static_attr<T: FromAttr>(&self, name: &str) -> Result<T, AttributeError> {
        decode(
            self.info.snap(),
            self.info.interface(),
            name,
            self.info.attrs().get(name),
        )
    }

    /// Read the attribute `name` as a `T`, preferring the static over the dynamic value.
    pub fn attr<T: FromAttr>(&self, name: &str) -> Result<T, AttributeError> {
        decode(self.info.snap(), self.info.interface(), name, self.lookup(name))
    }

    /// Set the dynamic attribute `name`.
    ///
    /// Fails if `name` was statically specified, leaving both attribute sets unchanged.
    pub fn set_attr(&mut self, name: &str, value: impl Into<Value>) -> Result<(), AttributeError> {
        if self.info.attrs().contains_key(name) {
            return Err(AttributeError::Immutable {
                name: name.to_string(),
            });
        }
        self.dynamic_attrs.insert(name.to_string(), value.into());
        Ok(())
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.info
            .attrs()
            .get(name)
            .or_else(|| self.dynamic_attrs.get(name))
    }
}

impl<D: Declaration> Attrer for ConnectedEndpoint<D> {
    fn snap(&self) -> &str {
        self.info.snap()
    }

    fn interface(&self) -> &str {
        self.info.interface()
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        ConnectedEndpoint::lookup(self, name)
    }
}
