use crate::attrs::{Attrs, FromAttr, Value};
use crate::connection::{PlugRef, SlotRef};
use crate::error::AttributeError;

/// A plug or slot as declared in the metadata of its snap.
pub trait Declaration {
    /// The handle identifying this declaration, i.e., a [`PlugRef`] or [`SlotRef`].
    type Ref;

    fn snap(&self) -> &str;
    fn name(&self) -> &str;
    fn interface(&self) -> &str;
    /// The statically declared attributes.
    fn attrs(&self) -> &Attrs;
    /// The apps bound to this declaration.
    fn apps(&self) -> &[String];
    fn reference(&self) -> Self::Ref;
}

/// Typed read access to attributes.
pub trait Attrer {
    /// The snap owning the attributes, for diagnostics.
    fn snap(&self) -> &str;
    /// The interface the attributes belong to, for diagnostics.
    fn interface(&self) -> &str;
    /// Look up the raw value of an attribute.
    fn lookup(&self, name: &str) -> Option<&Value>;

    /// Read the attribute `name` as a `T`.
    fn attr<T: FromAttr>(&self, name: &str) -> Result<T, AttributeError> {
        decode(self.snap(), self.interface(), name, self.lookup(name))
    }
}

/// Decode an attribute that was looked up on behalf of the given snap and interface.
pub(crate) fn decode<T: FromAttr>(
    snap: &str,
    interface: &str,
    name: &str,
    value: Option<&Value>,
) -> Result<T, AttributeError> {
    let Some(value) = value else {
        return Err(AttributeError::NotFound {
            snap: snap.to_string(),
            interface: interface.to_string(),
            name: name.to_string(),
        });
    };
    T::from_attr(value).ok_or_else(|| AttributeError::TypeMismatch {
        snap: snap.to_string(),
        interface: interface.to_string(),
        name: name.to_string(),
    })
}

/// A consumption point declared by a snap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlugInfo {
    pub snap: String,
    pub name: String,
    pub interface: String,
    pub attrs: Attrs,
    pub apps: Vec<String>,
}

/// A provision point declared by a snap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotInfo {
    pub snap: String,
    pub name: String,
    pub interface: String,
    pub attrs: Attrs,
    pub apps: Vec<String>,
}

macro_rules! impl_declaration {
    ($info:ty, $reference:ident) => {
        impl $info {
            pub fn new(
                snap: impl Into<String>,
                name: impl Into<String>,
                interface: impl Into<String>,
                attrs: Attrs,
            ) -> Self {
                Self {
                    snap: snap.into(),
                    name: name.into(),
                    interface: interface.into(),
                    attrs,
                    apps: Vec::new(),
                }
            }
        }

        impl Declaration for $info {
            type Ref = $reference;

            fn snap(&self) -> &str {
                &self.snap
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn interface(&self) -> &str {
                &self.interface
            }

            fn attrs(&self) -> &Attrs {
                &self.attrs
            }

            fn apps(&self) -> &[String] {
                &self.apps
            }

            fn reference(&self) -> $reference {
                $reference {
                    snap: self.snap.clone(),
                    name: self.name.clone(),
                }
            }
        }

        impl Attrer for $info {
            fn snap(&self) -> &str {
                &self.snap
            }

            fn interface(&self) -> &str {
                &self.interface
            }

            fn lookup(&self, name: &str) -> Option<&Value> {
                self.attrs.get(name)
            }
        }
    };
}

impl_declaration!(PlugInfo, PlugRef);
impl_declaration!(SlotInfo, SlotRef);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_read_static_attrs() {
        let attrs = Attrs::from([("attr".to_string(), Value::from("value"))]);
        let plug = PlugInfo::new("consumer", "plug", "interface", attrs);

        assert_eq!(plug.attr::<String>("attr").unwrap(), "value");
        assert_eq!(
            plug.attr::<String>("unknown").unwrap_err().to_string(),
            r#"snap "consumer" does not have attribute "unknown" for interface "interface""#
        );
        assert_eq!(
            plug.attr::<i64>("attr").unwrap_err().to_string(),
            r#"snap "consumer" has interface "interface" with invalid value type for "attr" attribute"#
        );
        assert_eq!(
            plug.reference(),
            PlugRef {
                snap: "consumer".to_string(),
                name: "plug".to_string()
            }
        );
    }
}
