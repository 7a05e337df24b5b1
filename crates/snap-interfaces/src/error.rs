use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error(r#"snap "{snap}" does not have attribute "{name}" for interface "{interface}""#)]
    NotFound {
        snap: String,
        interface: String,
        name: String,
    },
    #[error(
        r#"snap "{snap}" has interface "{interface}" with invalid value type for "{name}" attribute"#
    )]
    TypeMismatch {
        snap: String,
        interface: String,
        name: String,
    },
    #[error(r#"cannot change attribute "{name}" as it was statically specified in the snap details"#)]
    Immutable { name: String },
}
