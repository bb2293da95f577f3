//! Error types.
//!
//! Marshal and unmarshal errors carry the path at which they happened. The
//! path is assembled while the error unwinds: every container that sees a
//! child fail prepends the child's key with [`MarshalError::within`] or
//! [`UnmarshalError::within`].

use json_bridge_pointer::{format_json_pointer, Path, PathStep, PointerError};
use thiserror::Error;

use crate::serializer::JsonKind;

fn at(path: &[PathStep]) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" at {}", format_json_pointer(path))
    }
}

/// Problems with a fixup table or with applying it to a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FixupError {
    #[error("invalid fixup entry: {0}")]
    Malformed(String),
    #[error("cannot patch {location}: {source}")]
    Unreachable {
        location: String,
        source: PointerError,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarshalErrorKind {
    #[error("circular reference")]
    CircularReference,
    #[error("can't marshall {0}")]
    NoSerializer(String),
    #[error("dangling object handle {0}")]
    DanglingReference(u64),
    #[error("{0} is not a bean")]
    NotABean(String),
    #[error("{0} has no JSON representation")]
    NonFiniteNumber(f64),
    #[error("byte array is not valid UTF-8")]
    InvalidUtf8,
    #[error("{serializer} serializer can't marshall {found}")]
    UnexpectedValue {
        serializer: &'static str,
        found: String,
    },
    #[error(transparent)]
    Fixup(#[from] FixupError),
}

/// A marshal failure and the path of the value that caused it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}{}", at(.path))]
pub struct MarshalError {
    pub kind: MarshalErrorKind,
    pub path: Path,
}

impl MarshalError {
    pub fn new(kind: MarshalErrorKind) -> Self {
        Self {
            kind,
            path: Path::new(),
        }
    }

    /// Prepends `step` to the error path.
    pub fn within(mut self, step: impl Into<PathStep>) -> Self {
        self.path.insert(0, step.into());
        self
    }

    /// The error path as a JSON Pointer.
    pub fn pointer(&self) -> String {
        format_json_pointer(&self.path)
    }
}

impl From<MarshalErrorKind> for MarshalError {
    fn from(kind: MarshalErrorKind) -> Self {
        Self::new(kind)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnmarshalErrorKind {
    #[error("no serializer found for {target} from JSON {json}")]
    NoSerializer { target: String, json: JsonKind },
    #[error("no type hint")]
    MissingHint,
    #[error("javaClass hint must be a string")]
    InvalidHint,
    #[error("class specified in hint not found: {0}")]
    UnknownHint(String),
    #[error("hint {hint} is not assignable to {target}")]
    HintMismatch { hint: String, target: String },
    #[error("can't instantiate {0}")]
    NotInstantiable(String),
    #[error("can't assign null to primitive {0}")]
    NullPrimitive(String),
    #[error("expected {expected}, found JSON {found}")]
    TypeMismatch { expected: String, found: JsonKind },
    #[error("{value} does not fit {target} without loss")]
    LossyNumber { value: String, target: String },
    #[error("{value:?} is not a valid {target}")]
    NotANumber { value: String, target: String },
    #[error("empty string is not a char")]
    EmptyChar,
    #[error("{0} missing")]
    MissingField(&'static str),
    #[error("bean {0} has no matches")]
    BeanNoMatches(String),
    #[error("{0} is not a bean")]
    NotABean(String),
    #[error("could not instantiate bean of type {0}")]
    NotConstructible(String),
    #[error("{name} is not a constant of {class}")]
    UnknownEnumConstant { class: String, name: String },
    #[error("no reference registered for objectID {0}")]
    UnknownReference(u64),
    #[error("back-reference {0} does not resolve to an earlier object")]
    UnresolvedBackReference(String),
    #[error("no candidate signature matches the arguments")]
    NoMatchingCandidate,
    #[error(transparent)]
    Fixup(#[from] FixupError),
}

/// An unmarshal failure and the path of the JSON node that caused it.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}{}", at(.path))]
pub struct UnmarshalError {
    pub kind: UnmarshalErrorKind,
    pub path: Path,
}

impl UnmarshalError {
    pub fn new(kind: UnmarshalErrorKind) -> Self {
        Self {
            kind,
            path: Path::new(),
        }
    }

    /// Prepends `step` to the error path.
    pub fn within(mut self, step: impl Into<PathStep>) -> Self {
        self.path.insert(0, step.into());
        self
    }

    /// The error path as a JSON Pointer.
    pub fn pointer(&self) -> String {
        format_json_pointer(&self.path)
    }
}

impl From<UnmarshalErrorKind> for UnmarshalError {
    fn from(kind: UnmarshalErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<FixupError> for UnmarshalError {
    fn from(err: FixupError) -> Self {
        Self::new(err.into())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("serializer {0} is already registered")]
    DuplicateSerializer(&'static str),
    #[error("class {0} is already registered")]
    DuplicateClass(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid serializer config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_is_built_outward() {
        let err = UnmarshalError::new(UnmarshalErrorKind::MissingHint)
            .within(2usize)
            .within("list")
            .within("children");
        assert_eq!(err.pointer(), "/children/list/2");
        assert_eq!(err.to_string(), "no type hint at /children/list/2");
    }

    #[test]
    fn test_root_error_has_no_location() {
        let err = MarshalError::new(MarshalErrorKind::CircularReference);
        assert_eq!(err.to_string(), "circular reference");
    }

    #[test]
    fn test_fixup_error_display() {
        let err: UnmarshalError = FixupError::Malformed("expected array".into()).into();
        assert_eq!(err.to_string(), "invalid fixup entry: expected array");
    }
}
