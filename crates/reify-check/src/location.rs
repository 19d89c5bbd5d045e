use std::fmt;
use std::str::FromStr;

use reify_config::Mode;
use thiserror::Error;

/// Where an instrumented cast sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckLocationKind {
    /// A parameter checked on method entry.
    Entry,
    /// A return value checked on method exit.
    Exit,
    /// An explicit cast expression.
    Cast,
    /// A value stored into a field, array or collection.
    Storage,
}

/// What the cast target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckTarget {
    /// A parameterized type such as `List<String>`.
    ParameterizedType,
    /// A type variable such as `T`. Generic arrays are unwrapped to one of the two targets.
    TypeParameter,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} {value:?}")]
pub struct UnknownName {
    kind: &'static str,
    value: String,
}

impl CheckLocationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckLocationKind::Entry => "ENTRY",
            CheckLocationKind::Exit => "EXIT",
            CheckLocationKind::Cast => "CAST",
            CheckLocationKind::Storage => "STORAGE",
        }
    }
}

impl fmt::Display for CheckLocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckLocationKind {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ENTRY" => Ok(CheckLocationKind::Entry),
            "EXIT" => Ok(CheckLocationKind::Exit),
            "CAST" => Ok(CheckLocationKind::Cast),
            "STORAGE" => Ok(CheckLocationKind::Storage),
            _ => Err(UnknownName {
                kind: "check location kind",
                value: s.to_owned(),
            }),
        }
    }
}

impl CheckTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckTarget::ParameterizedType => "PARAMETERIZED_TYPE",
            CheckTarget::TypeParameter => "TYPE_PARAMETER",
        }
    }
}

impl fmt::Display for CheckTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckTarget {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PARAMETERIZED_TYPE" => Ok(CheckTarget::ParameterizedType),
            "TYPE_PARAMETER" => Ok(CheckTarget::TypeParameter),
            _ => Err(UnknownName {
                kind: "check target",
                value: s.to_owned(),
            }),
        }
    }
}

/// Whether a site of the given kind and target is verified under `mode`.
pub fn is_checked(mode: Mode, kind: CheckLocationKind, target: CheckTarget) -> bool {
    match mode {
        Mode::Full => true,
        Mode::Normal => {
            target == CheckTarget::TypeParameter
                && matches!(
                    kind,
                    CheckLocationKind::Entry | CheckLocationKind::Exit | CheckLocationKind::Storage
                )
        }
        Mode::Minimal => {
            kind == CheckLocationKind::Storage && target == CheckTarget::TypeParameter
        }
        Mode::Disabled => false,
    }
}
