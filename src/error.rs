use std::fmt;

/// Problems loading or validating a `SimConfig`.
///
/// The simulation itself has no failure paths: bad timesteps are clamped and
/// runaway entities are swept, so this is the only error type the core has.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    Io { path: String, message: String },
    Parse { message: String },
    Invalid { field: &'static str, reason: String },
    UnknownShip { name: String },
    UnknownFirePattern { name: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "cannot read config {path}: {message}"),
            Self::Parse { message } => write!(f, "malformed config: {message}"),
            Self::Invalid { field, reason } => write!(f, "invalid config field `{field}`: {reason}"),
            Self::UnknownShip { name } => {
                write!(f, "unknown ship class `{name}` (expected standard, swift or freighter)")
            }
            Self::UnknownFirePattern { name } => {
                write!(f, "unknown fire pattern `{name}` (expected forward or aimed)")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
