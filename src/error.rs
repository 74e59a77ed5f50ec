// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `Error` struct and the `ErrorKind` enum, which are
//! used to represent errors that can occur while building or querying a
//! circuit tree.

/// A macro for defining the `ErrorKind` enum, the `Display` implementation for
/// it, and the constructors for the `Error` struct.
macro_rules! ErrorKind {
    ($(
        ($kind:ident, $ctor:ident)
    ),*) => {
        /// The kind of error that occurred.
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub enum ErrorKind {
            $(
                $kind,
            )*
        }

        impl std::fmt::Display for ErrorKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$kind => write!(f, "{}", stringify!($kind)),
                    )*
                }
            }
        }

        /// Constructors for [`Error`].
        impl Error {
            $(
                #[doc = concat!(
                    "Creates a new [`Error`] with the `",
                    stringify!($kind),
                    "` kind and the given description."
                )]
                pub fn $ctor(desc: impl Into<String>) -> crate::Error {
                    Self {
                        kind: ErrorKind::$kind,
                        desc: desc.into(),
                    }
                }
            )*
        }
    };
}

ErrorKind!(
    (CircuitNotFound, circuit_not_found),
    (ConsumerRead, consumer_read),
    (GridMeterClaimed, grid_meter_claimed),
    (InvalidConfig, invalid_config),
    (MeterNotFound, meter_not_found),
    (MeterRead, meter_read),
    (MissingCapability, missing_capability)
);

impl ErrorKind {
    /// Returns true for errors that abort tree construction, as opposed to
    /// per-query read failures that the next control cycle retries.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::CircuitNotFound
                | Self::GridMeterClaimed
                | Self::InvalidConfig
                | Self::MeterNotFound
                | Self::MissingCapability
        )
    }
}

/// An error that can occur during the creation or evaluation of a
/// [CircuitTree][crate::CircuitTree].
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    desc: String,
}

impl Error {
    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the description of the error.
    pub fn desc(&self) -> &str {
        &self.desc
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.desc)
    }
}

impl std::error::Error for Error {}
