// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `Error` struct and the `ErrorKind` enum, which are
//! used to represent errors that can occur while assembling a model.

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
    (MalformedTemporalData, malformed_temporal_data),
    (DuplicateTypeRegistration, duplicate_type_registration),
    (UnknownTypeTag, unknown_type_tag),
    (UnsupportedOperation, unsupported_operation),
    (UnknownDynamicList, unknown_dynamic_list),
    (DuplicateContributor, duplicate_contributor),
    (PrematureAggregation, premature_aggregation),
    (RegistryFrozen, registry_frozen),
    (CyclicModuleDependency, cyclic_module_dependency),
    (MissingModule, missing_module),
    (NotFound, not_found),
    (DuplicateComponent, duplicate_component),
    (InvalidConfig, invalid_config),
    (InvalidState, invalid_state),
    (SolverFailure, solver_failure),
    (Internal, internal)
);

/// An error that can occur while building a model with the
/// [ModelBuilder][crate::ModelBuilder].
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
    pub fn description(&self) -> &str {
        &self.desc
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.desc)
    }
}

impl std::error::Error for Error {}
