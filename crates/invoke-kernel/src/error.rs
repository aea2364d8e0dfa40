//! Error types for the invoke kernel
//!
//! Problems with the user's configuration are never errors here; they are
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s. These types cover the
//! infrastructure around the pipeline:
//! - Provider plugins that cannot be started
//! - Write-once node slots written twice
//! - Malformed expansion subgraphs
//! - Settings files that cannot be loaded

/// Failure obtaining a live provider client
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// No factory registered for the provider
    #[error("provider {0} is not installed")]
    NotInstalled(String),

    /// Plugin process could not be started
    #[error("provider {addr} is unavailable: {reason}")]
    Unavailable {
        /// Provider configuration address
        addr: String,
        /// Underlying cause
        reason: String,
    },

    /// Plugin started but the protocol handshake failed
    #[error("handshake with {addr} failed: {reason}")]
    Handshake {
        /// Provider configuration address
        addr: String,
        /// Underlying cause
        reason: String,
    },
}

/// A write-once node slot was written twice
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindingError {
    /// Provider already resolved
    #[error("provider for {node} already resolved to {existing}")]
    ProviderAlreadyResolved {
        /// Node name
        node: String,
        /// Binding already in place
        existing: String,
    },

    /// Schema already attached
    #[error("schema for {node} already attached")]
    SchemaAlreadyAttached {
        /// Node name
        node: String,
    },
}

/// Expansion subgraph is malformed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// The subgraph contains a cycle
    #[error("cycle detected in expansion subgraph")]
    CycleDetected,

    /// A node cannot reach the subgraph root
    #[error("node {0} does not reach the subgraph root")]
    Unrooted(String),

    /// Nodes were added but no root was
    #[error("expansion subgraph has no root")]
    MissingRoot,
}

/// Settings could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Settings file unreadable
    #[error("cannot read settings: {0}")]
    Read(#[from] std::io::Error),

    /// Settings file is not valid TOML for [`InvokeConfig`](crate::settings::InvokeConfig)
    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}
