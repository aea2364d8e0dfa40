//! Provider addresses
//!
//! A provider is a plugin (`registry.terraform.io/hashicorp/aws`). A provider
//! *configuration* is one configured instance of it, optionally aliased. Inside
//! a module a configuration is referenced by its local name
//! ([`LocalProviderConfig`]); once the graph walk resolves that reference it
//! becomes an [`AbsProviderConfig`].

use crate::module::Module;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Registry hostname assumed when none is given
pub const DEFAULT_REGISTRY_HOST: &str = "registry.terraform.io";

/// Namespace assumed when none is given
pub const DEFAULT_NAMESPACE: &str = "hashicorp";

/// Fully qualified provider source address
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Provider {
    /// Registry hostname
    pub hostname: String,
    /// Registry namespace
    pub namespace: String,
    /// Provider type (`aws`, `webhook`)
    pub type_name: String,
}

impl Provider {
    /// Provider in the default registry and namespace
    #[inline]
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            hostname: DEFAULT_REGISTRY_HOST.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            type_name: type_name.into(),
        }
    }

    /// Same provider under another namespace
    #[inline]
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Provider implied by an action type: the prefix before the first `_`
    ///
    /// `webhook_notify` implies `webhook`; a type without `_` implies itself.
    #[must_use]
    pub fn implied_by_action_type(action_type: &str) -> Self {
        Self::new(implied_local_name(action_type))
    }
}

impl Display for Provider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.hostname, self.namespace, self.type_name)
    }
}

fn implied_local_name(action_type: &str) -> &str {
    action_type
        .split_once('_')
        .map_or(action_type, |(prefix, _)| prefix)
}

/// Provider configuration as referenced from within a module
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LocalProviderConfig {
    /// Local name of the provider in the module's requirements
    pub local_name: String,
    /// Configuration alias, if not the default configuration
    pub alias: Option<String>,
}

impl LocalProviderConfig {
    /// Reference to a provider's default configuration
    #[inline]
    #[must_use]
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            alias: None,
        }
    }

    /// Reference to an aliased configuration
    #[inline]
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Default configuration implied by an action type
    #[must_use]
    pub fn implied_by_action_type(action_type: &str) -> Self {
        Self::new(implied_local_name(action_type))
    }
}

impl Display for LocalProviderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "provider.{}", self.local_name)?;
        if let Some(alias) = &self.alias {
            write!(f, ".{alias}")?;
        }
        Ok(())
    }
}

/// Resolved provider configuration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbsProviderConfig {
    /// Module declaring the configuration
    pub module: Module,
    /// Provider being configured
    pub provider: Provider,
    /// Configuration alias
    pub alias: Option<String>,
}

impl AbsProviderConfig {
    /// Create a resolved provider configuration address
    #[inline]
    #[must_use]
    pub fn new(module: Module, provider: Provider, alias: Option<String>) -> Self {
        Self {
            module,
            provider,
            alias,
        }
    }
}

impl Display for AbsProviderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if !self.module.is_root() {
            write!(f, "{}.", self.module)?;
        }
        write!(f, "provider[\"{}\"]", self.provider)?;
        if let Some(alias) = &self.alias {
            write!(f, ".{alias}")?;
        }
        Ok(())
    }
}

/// Either form of provider configuration address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderConfig {
    /// Unresolved, as written in the module
    Local(LocalProviderConfig),
    /// Resolved by the graph walk
    Absolute(AbsProviderConfig),
}

impl Display for ProviderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(local) => write!(f, "{local}"),
            Self::Absolute(abs) => write!(f, "{abs}"),
        }
    }
}

impl From<LocalProviderConfig> for ProviderConfig {
    fn from(local: LocalProviderConfig) -> Self {
        Self::Local(local)
    }
}

impl From<AbsProviderConfig> for ProviderConfig {
    fn from(abs: AbsProviderConfig) -> Self {
        Self::Absolute(abs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implied_provider_uses_type_prefix() {
        assert_eq!(
            Provider::implied_by_action_type("webhook_notify").type_name,
            "webhook"
        );
        assert_eq!(Provider::implied_by_action_type("local").type_name, "local");
        assert_eq!(
            LocalProviderConfig::implied_by_action_type("aws_lambda_invoke"),
            LocalProviderConfig::new("aws")
        );
    }

    #[test]
    fn provider_display() {
        assert_eq!(
            Provider::new("webhook").to_string(),
            "registry.terraform.io/hashicorp/webhook"
        );
    }

    #[test]
    fn abs_provider_config_display() {
        let root = AbsProviderConfig::new(Module::root(), Provider::new("aws"), None);
        assert_eq!(
            root.to_string(),
            r#"provider["registry.terraform.io/hashicorp/aws"]"#
        );

        let nested = AbsProviderConfig::new(
            Module::root().child("app"),
            Provider::new("aws").with_namespace("acme"),
            Some("west".into()),
        );
        assert_eq!(
            nested.to_string(),
            r#"module.app.provider["registry.terraform.io/acme/aws"].west"#
        );
    }

    #[test]
    fn local_provider_config_display() {
        assert_eq!(LocalProviderConfig::new("aws").to_string(), "provider.aws");
        assert_eq!(
            LocalProviderConfig::new("aws").with_alias("west").to_string(),
            "provider.aws.west"
        );
    }

    #[test]
    fn provider_config_serde_roundtrip() {
        let config = ProviderConfig::from(LocalProviderConfig::new("aws").with_alias("west"));
        let json = serde_json::to_string(&config).unwrap();
        let back: ProviderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
