//! Action addresses
//!
//! An action is declared once (`action "<type>" "<name>"`) and may expand into
//! many instances. The address types mirror that split:
//!
//! | Type | Scope | Example |
//! |---|---|---|
//! | [`Action`] | within a module | `action.webhook_notify.notify` |
//! | [`ActionInstance`] | within a module, keyed | `action.webhook_notify.notify["a"]` |
//! | [`ConfigAction`] | static module path | `module.app.action.webhook_notify.notify` |
//! | [`AbsAction`] | expanded module path | `module.app["x"].action.webhook_notify.notify` |
//! | [`AbsActionInstance`] | expanded module path, keyed | `module.app["x"].action.webhook_notify.notify[0]` |

use crate::key::InstanceKey;
use crate::module::{Module, ModuleInstance};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Action declaration address relative to its module
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Action {
    /// Action type, served by a provider (e.g. `webhook_notify`)
    pub type_name: String,
    /// Declared name
    pub name: String,
}

impl Action {
    /// Create an action address
    #[inline]
    #[must_use]
    pub fn new(type_name: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            name: name.into(),
        }
    }

    /// Instance of this action with the given key
    #[inline]
    #[must_use]
    pub fn instance(&self, key: InstanceKey) -> ActionInstance {
        ActionInstance {
            action: self.clone(),
            key,
        }
    }

    /// Place this action in a static module path
    #[inline]
    #[must_use]
    pub fn in_module(&self, module: &Module) -> ConfigAction {
        ConfigAction {
            module: module.clone(),
            action: self.clone(),
        }
    }

    /// Place this action in an expanded module path
    #[inline]
    #[must_use]
    pub fn absolute(&self, module: &ModuleInstance) -> AbsAction {
        AbsAction {
            module: module.clone(),
            action: self.clone(),
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "action.{}.{}", self.type_name, self.name)
    }
}

/// Keyed action instance relative to its module
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActionInstance {
    /// Declaration this instance realizes
    pub action: Action,
    /// Instance key
    pub key: InstanceKey,
}

impl ActionInstance {
    /// Place this instance in an expanded module path
    #[inline]
    #[must_use]
    pub fn absolute(&self, module: &ModuleInstance) -> AbsActionInstance {
        AbsActionInstance {
            module: module.clone(),
            action: self.clone(),
        }
    }
}

impl Display for ActionInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.action, self.key)
    }
}

/// Action in a static module path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConfigAction {
    /// Declaring module
    pub module: Module,
    /// Action within the module
    pub action: Action,
}

impl Display for ConfigAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.module.is_root() {
            write!(f, "{}", self.action)
        } else {
            write!(f, "{}.{}", self.module, self.action)
        }
    }
}

/// Action in an expanded module path, not yet keyed
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbsAction {
    /// Module instance containing the action
    pub module: ModuleInstance,
    /// Action within the module
    pub action: Action,
}

impl AbsAction {
    /// Create an absolute action address
    #[inline]
    #[must_use]
    pub fn new(module: ModuleInstance, action: Action) -> Self {
        Self { module, action }
    }

    /// Keyed instance of this action
    #[inline]
    #[must_use]
    pub fn instance(&self, key: InstanceKey) -> AbsActionInstance {
        AbsActionInstance {
            module: self.module.clone(),
            action: self.action.instance(key),
        }
    }

    /// Static address of the declaration
    #[inline]
    #[must_use]
    pub fn config_action(&self) -> ConfigAction {
        self.action.in_module(&self.module.module())
    }
}

impl Display for AbsAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.module.is_root() {
            write!(f, "{}", self.action)
        } else {
            write!(f, "{}.{}", self.module, self.action)
        }
    }
}

/// Fully expanded, keyed action instance
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AbsActionInstance {
    /// Module instance containing the action
    pub module: ModuleInstance,
    /// Keyed action within the module
    pub action: ActionInstance,
}

impl AbsActionInstance {
    /// Create an absolute action instance address
    #[inline]
    #[must_use]
    pub fn new(module: ModuleInstance, action: ActionInstance) -> Self {
        Self { module, action }
    }

    /// Unkeyed action this instance belongs to
    #[inline]
    #[must_use]
    pub fn containing_action(&self) -> AbsAction {
        AbsAction {
            module: self.module.clone(),
            action: self.action.action.clone(),
        }
    }

    /// Static address of the declaration
    #[inline]
    #[must_use]
    pub fn config_action(&self) -> ConfigAction {
        self.action.action.in_module(&self.module.module())
    }
}

impl Display for AbsActionInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.module.is_root() {
            write!(f, "{}", self.action)
        } else {
            write!(f, "{}.{}", self.module, self.action)
        }
    }
}
