//! Invoke targets
//!
//! A target names what the user asked to invoke: either one concrete instance
//! or a whole action whose instances are only known after expansion.

use crate::action::{AbsAction, AbsActionInstance, ConfigAction};
use crate::module::Module;
use crate::parse::{self, AddrParseError};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Target of an invoke request
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionTarget {
    /// One concrete instance
    Instance(AbsActionInstance),
    /// Every instance the action expands to
    Action(AbsAction),
}

impl ActionTarget {
    /// Static address of the targeted declaration
    #[must_use]
    pub fn config_action(&self) -> ConfigAction {
        match self {
            Self::Instance(inst) => inst.config_action(),
            Self::Action(action) => action.config_action(),
        }
    }

    /// Static module path the declaration lives in
    #[must_use]
    pub fn module_path(&self) -> Module {
        match self {
            Self::Instance(inst) => inst.module.module(),
            Self::Action(action) => action.module.module(),
        }
    }

    /// The unkeyed action, whichever variant this is
    #[must_use]
    pub fn abs_action(&self) -> AbsAction {
        match self {
            Self::Instance(inst) => inst.containing_action(),
            Self::Action(action) => action.clone(),
        }
    }

    /// Whether this target names a concrete instance
    #[inline]
    #[must_use]
    pub fn is_instance(&self) -> bool {
        matches!(self, Self::Instance(_))
    }
}

impl Display for ActionTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(inst) => write!(f, "{inst}"),
            Self::Action(action) => write!(f, "{action}"),
        }
    }
}

impl From<AbsAction> for ActionTarget {
    fn from(action: AbsAction) -> Self {
        Self::Action(action)
    }
}

impl From<AbsActionInstance> for ActionTarget {
    fn from(inst: AbsActionInstance) -> Self {
        Self::Instance(inst)
    }
}

impl FromStr for ActionTarget {
    type Err = AddrParseError;

    /// Parse `[module.<name>[<key>].]*action.<type>.<name>[<key>]`
    ///
    /// A trailing key makes the target a concrete instance; without one it
    /// targets the whole action.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse::parse_target(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, InstanceKey, ModuleInstance};

    #[test]
    fn parse_abstract_target() {
        let target: ActionTarget = "action.webhook_notify.notify".parse().unwrap();
        assert_eq!(
            target,
            ActionTarget::Action(
                Action::new("webhook_notify", "notify").absolute(&ModuleInstance::root())
            )
        );
        assert!(!target.is_instance());
    }

    #[test]
    fn parse_instance_target() {
        let target: ActionTarget = r#"action.webhook_notify.notify["prod"]"#.parse().unwrap();
        let ActionTarget::Instance(inst) = &target else {
            panic!("expected instance target");
        };
        assert_eq!(inst.action.key, InstanceKey::from("prod"));
        assert_eq!(target.to_string(), r#"action.webhook_notify.notify["prod"]"#);
    }

    #[test]
    fn target_module_path_and_config_action() {
        let target: ActionTarget = r#"module.app["x"].action.t.n[2]"#.parse().unwrap();
        assert_eq!(target.module_path(), Module::root().child("app"));
        assert_eq!(target.config_action().to_string(), "module.app.action.t.n");
        assert_eq!(target.abs_action().to_string(), r#"module.app["x"].action.t.n"#);
    }
}
