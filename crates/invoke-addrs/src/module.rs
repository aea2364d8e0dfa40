//! Module paths
//!
//! [`Module`] is the static path through the module tree as written in
//! configuration. [`ModuleInstance`] is the same path after expansion, where
//! each call may carry an [`InstanceKey`].

use crate::key::InstanceKey;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Static module path (`module.network.module.subnets`)
///
/// The empty path is the root module.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Module(Vec<String>);

impl Module {
    /// Root module
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Create from call names, outermost first
    #[inline]
    #[must_use]
    pub fn new(calls: Vec<String>) -> Self {
        Self(calls)
    }

    /// Whether this is the root module
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Module call names, outermost first
    #[inline]
    #[must_use]
    pub fn calls(&self) -> &[String] {
        &self.0
    }

    /// Path of a nested module call
    #[inline]
    #[must_use]
    pub fn child(&self, call: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(call.into());
        new
    }

    /// Parent module (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// This module followed by each ancestor, ending at the root
    pub fn self_and_ancestors(&self) -> impl Iterator<Item = Module> + '_ {
        (0..=self.0.len()).rev().map(|n| Self(self.0[..n].to_vec()))
    }
}

impl Display for Module {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, call) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "module.{call}")?;
        }
        Ok(())
    }
}

/// One step of an expanded module path
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleInstanceStep {
    /// Module call name
    pub name: String,
    /// Key of this call's instance
    pub key: InstanceKey,
}

/// Expanded module path (`module.network["east"].module.subnets[0]`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ModuleInstance(Vec<ModuleInstanceStep>);

impl ModuleInstance {
    /// Root module instance
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Whether this is the root module instance
    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of a nested module call instance
    #[inline]
    #[must_use]
    pub fn child(&self, name: impl Into<String>, key: InstanceKey) -> Self {
        let mut new = self.clone();
        new.0.push(ModuleInstanceStep {
            name: name.into(),
            key,
        });
        new
    }

    /// Steps, outermost first
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[ModuleInstanceStep] {
        &self.0
    }

    /// Static module path with instance keys dropped
    #[must_use]
    pub fn module(&self) -> Module {
        Module(self.0.iter().map(|step| step.name.clone()).collect())
    }
}

impl Display for ModuleInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "module.{}{}", step.name, step.key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_displays_empty() {
        assert_eq!(Module::root().to_string(), "");
        assert_eq!(ModuleInstance::root().to_string(), "");
        assert!(Module::root().is_root());
    }

    #[test]
    fn nested_module_display() {
        let module = Module::root().child("network").child("subnets");
        assert_eq!(module.to_string(), "module.network.module.subnets");
    }

    #[test]
    fn module_instance_drops_keys() {
        let inst = ModuleInstance::root()
            .child("network", InstanceKey::from("east"))
            .child("subnets", InstanceKey::Int(0));
        assert_eq!(
            inst.to_string(),
            r#"module.network["east"].module.subnets[0]"#
        );
        assert_eq!(inst.module(), Module::root().child("network").child("subnets"));
    }

    #[test]
    fn ancestors_end_at_root() {
        let module = Module::root().child("a").child("b");
        let chain: Vec<String> = module.self_and_ancestors().map(|m| m.to_string()).collect();
        assert_eq!(chain, vec!["module.a.module.b", "module.a", ""]);
    }

    #[test]
    fn parent_of_root_is_none() {
        assert!(Module::root().parent().is_none());
        assert_eq!(Module::root().child("a").parent(), Some(Module::root()));
    }
}
