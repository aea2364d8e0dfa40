//! Invoke Addresses
//!
//! Typed, comparable addresses for everything the invoke engine talks about.
//!
//! # Core Concepts
//!
//! - [`Module`] / [`ModuleInstance`]: static and expanded module paths
//! - [`InstanceKey`]: the key that distinguishes repeated instances
//! - [`AbsAction`] / [`AbsActionInstance`]: module-qualified actions
//! - [`ActionTarget`]: what the user asked to invoke (one instance or the whole action)
//! - [`AbsProviderConfig`] / [`LocalProviderConfig`]: provider bindings
//!
//! # Example
//!
//! ```rust
//! use invoke_addrs::{ActionTarget, InstanceKey};
//!
//! let target: ActionTarget = r#"module.app.action.webhook_notify.notify["prod"]"#.parse().unwrap();
//! match &target {
//!     ActionTarget::Instance(inst) => assert_eq!(inst.action.key, InstanceKey::from("prod")),
//!     ActionTarget::Action(_) => unreachable!(),
//! }
//! ```

mod action;
mod key;
mod module;
mod parse;
mod provider;
mod reference;
mod target;

pub use action::{AbsAction, AbsActionInstance, Action, ActionInstance, ConfigAction};
pub use key::InstanceKey;
pub use module::{Module, ModuleInstance, ModuleInstanceStep};
pub use parse::AddrParseError;
pub use provider::{
    AbsProviderConfig, LocalProviderConfig, Provider, ProviderConfig, DEFAULT_NAMESPACE,
    DEFAULT_REGISTRY_HOST,
};
pub use reference::{Reference, Referenceable};
pub use target::ActionTarget;
