//! References between graph nodes
//!
//! A node declares what it references; the graph walker turns those references
//! into dependency edges.

use crate::action::{Action, ActionInstance};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Something a reference can point at
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Referenceable {
    /// A whole action declaration
    Action(Action),
    /// One keyed instance
    ActionInstance(ActionInstance),
}

impl Display for Referenceable {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => write!(f, "{action}"),
            Self::ActionInstance(inst) => write!(f, "{inst}"),
        }
    }
}

/// Module-relative reference made by a node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// Referenced object
    pub subject: Referenceable,
}

impl Reference {
    /// Reference to a declaration
    #[inline]
    #[must_use]
    pub fn to_action(action: Action) -> Self {
        Self {
            subject: Referenceable::Action(action),
        }
    }

    /// Reference to one instance
    #[inline]
    #[must_use]
    pub fn to_instance(inst: ActionInstance) -> Self {
        Self {
            subject: Referenceable::ActionInstance(inst),
        }
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.subject)
    }
}
