//! Arena-backed transform hierarchy.
//!
//! Nodes live in the universe's object arena and refer to each other through
//! [`ObjectId`] handles; a node never owns its parent.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod node;

pub use node::SceneNode;

/// Stable handle into the universe's object arena. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Coordinate frame a node's position is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReferenceFrame {
    /// Earth-centred inertial.
    Inertial,
    /// Earth-centred, Earth-fixed (rotates with the Earth).
    Fixed,
}
