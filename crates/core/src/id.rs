// SPDX-License-Identifier: MIT

//! Identifier newtypes for workflows and nodes.
//!
//! Unlike a process-generated id, a [`WorkflowId`] or [`NodeId`] is almost
//! always supplied by the caller (the host's workflow store, the graph's
//! own node list) rather than minted here, so these wrap an arbitrary
//! `SmolStr` instead of a fixed-capacity generated buffer.

use smol_str::SmolStr;
use std::borrow::Borrow;
use std::fmt;

/// Define a newtype id wrapper around [`SmolStr`].
///
/// Generates `new()`/`from_string()` constructors, `as_str()`, `Display`,
/// `From<&str>`, `From<String>`, `Borrow<str>`, and `Deref` implementations.
macro_rules! define_id {
    ($(#[$meta:meta])* pub struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(SmolStr);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(SmolStr::new(id.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.0.as_str())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                self.0.as_str()
            }
        }
    };
}

define_id! {
    /// Identifies a running (or startable) workflow instance.
    pub struct WorkflowId;
}

define_id! {
    /// Identifies a node within a single graph. Unique only within its graph (I1).
    pub struct NodeId;
}

define_id! {
    /// Opaque handle returned by `EventBus::subscribe`.
    pub struct SubscriptionId;
}

/// Generates a fresh random [`SubscriptionId`], process-unique in practice.
pub fn new_subscription_id() -> SubscriptionId {
    SubscriptionId::new(uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
