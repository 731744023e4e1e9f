//! Identifier newtypes
//!
//! All identifiers are operator- or controller-assigned names rather than
//! numeric handles; newtypes keep a node id from being confused with a port
//! id at a call site.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! name_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Identifier as a string slice
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

name_id! {
    /// A network element in the topology graph
    NodeId
}

name_id! {
    /// A port local to one node
    EdgePointId
}

name_id! {
    /// A global service interface point reference
    SipId
}

name_id! {
    /// An activation driver family, as advertised by a node
    DriverId
}

name_id! {
    /// A connectivity service record key
    ServiceId
}

name_id! {
    /// A connection record key
    ConnectionId
}

impl ServiceId {
    /// Mint a fresh, unique service id
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("cs:{}", Uuid::new_v4()))
    }
}

impl ConnectionId {
    /// Connection id for the per-node connection realized on `node`
    #[must_use]
    pub fn for_node(node: &NodeId, service: &ServiceId) -> Self {
        Self(format!("conn:{}:{}", node, service))
    }

    /// Connection id for the end-to-end aggregate view of `service`
    #[must_use]
    pub fn aggregate(service: &ServiceId) -> Self {
        Self(format!("conn:aggregate:{service}"))
    }
}
