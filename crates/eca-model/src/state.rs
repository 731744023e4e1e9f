//! Operational state of topology links

use serde::{Deserialize, Serialize};

/// Whether a link may carry traffic.
///
/// Only [`OperationalState::Enabled`] links participate in pathfinding; a
/// route whose only option crosses a disabled link is treated as no route
/// at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationalState {
    /// Link is up and usable
    Enabled,
    /// Link is administratively or operationally down
    Disabled,
}

impl OperationalState {
    /// True for [`OperationalState::Enabled`]
    #[inline]
    #[must_use]
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}
