//! Status vocabularies.
//!
//! The engine decides everything in terms of [`EnhancedStatus`]. The smaller
//! [`LegacyStatus`] vocabulary exists only for the persistence layer, which
//! predates the approval workflow. The enhanced → legacy mapping is lossy on
//! purpose (both `approved` and `sent_to_supplier` store as `sent`); that
//! compromise is load-bearing for older readers of the store and must not
//! change. The lossy form never feeds back into decision logic; rehydration
//! lifts it to the canonical representative once, at the boundary.

use serde::{Deserialize, Serialize};

/// Canonical internal purchase order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnhancedStatus {
    Draft,
    PendingApproval,
    Approved,
    SentToSupplier,
    PartiallyReceived,
    FullyReceived,
    Cancelled,
    Closed,
}

/// Legacy status vocabulary used by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyStatus {
    Draft,
    Sent,
    Received,
    Partial,
    Cancelled,
}

impl EnhancedStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::SentToSupplier => "sent_to_supplier",
            Self::PartiallyReceived => "partially_received",
            Self::FullyReceived => "fully_received",
            Self::Cancelled => "cancelled",
            Self::Closed => "closed",
        }
    }

    /// `cancelled` and `closed` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Closed)
    }

    /// Collapse to the legacy vocabulary (lossy).
    pub fn to_legacy(self) -> LegacyStatus {
        match self {
            Self::Draft | Self::PendingApproval => LegacyStatus::Draft,
            Self::Approved | Self::SentToSupplier => LegacyStatus::Sent,
            Self::PartiallyReceived => LegacyStatus::Partial,
            Self::FullyReceived | Self::Closed => LegacyStatus::Received,
            Self::Cancelled => LegacyStatus::Cancelled,
        }
    }
}

impl LegacyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Received => "received",
            Self::Partial => "partial",
            Self::Cancelled => "cancelled",
        }
    }

    /// Lift to the canonical representative of each legacy value.
    pub fn to_enhanced(self) -> EnhancedStatus {
        match self {
            Self::Draft => EnhancedStatus::Draft,
            Self::Sent => EnhancedStatus::SentToSupplier,
            Self::Partial => EnhancedStatus::PartiallyReceived,
            Self::Received => EnhancedStatus::FullyReceived,
            Self::Cancelled => EnhancedStatus::Cancelled,
        }
    }
}

impl core::fmt::Display for EnhancedStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::fmt::Display for LegacyStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
