use serde::{Deserialize, Serialize};
use std::fmt;

const NEW: &str = "New";
const SUCCESS: &str = "Success";
const CANCELED: &str = "Canceled";

/// Status of the mobile-money transaction attached to an order.
///
/// The backend reports it as a human readable label. `New`, `Success` and
/// `Canceled` drive the poller directly; every other label (`Wrong PIN`,
/// `Expired`, `Failed`, ...) is kept verbatim in `Other` and treated as a
/// failure reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionStatus {
    New,
    Success,
    Canceled,
    Other(String),
}

impl TransactionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => NEW,
            Self::Success => SUCCESS,
            Self::Canceled => CANCELED,
            Self::Other(raw) => raw,
        }
    }

    /// Classifies a terminal status. Returns `None` while the payment is pending.
    pub fn outcome(&self) -> Option<PollOutcome> {
        match self {
            Self::New => None,
            Self::Success => Some(PollOutcome::Paid),
            Self::Canceled => Some(PollOutcome::Canceled),
            Self::Other(raw) => Some(PollOutcome::Failed(raw.clone())),
        }
    }
}

impl From<String> for TransactionStatus {
    fn from(label: String) -> Self {
        match label.as_str() {
            NEW => Self::New,
            SUCCESS => Self::Success,
            CANCELED => Self::Canceled,
            _ => Self::Other(label),
        }
    }
}

impl From<&str> for TransactionStatus {
    fn from(label: &str) -> Self {
        Self::from(label.to_string())
    }
}

impl From<TransactionStatus> for String {
    fn from(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `GET transaction/{order_id}/status/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    pub status: TransactionStatus,
}

/// How a poll session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Paid,
    Canceled,
    /// Raw status label reported by the backend.
    Failed(String),
}

impl PollOutcome {
    /// The status label as the backend reported it.
    pub fn status_label(&self) -> &str {
        match self {
            Self::Paid => SUCCESS,
            Self::Canceled => CANCELED,
            Self::Failed(raw) => raw,
        }
    }
}
