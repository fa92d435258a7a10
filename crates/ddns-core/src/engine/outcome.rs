//! Structured result of one reconciliation
//!
//! | status        | code | body fields                              |
//! |---------------|------|------------------------------------------|
//! | NoChange      | 200  | status, record, type, ip, ttl            |
//! | Updated       | 200  | status, record, type, old?, new, ttl     |
//! | Unauthorized  | 401  | message                                  |
//! | BadRequest    | 400  | message                                  |
//! | UpstreamError | 500  | status, record, type?, ttl, message      |

use serde::Serialize;

use crate::config::RecordType;

/// Message returned for every denied request
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";

/// Terminal state of a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// The record already holds the caller's address
    NoChange,
    /// The record was written
    Updated,
    /// Authentication failed (or the secret was unavailable)
    Unauthorized,
    /// No usable caller address
    BadRequest,
    /// The DNS provider failed
    UpstreamError,
}

impl UpdateStatus {
    /// Externally visible status code
    pub fn status_code(&self) -> u16 {
        match self {
            UpdateStatus::NoChange | UpdateStatus::Updated => 200,
            UpdateStatus::Unauthorized => 401,
            UpdateStatus::BadRequest => 400,
            UpdateStatus::UpstreamError => 500,
        }
    }

    /// Status string carried in the response body
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::NoChange => "nochange",
            UpdateStatus::Updated => "updated",
            UpdateStatus::Unauthorized | UpdateStatus::BadRequest | UpdateStatus::UpstreamError => {
                "error"
            }
        }
    }
}

/// Outcome of one invocation, created once and never mutated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateResult {
    /// Terminal status
    pub status: UpdateStatus,
    /// Managed record name
    pub record: String,
    /// Record type involved, once known
    pub record_type: Option<RecordType>,
    /// Value before the write (absent if the record did not exist)
    pub old_value: Option<String>,
    /// Value written
    pub new_value: Option<String>,
    /// Caller address (no-change results)
    pub ip: Option<String>,
    /// Record TTL
    pub ttl: u32,
    /// Human-readable detail
    pub message: Option<String>,
}

impl UpdateResult {
    fn base(status: UpdateStatus, record: &str, ttl: u32) -> Self {
        Self {
            status,
            record: record.to_string(),
            record_type: None,
            old_value: None,
            new_value: None,
            ip: None,
            ttl,
            message: None,
        }
    }

    /// The record already holds `ip`
    pub fn no_change(record: &str, record_type: RecordType, ip: &str, ttl: u32) -> Self {
        Self {
            record_type: Some(record_type),
            ip: Some(ip.to_string()),
            ..Self::base(UpdateStatus::NoChange, record, ttl)
        }
    }

    /// The record was changed from `old` to `new`
    pub fn updated(
        record: &str,
        record_type: RecordType,
        old: Option<String>,
        new: &str,
        ttl: u32,
    ) -> Self {
        Self {
            record_type: Some(record_type),
            old_value: old,
            new_value: Some(new.to_string()),
            ..Self::base(UpdateStatus::Updated, record, ttl)
        }
    }

    /// The request was denied
    pub fn unauthorized(record: &str, ttl: u32) -> Self {
        Self {
            message: Some(UNAUTHORIZED_MESSAGE.to_string()),
            ..Self::base(UpdateStatus::Unauthorized, record, ttl)
        }
    }

    /// No usable caller address
    pub fn bad_request(record: &str, ttl: u32, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::base(UpdateStatus::BadRequest, record, ttl)
        }
    }

    /// The provider failed; `message` carries its error text
    pub fn upstream_error(
        record: &str,
        record_type: Option<RecordType>,
        ttl: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            record_type,
            message: Some(message.into()),
            ..Self::base(UpdateStatus::UpstreamError, record, ttl)
        }
    }

    /// Externally visible status code
    pub fn status_code(&self) -> u16 {
        self.status.status_code()
    }

    /// Response body for this result
    pub fn body(&self) -> ResponseBody {
        match self.status {
            UpdateStatus::NoChange => ResponseBody {
                status: Some(self.status.as_str()),
                record: Some(self.record.clone()),
                record_type: self.record_type,
                ip: self.ip.clone(),
                ttl: Some(self.ttl),
                ..ResponseBody::default()
            },
            UpdateStatus::Updated => ResponseBody {
                status: Some(self.status.as_str()),
                record: Some(self.record.clone()),
                record_type: self.record_type,
                old: self.old_value.clone(),
                new: self.new_value.clone(),
                ttl: Some(self.ttl),
                ..ResponseBody::default()
            },
            UpdateStatus::Unauthorized | UpdateStatus::BadRequest => ResponseBody {
                message: self.message.clone(),
                ..ResponseBody::default()
            },
            UpdateStatus::UpstreamError => ResponseBody {
                status: Some(self.status.as_str()),
                record: Some(self.record.clone()),
                record_type: self.record_type,
                ttl: Some(self.ttl),
                message: self.message.clone(),
                ..ResponseBody::default()
            },
        }
    }
}

/// Serialized response payload; absent fields are omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<RecordType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
