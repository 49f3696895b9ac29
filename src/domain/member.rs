//! Member record and eligibility status.

use crate::domain::{MemberId, TimeMs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Eligibility status of a member.
///
/// Catalog names beyond the built-in ones are kept verbatim in `Other` so a
/// manual admin change never gets rewritten by a round trip through the core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum MemberStatus {
    Active,
    Inactive,
    Suspended,
    Won,
    Paid,
    Other(String),
}

impl MemberStatus {
    pub fn as_str(&self) -> &str {
        match self {
            MemberStatus::Active => "Active",
            MemberStatus::Inactive => "Inactive",
            MemberStatus::Suspended => "Suspended",
            MemberStatus::Won => "Won",
            MemberStatus::Paid => "Paid",
            MemberStatus::Other(name) => name,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MemberStatus::Active)
    }
}

impl FromStr for MemberStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "active" => MemberStatus::Active,
            "inactive" => MemberStatus::Inactive,
            "suspended" => MemberStatus::Suspended,
            "won" => MemberStatus::Won,
            "paid" => MemberStatus::Paid,
            _ => MemberStatus::Other(s.trim().to_string()),
        })
    }
}

impl From<String> for MemberStatus {
    fn from(s: String) -> Self {
        match MemberStatus::from_str(&s) {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<MemberStatus> for String {
    fn from(status: MemberStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A portal member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub status: MemberStatus,
    pub join_date: Option<TimeMs>,
}

impl Member {
    pub fn new(id: MemberId, name: impl Into<String>, status: MemberStatus) -> Self {
        Self {
            id,
            name: name.into(),
            status,
            join_date: None,
        }
    }

    pub fn with_join_date(mut self, join_date: TimeMs) -> Self {
        self.join_date = Some(join_date);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!("active".parse::<MemberStatus>().unwrap(), MemberStatus::Active);
        assert_eq!("INACTIVE".parse::<MemberStatus>().unwrap(), MemberStatus::Inactive);
    }

    #[test]
    fn test_unknown_status_kept_verbatim() {
        let status: MemberStatus = "On Hold".parse().unwrap();
        assert_eq!(status, MemberStatus::Other("On Hold".to_string()));
        assert_eq!(status.to_string(), "On Hold");
        assert!(!status.is_active());
    }

    #[test]
    fn test_status_serializes_as_string() {
        let json = serde_json::to_string(&MemberStatus::Suspended).unwrap();
        assert_eq!(json, "\"Suspended\"");
        let back: MemberStatus = serde_json::from_str("\"won\"").unwrap();
        assert_eq!(back, MemberStatus::Won);
    }
}
