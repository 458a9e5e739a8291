use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Review state of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    New,
    Review,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        ApplicationStatus::New,
        ApplicationStatus::Review,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::Review => "review",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Human-readable label used in listings and CSV exports
    pub fn label(self) -> &'static str {
        match self {
            ApplicationStatus::New => "New",
            ApplicationStatus::Review => "Under Review",
            ApplicationStatus::Accepted => "Accepted",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    pub fn is_final(self) -> bool {
        matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                format!(
                    "Invalid status '{}'. Expected one of: new, review, accepted, rejected",
                    value
                )
            })
    }
}

/// Which status changes a company may make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// new → review → accepted | rejected; re-setting the current status is a no-op
    #[default]
    Guarded,
    /// Any status may be set from any status
    Unrestricted,
}

impl StatusPolicy {
    pub fn allows(self, from: ApplicationStatus, to: ApplicationStatus) -> bool {
        use ApplicationStatus::*;

        match self {
            StatusPolicy::Unrestricted => true,
            StatusPolicy::Guarded => {
                from == to
                    || matches!(
                        (from, to),
                        (New, Review) | (Review, Accepted) | (Review, Rejected)
                    )
            }
        }
    }
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "guarded" => Ok(StatusPolicy::Guarded),
            "unrestricted" => Ok(StatusPolicy::Unrestricted),
            other => Err(format!(
                "APPLICATION_STATUS_POLICY must be 'guarded' or 'unrestricted', got '{}'",
                other
            )),
        }
    }
}
