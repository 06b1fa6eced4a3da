use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// --- Identity ---

/// Role
///
/// The account type chosen at registration. Unrecognised strings coming back from the
/// API, and records with no role at all, decode to `Unknown`, which satisfies no role
/// restriction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Investor,
    User,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Capability
///
/// What a role is allowed to reach. Role-restricted routes ask for a capability rather
/// than comparing role strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Pages that manage the caller's own projects.
    OwnerArea,
    /// Pages reserved for investors.
    InvestorArea,
    /// Listing and detail pages open to any signed-in account.
    Browse,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Owner, Role::Investor, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Investor => "investor",
            Role::User => "user",
            Role::Unknown => "unknown",
        }
    }

    /// Parses the exact lowercase wire value. `unknown` is not a value a user may pick.
    pub fn parse(raw: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == raw)
    }

    pub fn can(&self, capability: Capability) -> bool {
        match (self, capability) {
            (Role::Unknown, _) => false,
            (Role::Owner, Capability::OwnerArea) => true,
            (Role::Owner, Capability::InvestorArea) => false,
            (Role::Investor, Capability::OwnerArea) => false,
            (Role::Investor, Capability::InvestorArea) => true,
            (Role::User, Capability::OwnerArea) => false,
            (Role::User, Capability::InvestorArea) => false,
            (_, Capability::Browse) => true,
        }
    }

    /// The capability that identifies this role on a restricted route.
    pub fn capability(&self) -> Capability {
        match self {
            Role::Owner => Capability::OwnerArea,
            Role::Investor => Capability::InvestorArea,
            Role::User | Role::Unknown => Capability::Browse,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SessionUser
///
/// The user record cached next to the token under the `user` storage key. It is built
/// from the token claims at login and trusted only while the token is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionUser {
    // JWT subject. The API issues numeric ids; older tokens used strings.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: Role,
}

/// Accepts `"42"` and `42` alike.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

// --- Request Payloads ---

/// Body of `POST /auth/register`. The API receives the confirmation field as well.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub email: String,
    pub password: String,
    pub password_verify: String,
    pub role: Role,
    pub birth_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Body of `POST /auth/reset-password/verify-code`. `email` is whatever the
/// forgot-password step left in storage and may be missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifyCodeRequest {
    pub email: Option<String>,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub code: Option<String>,
    pub new_password: String,
    pub new_password_verify: String,
}

// --- Projects ---

/// ProjectSummary
///
/// One card of `GET /projects`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub short_info: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl ProjectSummary {
    /// Case-insensitive match on name or short info.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.name.to_lowercase().contains(&term) || self.short_info.to_lowercase().contains(&term)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl PersonName {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectOwner {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub user: PersonName,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SocialPage {
    pub page_url: String,
    pub page_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ContactInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub pages: Vec<SocialPage>,
}

/// ProjectDetails
///
/// Response of `GET /projects/:id`. Owner and contact blocks are optional because the API
/// omits them for projects whose owner has not completed a profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectDetails {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub owner: Option<ProjectOwner>,
    #[serde(default)]
    pub contact: Option<ContactInfo>,
    #[serde(default)]
    pub images: Vec<String>,
}

// --- Events ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct EventImage {
    pub id: i64,
    pub image_url: String,
    #[serde(default)]
    pub is_cover: bool,
}

/// Event
///
/// Used for both `GET /events` and `GET /events/:id`; the list endpoint simply returns
/// fewer populated fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub organizer_id: Option<i64>,
    #[serde(default)]
    pub images: Vec<EventImage>,
}

impl Event {
    pub fn matches(&self, term: &str) -> bool {
        self.name.to_lowercase().contains(&term.to_lowercase())
    }

    /// Index of the image flagged as cover, or the first image.
    pub fn cover_index(&self) -> usize {
        self.images.iter().position(|img| img.is_cover).unwrap_or(0)
    }

    /// Status with its first letter upper-cased, e.g. `upcoming` -> `Upcoming`.
    pub fn status_label(&self) -> String {
        let mut chars = self.status.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// Response of `GET /events/:id/my-participation`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Participation {
    #[serde(default)]
    pub participating: bool,
    #[serde(default)]
    pub status: Option<String>,
}

// --- Owners ---

/// OwnerProfile
///
/// Response of `GET /owners/:id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub photo: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub user: PersonName,
}

impl OwnerProfile {
    /// Birth date as sent by the API: either a plain date or an RFC 3339 timestamp.
    pub fn birth_date(&self) -> Option<NaiveDate> {
        let raw = self.birth_date.as_deref()?.trim();
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.date_naive())
            .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
            .ok()
    }

    /// Age by calendar year, the way the profile page shows it.
    pub fn age_in(&self, current_year: i32) -> Option<i32> {
        self.birth_date().map(|d| current_year - d.year())
    }
}
