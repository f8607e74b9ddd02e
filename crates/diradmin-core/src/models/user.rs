use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An admin account as returned by `/afghan/user/` and `/user/profile/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_super_admin: bool,
    /// Fields the client does not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// The logged-in user's profile. Same record shape as [`User`].
pub type UserProfile = User;

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// First letters of first and last name, for avatars
    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .take(1)
            .chain(self.last_name.chars().take(1))
            .collect()
    }

    pub fn role_label(&self) -> &'static str {
        if self.is_super_admin {
            "SuperAdmin"
        } else {
            "Admin"
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_active {
            "Active"
        } else {
            "Inactive"
        }
    }

    /// Case-insensitive match against "first last" or email
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        format!("{} {}", self.first_name, self.last_name)
            .to_lowercase()
            .contains(&query)
            || self.email.to_lowercase().contains(&query)
    }
}

/// Payload for creating a user
#[derive(Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// Status filter for the users table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserStatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl UserStatusFilter {
    pub fn matches(&self, user: &User) -> bool {
        match self {
            UserStatusFilter::All => true,
            UserStatusFilter::Active => user.is_active,
            UserStatusFilter::Inactive => !user.is_active,
        }
    }
}

impl FromStr for UserStatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(UserStatusFilter::All),
            "active" => Ok(UserStatusFilter::Active),
            "inactive" => Ok(UserStatusFilter::Inactive),
            other => Err(format!("unknown status filter: {}", other)),
        }
    }
}

/// Apply the search box and status filter, keeping server order
pub fn filter_users<'a>(users: &'a [User], search: &str, status: UserStatusFilter) -> Vec<&'a User> {
    users
        .iter()
        .filter(|u| u.matches_search(search))
        .filter(|u| status.matches(u))
        .collect()
}
