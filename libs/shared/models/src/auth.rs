use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtHeader {
    pub alg: String,
    pub typ: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    /// Role-table id (PatientID, DentistId, ...) of the account.
    pub role_id: Option<i64>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub role_id: Option<i64>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Role {
    Patient,
    Dentist,
    Assistant,
    Receptionist,
    Owner,
    Administrator,
}

impl Role {
    pub fn is_staff(&self) -> bool {
        !matches!(self, Role::Patient)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Patient => write!(f, "Patient"),
            Role::Dentist => write!(f, "Dentist"),
            Role::Assistant => write!(f, "Assistant"),
            Role::Receptionist => write!(f, "Receptionist"),
            Role::Owner => write!(f, "Owner"),
            Role::Administrator => write!(f, "Administrator"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "patient" => Ok(Role::Patient),
            "dentist" => Ok(Role::Dentist),
            "assistant" => Ok(Role::Assistant),
            "receptionist" => Ok(Role::Receptionist),
            "owner" => Ok(Role::Owner),
            "administrator" | "admin" => Ok(Role::Administrator),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// Identity of whoever issued a command, passed explicitly to every operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Caller {
    /// Shared user account id (token subject).
    pub user_id: String,
    pub role: Role,
    /// Role-table id, e.g. the PatientID when `role` is `Patient`.
    pub role_id: i64,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role, role_id: i64) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            role_id,
        }
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_patient(&self, patient_id: i64) -> bool {
        self.role == Role::Patient && self.role_id == patient_id
    }

    pub fn is_dentist(&self, dentist_id: i64) -> bool {
        self.role == Role::Dentist && self.role_id == dentist_id
    }
}

impl TryFrom<&User> for Caller {
    type Error = String;

    fn try_from(user: &User) -> Result<Self, Self::Error> {
        let role = user
            .role
            .as_deref()
            .ok_or_else(|| "Token carries no role".to_string())?
            .parse::<Role>()?;

        let role_id = user
            .role_id
            .ok_or_else(|| "Token carries no role id".to_string())?;

        Ok(Caller::new(user.id.clone(), role, role_id))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub user_id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub role_id: Option<i64>,
}
