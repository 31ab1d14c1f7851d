//! Credential table and the request-scoped context passed to every handler
//!
//! Passwords are compared in plain text against the configured table; the
//! table exists to separate admin and guest flows, not to secure anything.

use crate::business::BusinessType;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Role granted to a signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Guest,
    Other(String),
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "admin" => Role::Admin,
            "guest" => Role::Guest,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Guest => f.write_str("guest"),
            Role::Other(name) => f.write_str(name),
        }
    }
}

/// One row of the credential table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl UserEntry {
    pub fn new(username: &str, password: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            role,
        }
    }
}

/// Lookup of users by name
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, UserEntry>,
}

impl CredentialStore {
    pub fn new(entries: &[UserEntry]) -> Self {
        let users = entries
            .iter()
            .map(|entry| (entry.username.clone(), entry.clone()))
            .collect();
        Self { users }
    }

    /// Check credentials and open a context for the user
    pub fn login(&self, username: &str, password: &str) -> Result<RequestContext> {
        match self.users.get(username) {
            Some(entry) if entry.password == password => {
                debug!("Signed in '{}' as {}", username, entry.role);
                Ok(RequestContext::new(username, entry.role.clone()))
            }
            _ => {
                warn!("Rejected sign-in for '{}'", username);
                Err(Error::Unauthorized)
            }
        }
    }
}

/// Who is making the current request and what they are looking at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub username: String,
    pub role: Role,
    pub business_type: Option<BusinessType>,
}

impl RequestContext {
    pub fn new(username: &str, role: Role) -> Self {
        Self {
            username: username.to_string(),
            role,
            business_type: None,
        }
    }

    pub fn with_business(mut self, business_type: BusinessType) -> Self {
        self.business_type = Some(business_type);
        self
    }

    pub fn require(&self, role: &Role) -> Result<()> {
        if &self.role == role {
            Ok(())
        } else {
            Err(Error::PermissionDenied {
                required: role.to_string(),
                actual: self.role.to_string(),
            })
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        self.require(&Role::Admin)
    }

    pub fn require_guest(&self) -> Result<()> {
        self.require(&Role::Guest)
    }

    /// Business type selected for this request
    pub fn business(&self) -> Result<BusinessType> {
        self.business_type
            .ok_or_else(|| Error::InvalidInput("no business type selected".to_string()))
    }
}
