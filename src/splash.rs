//! Guest sign-in from the captive portal splash page

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::info;

/// Details a guest submits before getting online
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestRegistration {
    pub email: String,
    pub phone: String,
    pub location: String,
    pub connected_at: DateTime<Utc>,
}

impl GuestRegistration {
    pub fn new(email: &str, phone: &str, location: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            phone: phone.trim().to_string(),
            location: location.trim().to_string(),
            connected_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_email(&self.email)?;
        validate_phone(&self.phone)?;
        if self.location.is_empty() {
            return Err(Error::InvalidInput("location is required".to_string()));
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<()> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid email address: {}", email)))
    }
}

/// Digits with an optional leading '+', separated by spaces or dashes
fn validate_phone(phone: &str) -> Result<()> {
    let body = phone.strip_prefix('+').unwrap_or(phone);
    let only_allowed = body
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-');
    let digits = body.chars().filter(char::is_ascii_digit).count();
    if only_allowed && (7..=15).contains(&digits) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("invalid phone number: {}", phone)))
    }
}

/// Validate a registration and append it to the registrations log
///
/// The header row is written when the log is new or empty.
pub fn register(path: &Path, registration: &GuestRegistration) -> Result<()> {
    registration.validate()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    writer.serialize(registration)?;
    writer.flush()?;

    info!("Registered guest at {}", registration.location);
    Ok(())
}

/// All registrations recorded so far, oldest first
pub fn read_registrations(path: &Path) -> Result<Vec<GuestRegistration>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)?;
    let registrations = reader
        .deserialize()
        .collect::<std::result::Result<Vec<GuestRegistration>, csv::Error>>()?;
    Ok(registrations)
}
