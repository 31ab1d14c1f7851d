//! Notification automation rules triggered by guest sessions

use crate::business::BusinessType;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;
use tracing::info;
use uuid::Uuid;

/// When a rule fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    OnConnect,
    AfterMinutes { minutes: u32 },
    OnDisconnect,
}

impl Trigger {
    pub fn fires_on(&self, event: &SessionEvent) -> bool {
        match (self, event) {
            (Trigger::OnConnect, SessionEvent::Connected) => true,
            (Trigger::OnDisconnect, SessionEvent::Disconnected) => true,
            (Trigger::AfterMinutes { minutes }, SessionEvent::Elapsed { minutes: elapsed }) => {
                elapsed >= minutes
            }
            _ => false,
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::OnConnect => f.write_str("on connect"),
            Trigger::AfterMinutes { minutes } => write!(f, "after {} minutes", minutes),
            Trigger::OnDisconnect => f.write_str("on disconnect"),
        }
    }
}

/// Accepts `on-connect`, `on-disconnect` and `after:<minutes>`
impl FromStr for Trigger {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim().to_lowercase().replace('_', "-");
        match value.as_str() {
            "on-connect" | "connect" => Ok(Trigger::OnConnect),
            "on-disconnect" | "disconnect" => Ok(Trigger::OnDisconnect),
            other => other
                .strip_prefix("after:")
                .and_then(|m| m.trim().parse::<u32>().ok())
                .filter(|m| *m > 0)
                .map(|minutes| Trigger::AfterMinutes { minutes })
                .ok_or_else(|| Error::InvalidInput(format!("unknown trigger: {}", s))),
        }
    }
}

/// What a rule does when it fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    SendSms,
    SendEmail,
    Webhook { url: String },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::SendSms => f.write_str("send SMS"),
            Action::SendEmail => f.write_str("send email"),
            Action::Webhook { url } => write!(f, "call webhook {}", url),
        }
    }
}

/// Accepts `sms`, `email` and `webhook:<http(s) url>`
impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        match value.to_lowercase().as_str() {
            "sms" | "send-sms" => return Ok(Action::SendSms),
            "email" | "send-email" => return Ok(Action::SendEmail),
            _ => {}
        }
        match value.split_once(':') {
            Some((kind, url)) if kind.eq_ignore_ascii_case("webhook") => {
                let url = url.trim();
                if url.starts_with("http://") || url.starts_with("https://") {
                    Ok(Action::Webhook { url: url.to_string() })
                } else {
                    Err(Error::InvalidInput(format!("webhook URL must be http(s): {}", url)))
                }
            }
            _ => Err(Error::InvalidInput(format!("unknown action: {}", s))),
        }
    }
}

/// Something that happened during a guest session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    Elapsed { minutes: u32 },
}

impl FromStr for SessionEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "connect" | "connected" => Ok(SessionEvent::Connected),
            "disconnect" | "disconnected" => Ok(SessionEvent::Disconnected),
            other => other
                .strip_prefix("elapsed:")
                .and_then(|m| m.trim().parse::<u32>().ok())
                .map(|minutes| SessionEvent::Elapsed { minutes })
                .ok_or_else(|| Error::InvalidInput(format!("unknown session event: {}", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationRule {
    pub id: Uuid,
    /// `None` applies the rule to every business type
    pub business_type: Option<BusinessType>,
    pub trigger: Trigger,
    pub action: Action,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl AutomationRule {
    pub fn new(
        business_type: Option<BusinessType>,
        trigger: Trigger,
        action: Action,
        content: &str,
    ) -> Result<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::InvalidInput("message content is required".to_string()));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            business_type,
            trigger,
            action,
            content: content.to_string(),
            created_at: Utc::now(),
        })
    }

    pub fn applies_to(&self, business_type: Option<BusinessType>) -> bool {
        match (self.business_type, business_type) {
            (None, _) => true,
            (Some(rule), Some(requested)) => rule == requested,
            (Some(_), None) => false,
        }
    }
}

/// Automation rules persisted as a JSON file
#[derive(Debug)]
pub struct RuleStore {
    path: PathBuf,
    rules: Vec<AutomationRule>,
}

impl RuleStore {
    /// Open the store; a missing file is an empty store
    pub fn load(path: &Path) -> Result<Self> {
        let rules = if path.exists() {
            let content = fs::read_to_string(path)?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            rules,
        })
    }

    pub fn rules(&self) -> &[AutomationRule] {
        &self.rules
    }

    pub fn add(&mut self, rule: AutomationRule) -> Result<&AutomationRule> {
        info!("Saving rule {}: {} -> {}", rule.id, rule.trigger, rule.action);
        self.rules.push(rule);
        self.save()?;
        Ok(&self.rules[self.rules.len() - 1])
    }

    /// Remove a rule by id or unique id prefix
    pub fn remove(&mut self, id: &str) -> Result<AutomationRule> {
        let id = id.trim().to_lowercase();
        let matches: Vec<usize> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| !id.is_empty() && rule.id.to_string().starts_with(&id))
            .map(|(i, _)| i)
            .collect();
        let index = match matches.as_slice() {
            [index] => *index,
            [] => return Err(Error::RuleNotFound(id)),
            _ => {
                return Err(Error::InvalidInput(format!(
                    "rule id prefix '{}' is ambiguous",
                    id
                )))
            }
        };
        let removed = self.rules.remove(index);
        self.save()?;
        info!("Removed rule {}", removed.id);
        Ok(removed)
    }

    /// Rules that fire for an event at a business type
    pub fn matching(
        &self,
        event: &SessionEvent,
        business_type: Option<BusinessType>,
    ) -> Vec<&AutomationRule> {
        self.rules
            .iter()
            .filter(|rule| rule.applies_to(business_type) && rule.trigger.fires_on(event))
            .collect()
    }

    /// Write to a temporary file beside the store and rename it into place
    fn save(&self) -> Result<()> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent.to_path_buf()
            }
            None => PathBuf::from("."),
        };
        let mut staged = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut staged, &self.rules)?;
        staged.write_all(b"\n")?;
        staged.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_trigger_and_action() {
        assert_eq!("on-connect".parse::<Trigger>().unwrap(), Trigger::OnConnect);
        assert_eq!("On_Disconnect".parse::<Trigger>().unwrap(), Trigger::OnDisconnect);
        assert_eq!(
            "after:15".parse::<Trigger>().unwrap(),
            Trigger::AfterMinutes { minutes: 15 }
        );
        assert!("after:0".parse::<Trigger>().is_err());
        assert!("sometimes".parse::<Trigger>().is_err());

        assert_eq!("SMS".parse::<Action>().unwrap(), Action::SendSms);
        assert_eq!(
            "webhook:https://hooks.example.com/wifi".parse::<Action>().unwrap(),
            Action::Webhook { url: "https://hooks.example.com/wifi".to_string() }
        );
        assert!("webhook:ftp://x".parse::<Action>().is_err());
    }

    #[test]
    fn test_trigger_firing() {
        let after = Trigger::AfterMinutes { minutes: 30 };
        assert!(!after.fires_on(&SessionEvent::Elapsed { minutes: 29 }));
        assert!(after.fires_on(&SessionEvent::Elapsed { minutes: 30 }));
        assert!(!after.fires_on(&SessionEvent::Connected));
        assert!(Trigger::OnConnect.fires_on(&SessionEvent::Connected));
        assert!(!Trigger::OnConnect.fires_on(&SessionEvent::Disconnected));
    }

    #[test]
    fn test_store_persists_and_matches() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");

        let mut store = RuleStore::load(&path).unwrap();
        let welcome = AutomationRule::new(
            None,
            Trigger::OnConnect,
            Action::SendSms,
            "Thanks for connecting!",
        )
        .unwrap();
        let dessert = AutomationRule::new(
            Some(BusinessType::Restaurant),
            Trigger::AfterMinutes { minutes: 45 },
            Action::SendEmail,
            "Dessert is on us",
        )
        .unwrap();
        store.add(welcome.clone()).unwrap();
        store.add(dessert.clone()).unwrap();

        let reloaded = RuleStore::load(&path).unwrap();
        assert_eq!(reloaded.rules(), &[welcome.clone(), dessert.clone()]);

        let on_connect = reloaded.matching(&SessionEvent::Connected, Some(BusinessType::Hospital));
        assert_eq!(on_connect, vec![&welcome]);

        let late = reloaded.matching(
            &SessionEvent::Elapsed { minutes: 50 },
            Some(BusinessType::Restaurant),
        );
        assert_eq!(late, vec![&dessert]);
        assert!(reloaded
            .matching(&SessionEvent::Elapsed { minutes: 50 }, Some(BusinessType::Boutique))
            .is_empty());
    }

    #[test]
    fn test_remove_by_prefix() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let mut store = RuleStore::load(&path).unwrap();
        let rule =
            AutomationRule::new(None, Trigger::OnDisconnect, Action::SendEmail, "Bye").unwrap();
        let prefix = rule.id.to_string()[..8].to_string();
        store.add(rule.clone()).unwrap();

        assert!(matches!(store.remove("zzzz"), Err(Error::RuleNotFound(_))));
        assert_eq!(store.remove(&prefix).unwrap(), rule);
        assert!(RuleStore::load(&path).unwrap().rules().is_empty());
    }

    #[test]
    fn test_empty_content_rejected() {
        assert!(AutomationRule::new(None, Trigger::OnConnect, Action::SendSms, "   ").is_err());
    }

    #[test]
    fn test_parse_session_event() {
        assert_eq!("connected".parse::<SessionEvent>().unwrap(), SessionEvent::Connected);
        assert_eq!(
            "elapsed:20".parse::<SessionEvent>().unwrap(),
            SessionEvent::Elapsed { minutes: 20 }
        );
        assert!("idle".parse::<SessionEvent>().is_err());
    }
}
