//! Business types served by the captive portal and their dataset naming

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Venue category whose connection logs are analysed together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    Restaurant,
    Hospital,
    BusinessCafe,
    Boutique,
    Supermarket,
}

impl BusinessType {
    pub const ALL: [BusinessType; 5] = [
        BusinessType::Restaurant,
        BusinessType::Hospital,
        BusinessType::BusinessCafe,
        BusinessType::Boutique,
        BusinessType::Supermarket,
    ];

    /// Lower-case, underscore separated identifier used for file names
    pub fn slug(&self) -> &'static str {
        match self {
            BusinessType::Restaurant => "restaurant",
            BusinessType::Hospital => "hospital",
            BusinessType::BusinessCafe => "business_cafe",
            BusinessType::Boutique => "boutique",
            BusinessType::Supermarket => "supermarket",
        }
    }

    /// Human-readable name
    pub fn title(&self) -> &'static str {
        match self {
            BusinessType::Restaurant => "Restaurant",
            BusinessType::Hospital => "Hospital",
            BusinessType::BusinessCafe => "Business Cafe",
            BusinessType::Boutique => "Boutique",
            BusinessType::Supermarket => "Supermarket",
        }
    }

    /// Dataset file for this business type: `{data_dir}/{slug}.csv`
    pub fn dataset_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(format!("{}.csv", self.slug()))
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for BusinessType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("_");

        BusinessType::ALL
            .into_iter()
            .find(|b| b.slug() == normalized)
            .ok_or_else(|| Error::UnknownBusinessType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_label_variants() {
        assert_eq!("restaurant".parse::<BusinessType>().unwrap(), BusinessType::Restaurant);
        assert_eq!("Business Cafe".parse::<BusinessType>().unwrap(), BusinessType::BusinessCafe);
        assert_eq!("business-cafe".parse::<BusinessType>().unwrap(), BusinessType::BusinessCafe);
        assert_eq!(" SUPERMARKET ".parse::<BusinessType>().unwrap(), BusinessType::Supermarket);
        assert!("bakery".parse::<BusinessType>().is_err());
    }

    #[test]
    fn test_dataset_path_convention() {
        let path = BusinessType::BusinessCafe.dataset_path(Path::new("connection_logs"));
        assert_eq!(path, PathBuf::from("connection_logs/business_cafe.csv"));
    }

    #[test]
    fn test_slug_round_trips_for_all() {
        for b in BusinessType::ALL {
            assert_eq!(b.slug().parse::<BusinessType>().unwrap(), b);
            assert_eq!(b.title().parse::<BusinessType>().unwrap(), b);
        }
    }
}
