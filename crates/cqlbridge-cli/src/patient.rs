//! Minimal Patient resource model.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;

/// FHIR administrative-gender codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

impl Gender {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

impl HumanName {
    /// Given names followed by the family name, space separated
    pub fn single_string(&self) -> String {
        self.given
            .iter()
            .map(String::as_str)
            .chain(self.family.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

impl Patient {
    pub fn new(family: &str, given: &str, birth_date: Date, gender: Gender) -> Result<Self> {
        Ok(Self {
            resource_type: "Patient".to_string(),
            id: None,
            name: vec![HumanName {
                family: Some(family.to_string()),
                given: vec![given.to_string()],
            }],
            birth_date: Some(format_birth_date(birth_date)?),
            gender: Some(gender),
        })
    }

    /// First name entry rendered as a single string
    pub fn display_name(&self) -> String {
        self.name
            .first()
            .map(HumanName::single_string)
            .unwrap_or_default()
    }
}

pub fn parse_birth_date(value: &str) -> Result<Date> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(value, format)
        .with_context(|| format!("Invalid birth date \"{value}\". Expected format: YYYY-MM-DD"))
}

fn format_birth_date(date: Date) -> Result<String> {
    let format = format_description!("[year]-[month]-[day]");
    date.format(format).context("Failed to format birth date")
}
