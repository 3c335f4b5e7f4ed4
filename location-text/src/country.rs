//! Short forms for long country names
//!
//! The table is data, embedded from `data/country_abbreviations.json`. Lookups
//! are exact string matches; names without an entry pass through unchanged.

use anyhow::{Context, Result};
use log::warn;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

static BUILTIN_TABLE: &str = include_str!("../data/country_abbreviations.json");
static BUILTIN: OnceLock<CountryAbbreviations> = OnceLock::new();

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CountryAbbreviations {
    names: HashMap<String, String>,
}

impl CountryAbbreviations {
    /// Parse a JSON object of long name to short name.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parsing country abbreviation table")
    }

    /// The table shipped with the crate.
    pub fn builtin() -> &'static Self {
        BUILTIN.get_or_init(|| {
            Self::from_json(BUILTIN_TABLE).unwrap_or_else(|err| {
                warn!("Built-in country table unusable, names will not be shortened: {:#}", err);
                Self::default()
            })
        })
    }

    pub fn abbreviate<'a>(&'a self, name: &'a str) -> &'a str {
        self.names.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
