//! Reverse-geocoder records and the location name built from them

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use crate::country::CountryAbbreviations;
use crate::printable::Transliterator;

/// Properties of one reverse-geocoding feature. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GeodataRecord {
    pub city: Option<String>,
    pub district: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    /// Pre-formatted name, sometimes down to street level.
    pub formatted: Option<String>,
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Deserialize)]
struct GeocodeFeature {
    #[serde(default)]
    properties: GeodataRecord,
}

impl GeodataRecord {
    /// Parse a bare properties object.
    pub fn from_properties_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("parsing geodata properties")
    }

    /// Parse a full reverse-geocoding response and take its first feature.
    ///
    /// Returns `Ok(None)` when the response has no features (open ocean).
    pub fn from_response_json(json: &str) -> Result<Option<Self>> {
        let response: GeocodeResponse =
            serde_json::from_str(json).context("parsing reverse geocoding response")?;
        Ok(response.features.into_iter().next().map(|f| f.properties))
    }

    fn localities(&self) -> [Option<&str>; 3] {
        [self.city.as_deref(), self.district.as_deref(), self.county.as_deref()]
    }

    fn regions(&self) -> [Option<&str>; 2] {
        [self.state.as_deref(), self.region.as_deref()]
    }

    fn fallback_name(&self) -> Option<&str> {
        [self.formatted.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|name| !name.is_empty())
    }
}

/// Display-ready parts of a location name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoComponents {
    pub locality: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub fallback_name: Option<String>,
}

impl GeoComponents {
    /// Pick and transliterate the parts of `record` worth showing.
    pub fn from_record(
        record: &GeodataRecord,
        translit: &Transliterator<'_>,
        abbreviations: &CountryAbbreviations,
        fallback: char,
    ) -> Self {
        let locality = pick_printable(&record.localities(), translit, fallback);
        let region = pick_printable(&record.regions(), translit, fallback);

        let country = record
            .country
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(|name| translit.make_printable(abbreviations.abbreviate(name), true, fallback))
            .filter(|name| !name.is_empty());

        let fallback_name = record
            .fallback_name()
            .map(|name| translit.make_printable(name, true, fallback))
            .filter(|name| !name.is_empty());

        Self {
            locality,
            region,
            country,
            fallback_name,
        }
    }

    /// Join the usable parts with ", ", or fall back to the pre-formatted name.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.locality, &self.region, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect();

        if !parts.is_empty() {
            let name = parts.join(", ");
            debug!("Using location name from components: {}", name);
            return Some(name);
        }

        if let Some(name) = &self.fallback_name {
            debug!("Using formatted location name: {}", name);
            return Some(name.clone());
        }

        None
    }
}

/// First candidate printable without substitution, else the first printable
/// with it. Candidates that cannot be printed either way are skipped.
fn pick_printable(
    candidates: &[Option<&str>],
    translit: &Transliterator<'_>,
    fallback: char,
) -> Option<String> {
    for allow_substitution in [false, true] {
        let found = candidates
            .iter()
            .flatten()
            .find(|text| !text.is_empty() && translit.is_fully_printable(text, allow_substitution));

        if let Some(text) = found {
            let printable = translit.make_printable(text, allow_substitution, fallback);
            if !printable.is_empty() {
                return Some(printable);
            }
        }
    }
    None
}

/// Build the name shown under the distance readout, if any part is usable.
pub fn build_location_name(
    record: &GeodataRecord,
    translit: &Transliterator<'_>,
    abbreviations: &CountryAbbreviations,
    fallback: char,
) -> Option<String> {
    GeoComponents::from_record(record, translit, abbreviations, fallback).display_name()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::AsciiCoverage;
    use crate::printable::DEFAULT_FALLBACK;

    fn name_for(record: &GeodataRecord) -> Option<String> {
        let translit = Transliterator::new(&AsciiCoverage);
        build_location_name(record, &translit, CountryAbbreviations::builtin(), DEFAULT_FALLBACK)
    }

    fn record(pairs: &[(&str, &str)]) -> GeodataRecord {
        let object: serde_json::Map<String, serde_json::Value> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        GeodataRecord::from_properties_json(&serde_json::Value::Object(object).to_string()).unwrap()
    }

    #[test]
    fn joins_locality_region_and_country() {
        let r = record(&[("city", "Denver"), ("state", "Colorado"), ("country", "United States")]);
        assert_eq!(name_for(&r).as_deref(), Some("Denver, Colorado, USA"));
    }

    #[test]
    fn unmapped_country_passes_through() {
        let r = record(&[("country", "Canada")]);
        assert_eq!(name_for(&r).as_deref(), Some("Canada"));
    }

    #[test]
    fn prefers_a_field_that_needs_no_substitution() {
        // The city needs transliteration but the district does not
        let r = record(&[("city", "M\u{00FC}nchen"), ("district", "Altstadt"), ("country", "Germany")]);
        assert_eq!(name_for(&r).as_deref(), Some("Altstadt, Germany"));
    }

    #[test]
    fn falls_back_to_substitution_in_priority_order() {
        let r = record(&[("district", "\u{0160}i\u{0161}ka"), ("county", "Mari\u{00E1}nsk\u{00E9}")]);
        assert_eq!(name_for(&r).as_deref(), Some("Siska"));
    }

    #[test]
    fn skips_fields_that_cannot_be_printed() {
        let r = record(&[("city", "\u{6771}\u{4EAC}"), ("state", "Tokyo"), ("country", "Japan")]);
        assert_eq!(name_for(&r).as_deref(), Some("Tokyo, Japan"));
    }

    #[test]
    fn country_is_transliterated_with_placeholder() {
        let r = record(&[("country", "\u{4E2D}\u{56FD}")]);
        assert_eq!(name_for(&r).as_deref(), Some("??"));
    }

    #[test]
    fn uses_formatted_then_name_when_no_components() {
        let r = record(&[("formatted", "North Pacific Ocean"), ("name", "Pacific")]);
        assert_eq!(name_for(&r).as_deref(), Some("North Pacific Ocean"));

        let r = record(&[("name", "Mar de Tasman")]);
        assert_eq!(name_for(&r).as_deref(), Some("Mar de Tasman"));
    }

    #[test]
    fn empty_fields_count_as_absent() {
        let r = record(&[("city", ""), ("state", ""), ("formatted", "Gulf of Mexico")]);
        assert_eq!(name_for(&r).as_deref(), Some("Gulf of Mexico"));
        assert_eq!(name_for(&GeodataRecord::default()), None);
    }

    #[test]
    fn parses_full_response_and_ignores_unknown_keys() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"city": "Lima", "country": "Peru", "lat": -12.04}},
                {"type": "Feature", "properties": {"city": "Callao"}}
            ]
        }"#;
        let r = GeodataRecord::from_response_json(json).unwrap().unwrap();
        assert_eq!(r.city.as_deref(), Some("Lima"));
        assert_eq!(r.country.as_deref(), Some("Peru"));
    }

    #[test]
    fn empty_response_has_no_record() {
        assert_eq!(GeodataRecord::from_response_json(r#"{"features": []}"#).unwrap(), None);
        assert!(GeodataRecord::from_response_json("not json").is_err());
    }
}
