use serde_json::Value;
use tracing::debug;

use crate::app::ports::RawReverseResponse;
use crate::domain::ResolvedAddress;

/// Address keys that can name the area, most specific first.
const AREA_KEYS: [&str; 7] = [
    "suburb",
    "neighbourhood",
    "district",
    "quarter",
    "state_district",
    "hamlet",
    "county",
];

/// Display strings usually read "street, number, neighbourhood, city, ...".
const AREA_SEGMENT_INDEX: usize = 2;
const MIN_SEGMENTS_FOR_AREA: usize = 4;

/// Trait for turning a raw reverse-geocode payload into a structured address
pub trait AddressNormalizer: Send + Sync {
    /// Best-effort extraction; never fails, missing parts come back empty.
    fn normalize(&self, raw: &RawReverseResponse) -> ResolvedAddress;
}

/// Normalizer for Nominatim-style `{display_name, address: {...}}` payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct NominatimAddressNormalizer;

impl AddressNormalizer for NominatimAddressNormalizer {
    fn normalize(&self, raw: &RawReverseResponse) -> ResolvedAddress {
        let address = raw.get("address").unwrap_or(&Value::Null);
        let display_address = raw
            .get("display_name")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let street = first_present(address, &["road", "street"]);
        let street_number = first_present(address, &["house_number"]);
        let city = first_present(address, &["city", "town", "village"]);

        let mut area = first_present(address, &AREA_KEYS);
        if area.is_empty() && !display_address.is_empty() {
            area = area_from_display_name(&display_address);
            if !area.is_empty() {
                debug!(%area, "Area taken from display name");
            }
        }

        ResolvedAddress {
            street,
            street_number,
            city,
            area,
            display_address,
        }
    }
}

/// Text of a single address component. Strings are trimmed and numbers are
/// rendered as text; blanks and any other JSON type count as missing.
fn component(address: &Value, key: &str) -> Option<String> {
    match address.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_present(address: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| component(address, key))
        .unwrap_or_default()
}

/// Guess the area from a comma-separated display string.
///
/// With four or more segments the third one (index 2) is returned; shorter
/// strings yield an empty area. The position is a convention of common
/// address formats, not something every provider or locale follows.
pub fn area_from_display_name(display_name: &str) -> String {
    let parts: Vec<&str> = display_name.split(',').map(str::trim).collect();
    if parts.len() < MIN_SEGMENTS_FOR_AREA {
        return String::new();
    }
    parts[AREA_SEGMENT_INDEX].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(raw: Value) -> ResolvedAddress {
        NominatimAddressNormalizer.normalize(&raw)
    }

    #[test]
    fn test_structured_fields() {
        let address = normalize(json!({
            "display_name": "5, Tahrir St, Garden City, Cairo, Egypt",
            "address": {
                "road": "Tahrir St",
                "house_number": "5",
                "suburb": "Garden City",
                "city": "Cairo",
                "country": "Egypt"
            }
        }));
        assert_eq!(address.street, "Tahrir St");
        assert_eq!(address.street_number, "5");
        assert_eq!(address.city, "Cairo");
        assert_eq!(address.area, "Garden City");
        assert_eq!(address.display_address, "5, Tahrir St, Garden City, Cairo, Egypt");
    }

    #[test]
    fn test_area_falls_back_to_display_segment() {
        let address = normalize(json!({
            "display_name": "Tahrir St, 5, Downtown, Cairo, Egypt",
            "address": {
                "road": "Tahrir St",
                "house_number": "5",
                "city": "Cairo"
            }
        }));
        assert_eq!(address.area, "Downtown");
    }

    #[test]
    fn test_short_display_name_leaves_area_empty() {
        let address = normalize(json!({
            "display_name": "Tahrir St, Cairo, Egypt",
            "address": { "road": "Tahrir St" }
        }));
        assert_eq!(address.area, "");
        assert_eq!(area_from_display_name("Cairo"), "");
        assert_eq!(area_from_display_name(""), "");
    }

    #[test]
    fn test_fallback_chains() {
        let address = normalize(json!({
            "address": {
                "street": "Corniche",
                "village": "Abu Rawash",
                "city": "",
                "state_district": "Giza",
                "county": "Kerdasa"
            }
        }));
        assert_eq!(address.street, "Corniche");
        assert_eq!(address.city, "Abu Rawash");
        assert_eq!(address.area, "Giza");
        assert_eq!(address.street_number, "");
        assert_eq!(address.display_address, "");
    }

    #[test]
    fn test_town_preferred_over_village() {
        let address = normalize(json!({
            "address": { "town": "6th of October", "village": "Kafr" }
        }));
        assert_eq!(address.city, "6th of October");
    }

    #[test]
    fn test_malformed_input_degrades_to_empty() {
        assert_eq!(normalize(Value::Null), ResolvedAddress::default());
        assert_eq!(normalize(json!([1, 2, 3])), ResolvedAddress::default());
        let address = normalize(json!({
            "display_name": 42,
            "address": { "road": ["a"], "house_number": 12, "city": null }
        }));
        assert_eq!(address.street, "");
        assert_eq!(address.street_number, "12");
        assert_eq!(address.city, "");
        assert_eq!(address.display_address, "");
    }
}
