//! Energy Performance Certificate lookup.
//!
//! Mocked: no register credentials are wired in, so searches answer from a
//! fixed data set keyed by postcode.

use serde::{Deserialize, Serialize};

/// Postcode that has mock certificates, in normalized form.
const MOCK_POSTCODE: &str = "SW1A0AA";

/// One row of a domestic EPC search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EpcSearchRow {
    pub address: String,
    pub lmk_key: String,
    pub current_energy_rating: String,
    pub potential_energy_rating: String,
    pub postcode: String,
    pub uprn: String,
}

/// A full domestic certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EpcCertificate {
    pub address: String,
    pub local_authority_label: String,
    pub postcode: String,
    pub current_energy_rating: String,
    pub potential_energy_rating: String,
    pub current_energy_efficiency: u32,
    pub potential_energy_efficiency: u32,
    pub property_type: String,
    pub built_form: String,
    pub total_floor_area: String,
    pub lodgement_date: String,
    pub expiry_date: String,
    pub lmk_key: String,
}

/// Uppercase with all whitespace removed, e.g. `"sw1a 0aa"` → `"SW1A0AA"`.
pub fn normalize_postcode(postcode: &str) -> String {
    postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn search_epcs(postcode: &str) -> Vec<EpcSearchRow> {
    tracing::debug!(postcode = %postcode, "Searching EPCs");
    if normalize_postcode(postcode) != MOCK_POSTCODE {
        return Vec::new();
    }

    let row = |flat: u8, lmk_key: &str, current: &str, potential: &str, uprn: &str| EpcSearchRow {
        address: format!("FLAT {}, 10 DOWNING STREET, LONDON, SW1A 0AA", flat),
        lmk_key: lmk_key.to_string(),
        current_energy_rating: current.to_string(),
        potential_energy_rating: potential.to_string(),
        postcode: "SW1A 0AA".to_string(),
        uprn: uprn.to_string(),
    };
    vec![
        row(1, "1234-5678-9012-3456-7890", "c", "b", "100023336956"),
        row(2, "0987-6543-2109-8765-4321", "d", "c", "100023336957"),
    ]
}

pub fn get_certificate(lmk_key: &str) -> EpcCertificate {
    tracing::debug!(lmk_key = %lmk_key, "Fetching EPC certificate");
    EpcCertificate {
        address: "FLAT 1, 10 DOWNING STREET, LONDON, SW1A 0AA".to_string(),
        local_authority_label: "City of Westminster".to_string(),
        postcode: "SW1A 0AA".to_string(),
        current_energy_rating: "c".to_string(),
        potential_energy_rating: "b".to_string(),
        current_energy_efficiency: 72,
        potential_energy_efficiency: 85,
        property_type: "Flat".to_string(),
        built_form: "Mid-terrace".to_string(),
        total_floor_area: "80".to_string(),
        lodgement_date: "2023-04-01".to_string(),
        expiry_date: "2033-04-01".to_string(),
        lmk_key: lmk_key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_postcode() {
        assert_eq!(normalize_postcode(" sw1a 0aa "), "SW1A0AA");
        assert_eq!(normalize_postcode("BN2\t1ET"), "BN21ET");
    }

    #[test]
    fn test_search_matches_any_spacing() {
        for postcode in ["SW1A 0AA", "sw1a0aa", " Sw1A  0aA"] {
            let rows = search_epcs(postcode);
            assert_eq!(rows.len(), 2, "{postcode:?}");
        }
        assert_eq!(search_epcs("SW1A 0AA")[1].lmk_key, "0987-6543-2109-8765-4321");
    }

    #[test]
    fn test_search_unknown_postcode_is_empty() {
        assert!(search_epcs("BN2 1ET").is_empty());
        assert!(search_epcs("").is_empty());
    }

    #[test]
    fn test_certificate_echoes_key_and_uses_kebab_case() {
        let cert = get_certificate("ABCD-1");
        assert_eq!(cert.lmk_key, "ABCD-1");

        let json = serde_json::to_value(&cert).unwrap();
        assert_eq!(json["lmk-key"], "ABCD-1");
        assert_eq!(json["current-energy-efficiency"], 72);
    }
}
