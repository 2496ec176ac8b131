use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::ssl_probe::SslProber;
use crate::whois::RegistrationProber;

/// Canonical feature order; the model was trained against this layout.
pub const FEATURE_NAMES: [&str; 9] = [
    "having_IP_Address",
    "URL_Length",
    "Shortining_Service",
    "having_At_Symbol",
    "double_slash_redirecting",
    "Prefix_Suffix",
    "having_Sub_Domain",
    "SSLfinal_State",
    "Domain_registeration_length",
];

/// Width of the model input. Slots beyond the nine computed features are a
/// schema gap inherited from training: the extractor fills them with the
/// constant placeholder, it does not compute them.
pub const MODEL_INPUT_WIDTH: usize = 30;
pub const PLACEHOLDER: f64 = -1.0;

/// The nine named features in canonical order. Every key is always present;
/// probe failures land as sentinel values, never as missing entries.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap {
    entries: Vec<(&'static str, i64)>,
}

impl FeatureMap {
    fn new(values: [i64; FEATURE_NAMES.len()]) -> Self {
        Self {
            entries: FEATURE_NAMES.iter().copied().zip(values).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        self.entries.iter().copied()
    }

    /// Orders the features canonically and pads to the full model width.
    pub fn to_model_vector(&self) -> Vec<f64> {
        let mut vector: Vec<f64> = self
            .entries
            .iter()
            .map(|(_, value)| *value as f64)
            .collect();
        vector.resize(MODEL_INPUT_WIDTH, PLACEHOLDER);
        vector
    }
}

impl Serialize for FeatureMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Derives the feature map for a URL. Lexical features are pure string
/// functions; the two probe-backed features reflect live network state.
pub struct FeatureExtractor {
    ssl: Arc<dyn SslProber>,
    registration: Arc<dyn RegistrationProber>,
}

impl FeatureExtractor {
    pub fn new(ssl: Arc<dyn SslProber>, registration: Arc<dyn RegistrationProber>) -> Self {
        Self { ssl, registration }
    }

    pub fn extract(&self, url: &str) -> FeatureMap {
        let dots = url.matches('.').count();
        FeatureMap::new([
            bool_code(has_ipv4_literal(url)),
            url.chars().count() as i64,
            bool_code(url.contains("bit.ly") || url.contains("t.co")),
            bool_code(url.contains('@')),
            bool_code(double_slash_after_prefix(url)),
            bool_code(url.contains('-')),
            match dots {
                d if d > 2 => 1,
                2 => 0,
                _ => -1,
            },
            self.ssl.check_ssl_state(url),
            self.registration.check_domain_registration_length(url),
        ])
    }
}

fn bool_code(hit: bool) -> i64 {
    if hit {
        1
    } else {
        -1
    }
}

fn has_ipv4_literal(url: &str) -> bool {
    static IPV4: OnceLock<Regex> = OnceLock::new();
    IPV4.get_or_init(|| {
        Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").expect("valid IPv4 pattern")
    })
    .is_match(url)
}

// The offset is a fixed 7 characters, sized to an `http://` prefix. For
// `https://` this starts the scan one character into the authority; the
// model was trained with that behavior, so it stays.
fn double_slash_after_prefix(url: &str) -> bool {
    let tail: String = url.chars().skip(7).collect();
    tail.contains("//")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubSsl(i64);

    impl SslProber for StubSsl {
        fn check_ssl_state(&self, _url: &str) -> i64 {
            self.0
        }
    }

    struct StubRegistration(i64);

    impl RegistrationProber for StubRegistration {
        fn check_domain_registration_length(&self, _url: &str) -> i64 {
            self.0
        }
    }

    fn extractor_with(ssl: i64, registration: i64) -> FeatureExtractor {
        FeatureExtractor::new(
            Arc::new(StubSsl(ssl)),
            Arc::new(StubRegistration(registration)),
        )
    }

    fn extract(url: &str) -> FeatureMap {
        extractor_with(1, 1).extract(url)
    }

    #[test]
    fn all_nine_keys_present_in_canonical_order() {
        let map = extract("http://example.com");
        let keys: Vec<&str> = map.iter().map(|(name, _)| name).collect();
        assert_eq!(keys, FEATURE_NAMES);
    }

    #[test]
    fn url_length_counts_characters_not_bytes() {
        let url = "http://пример.com";
        assert_eq!(
            extract(url).get("URL_Length"),
            Some(url.chars().count() as i64)
        );
    }

    #[test]
    fn dotted_quad_flags_ip_address() {
        assert_eq!(extract("http://192.168.1.1/x").get("having_IP_Address"), Some(1));
        assert_eq!(extract("http://example.com").get("having_IP_Address"), Some(-1));
        // No range validation on the groups.
        assert_eq!(extract("http://999.999.999.999/").get("having_IP_Address"), Some(1));
    }

    #[test]
    fn shortener_allowlist_is_narrow() {
        assert_eq!(extract("http://bit.ly/abc").get("Shortining_Service"), Some(1));
        assert_eq!(extract("http://t.co/xyz").get("Shortining_Service"), Some(1));
        assert_eq!(extract("http://tinyurl.com/q").get("Shortining_Service"), Some(-1));
    }

    #[test]
    fn at_symbol_anywhere() {
        assert_eq!(extract("http://a@b.com").get("having_At_Symbol"), Some(1));
        assert_eq!(extract("http://b.com").get("having_At_Symbol"), Some(-1));
    }

    #[test]
    fn double_slash_uses_fixed_seven_char_offset() {
        assert_eq!(
            extract("http://evil.com//x").get("double_slash_redirecting"),
            Some(1)
        );
        // The scheme's own `//` sits inside the skipped prefix.
        assert_eq!(
            extract("http://evil.com/x").get("double_slash_redirecting"),
            Some(-1)
        );
        // For https the second slash is the 8th character, past the offset,
        // but a lone slash still does not match.
        assert_eq!(
            extract("https://example.com").get("double_slash_redirecting"),
            Some(-1)
        );
        assert_eq!(
            extract("https://example.com//path").get("double_slash_redirecting"),
            Some(1)
        );
    }

    #[test]
    fn dash_marks_prefix_suffix() {
        assert_eq!(extract("http://my-bank.com").get("Prefix_Suffix"), Some(1));
        assert_eq!(extract("http://mybank.com").get("Prefix_Suffix"), Some(-1));
    }

    #[test]
    fn subdomain_buckets_count_dots_in_whole_url() {
        assert_eq!(extract("http://a.b.com").get("having_Sub_Domain"), Some(0));
        assert_eq!(extract("http://a.b.c.com").get("having_Sub_Domain"), Some(1));
        assert_eq!(extract("http://localhost").get("having_Sub_Domain"), Some(-1));
    }

    #[test]
    fn probe_codes_flow_through_unchanged() {
        let map = extractor_with(-1, 0).extract("http://example.com");
        assert_eq!(map.get("SSLfinal_State"), Some(-1));
        assert_eq!(map.get("Domain_registeration_length"), Some(0));
    }

    #[test]
    fn model_vector_is_padded_to_full_width() {
        let map = extract("http://a.b.c.com/path");
        let vector = map.to_model_vector();
        assert_eq!(vector.len(), MODEL_INPUT_WIDTH);
        for (i, (_, value)) in map.iter().enumerate() {
            assert_eq!(vector[i], value as f64);
        }
        assert!(vector[FEATURE_NAMES.len()..]
            .iter()
            .all(|&slot| slot == PLACEHOLDER));
    }

    #[test]
    fn feature_map_serializes_in_canonical_order() {
        let json = serde_json::to_string(&extract("http://example.com")).unwrap();
        let having_ip = json.find("having_IP_Address").unwrap();
        let registration = json.find("Domain_registeration_length").unwrap();
        assert!(having_ip < registration);
    }
}
