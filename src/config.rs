use serde::Deserialize;

/// Client configuration, constructed once at startup and read-only after.
///
/// Host applications typically deserialize this straight out of their own
/// configuration tree; [`Config::new`] and the `with_*` helpers cover
/// programmatic construction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub api_key: String,
    /// Data center code, e.g. `us6`. Must match `us1`..`us16`.
    pub dc: String,
    /// Default audience id used by the list-scoped convenience methods.
    #[serde(default)]
    pub list_id: String,
    /// When set, the "expected" 400/404/422 responses raise instead of
    /// resolving to an empty result.
    #[serde(default)]
    pub debug: bool,
    /// Store metadata carried for the host application; not used by the
    /// request logic.
    #[serde(default)]
    pub store: Option<StoreConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub currency: String,
}

impl Config {
    pub fn new<S: Into<String>>(api_key: S, dc: S) -> Self {
        Self {
            api_key: api_key.into(),
            dc: dc.into(),
            ..Default::default()
        }
    }

    pub fn with_list_id<S: Into<String>>(mut self, list_id: S) -> Self {
        self.list_id = list_id.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Whether `dc` is a code Mailchimp actually shards accounts onto.
    pub(crate) fn has_valid_dc(&self) -> bool {
        let Some(digits) = self.dc.strip_prefix("us") else {
            return false;
        };
        if digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        matches!(digits.parse::<u8>(), Ok(1..=16))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_dc(dc: &str) -> Config {
        Config::new("key", dc)
    }

    #[test]
    fn accepts_us1_through_us16() {
        for dc in ["us1", "us2", "us6", "us10", "us16"] {
            assert!(config_with_dc(dc).has_valid_dc(), "{dc} should be valid");
        }
    }

    #[test]
    fn rejects_out_of_range_and_foreign_codes() {
        for dc in ["us0", "us17", "eu1", "us", "us1x", "US6", "us01", "us+1", ""] {
            assert!(!config_with_dc(dc).has_valid_dc(), "{dc} should be invalid");
        }
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"api_key": "secret", "dc": "us6"}"#).unwrap();
        assert!(config.list_id.is_empty());
        assert!(!config.debug);
        assert!(config.store.is_none());
    }

    #[test]
    fn deserializes_store_metadata() {
        let config: Config = serde_json::from_str(
            r#"{
                "api_key": "secret",
                "dc": "us6",
                "list_id": "abc123",
                "store": {"id": "shop-1", "name": "Shop", "currency": "EUR"}
            }"#,
        )
        .unwrap();
        let store = config.store.unwrap();
        assert_eq!(store.id, "shop-1");
        assert_eq!(store.currency, "EUR");
        assert!(store.domain.is_empty());
    }
}
