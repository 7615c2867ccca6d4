use crate::models::{null_as_default, Validate};
use serde::{Deserialize, Serialize};

/// Server-wide DHT settings
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub dht_port: u16,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dht_bootstrap_nodes: Vec<String>,
}

impl Validate for Settings {}

impl Settings {
    /// Echo a saved update into the locally held copy
    pub fn apply(&mut self, update: &SettingUpdate) {
        match update {
            SettingUpdate::DhtPort(port) => self.dht_port = *port,
            SettingUpdate::DhtBootstrapNodes(nodes) => self.dht_bootstrap_nodes = nodes.clone(),
        }
    }
}

/// A single settings change as sent to `POST /api/settings`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingUpdate {
    DhtPort(u16),
    DhtBootstrapNodes(Vec<String>),
}

impl SettingUpdate {
    /// Form field name
    pub fn key(&self) -> &'static str {
        match self {
            SettingUpdate::DhtPort(_) => "dhtPort",
            SettingUpdate::DhtBootstrapNodes(_) => "dhtBootstrapNodes",
        }
    }

    /// Bootstrap nodes arrive one per line from user input; blank lines are dropped
    pub fn bootstrap_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        SettingUpdate::DhtBootstrapNodes(
            nodes
                .into_iter()
                .map(|node| node.as_ref().trim().to_string())
                .filter(|node| !node.is_empty())
                .collect(),
        )
    }
}

/// Response of `GET /api/info`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub version: String,
}

impl Validate for ServerInfo {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decode;

    #[test]
    fn test_settings_decode() {
        let settings: Settings = decode(
            br#"{"dhtPort": 7000, "dhtBootstrapNodes": ["19-ffaa:1:106d,[127.0.0.1]:43000"]}"#,
        )
        .expect("valid settings");
        assert_eq!(settings.dht_port, 7000);
        assert_eq!(settings.dht_bootstrap_nodes.len(), 1);
    }

    #[test]
    fn test_settings_null_nodes() {
        let settings: Settings = decode(br#"{"dhtPort": 0, "dhtBootstrapNodes": null}"#).expect("valid settings");
        assert!(settings.dht_bootstrap_nodes.is_empty());
    }

    #[test]
    fn test_settings_rejects_out_of_range_port() {
        let result: Result<Settings, _> = decode(br#"{"dhtPort": 70000, "dhtBootstrapNodes": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_apply_update() {
        let mut settings = Settings::default();
        settings.apply(&SettingUpdate::DhtPort(6881));
        settings.apply(&SettingUpdate::bootstrap_nodes(["a:1", "", "  b:2 "]));
        assert_eq!(settings.dht_port, 6881);
        assert_eq!(settings.dht_bootstrap_nodes, vec!["a:1".to_string(), "b:2".to_string()]);
    }

    #[test]
    fn test_update_keys() {
        assert_eq!(SettingUpdate::DhtPort(1).key(), "dhtPort");
        assert_eq!(SettingUpdate::DhtBootstrapNodes(vec![]).key(), "dhtBootstrapNodes");
    }
}
