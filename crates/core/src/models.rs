use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Discovered nodes, keyed by base address (scheme + host, plus an explicit
/// non-default port when the node advertised one) with the device's friendly
/// name as the value.
pub type NodeMap = HashMap<String, String>;

/// Identity extracted from a device description document.
///
/// Ephemeral: used to decide whether a discovered device belongs to the
/// SenseStack family and to label it in the node map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceDescription {
    pub manufacturer: String,
    pub friendly_name: String,
}

/// Point-in-time status snapshot from a node's `/getNodeInfo` endpoint.
///
/// Field names mirror the wire payload exactly. Never cached; callers fetch a
/// fresh snapshot per query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub name: String,
    pub uuid: String,
    pub lat: f64,
    pub long: f64,
    pub current_endpoint: String,
    pub current_token: String,
    pub latest_post_reply: String,
    pub update_interval: u64,
    pub uptime: u64,
    pub connected_sensors: u32,
}

impl NodeInfo {
    /// Display form of the upload token: first 5 and last 5 characters with
    /// the middle elided. Tokens shorter than 10 characters are shown whole
    /// rather than sliced.
    pub fn redacted_token(&self) -> String {
        let chars: Vec<char> = self.current_token.chars().collect();
        if chars.len() < 10 {
            return self.current_token.clone();
        }
        let head: String = chars[..5].iter().collect();
        let tail: String = chars[chars.len() - 5..].iter().collect();
        format!("{}......{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_with_token(token: &str) -> NodeInfo {
        NodeInfo {
            name: "garden-node".to_string(),
            uuid: "3b241101-e2bb-4255-8caf-4136c566a962".to_string(),
            lat: 51.5072,
            long: -0.1276,
            current_endpoint: "https://ingest.example.org/v1/readings".to_string(),
            current_token: token.to_string(),
            latest_post_reply: "200 OK".to_string(),
            update_interval: 60,
            uptime: 86400,
            connected_sensors: 4,
        }
    }

    #[test]
    fn test_redacted_token_long() {
        let node = node_with_token("abcdefghijkl");
        assert_eq!(node.redacted_token(), "abcde......hijkl");
    }

    #[test]
    fn test_redacted_token_at_boundary() {
        // Exactly 10 characters: slicing is safe and produces the elided form.
        let node = node_with_token("abcdefghij");
        assert_eq!(node.redacted_token(), "abcde......fghij");
    }

    #[test]
    fn test_redacted_token_below_boundary() {
        // 9 characters and shorter are shown whole.
        let node = node_with_token("abcdefghi");
        assert_eq!(node.redacted_token(), "abcdefghi");

        let node = node_with_token("abcdefgh");
        assert_eq!(node.redacted_token(), "abcdefgh");
    }

    #[test]
    fn test_redacted_token_empty() {
        let node = node_with_token("");
        assert_eq!(node.redacted_token(), "");
    }

    #[test]
    fn test_node_info_decode() {
        let json = r#"{
            "name": "roof-node",
            "uuid": "9f8b7c6d-5e4f-4a3b-2c1d-0e9f8a7b6c5d",
            "lat": 13.7563,
            "long": 100.5018,
            "currentEndpoint": "https://ingest.example.org/v1/readings",
            "currentToken": "4f3c2b1a09876543210f",
            "latestPostReply": "200 OK",
            "updateInterval": 120,
            "uptime": 3600,
            "connectedSensors": 3
        }"#;

        let info: NodeInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.name, "roof-node");
        assert_eq!(info.lat, 13.7563);
        assert_eq!(info.current_endpoint, "https://ingest.example.org/v1/readings");
        assert_eq!(info.latest_post_reply, "200 OK");
        assert_eq!(info.update_interval, 120);
        assert_eq!(info.uptime, 3600);
        assert_eq!(info.connected_sensors, 3);
    }
}
