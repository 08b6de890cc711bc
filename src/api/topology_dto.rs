use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopologyDto {
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    pub id: String,
    /// Marks the node as a candidate remote-compute (fog) server.
    #[serde(default)]
    pub is_server: bool,
}

/// Undirected edge. Missing bandwidth/delay fall back to the configured link defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDto {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub bandwidth_bps: Option<f64>,
    #[serde(default)]
    pub delay_ms: Option<f64>,
}
