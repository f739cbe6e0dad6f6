use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub checksum: String,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModDiff {
    pub name: String,
    pub local: ModInfo,
    pub remote: ModInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModComparison {
    pub only_in_local: Vec<ModInfo>,
    pub only_in_remote: Vec<ModInfo>,
    pub different: Vec<ModDiff>,
    pub same: Vec<ModInfo>,
}
