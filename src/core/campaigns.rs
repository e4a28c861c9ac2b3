//! Operator-maintained metadata for each promotional video.
//!
//! The metadata cannot be derived from the comment exports, so it lives in
//! a YAML table keyed by the campaign-content label (the export's file
//! stem):
//!
//! ```yaml
//! "《HYPER AI》小红书个体号-云南风光-AI生成":
//!   publish_date: "2024-03-29"
//!   url: "https://www.xiaohongshu.com/explore/660675a0000000001a00e578"
//!   location: 云南
//!   category: 自然景观
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CampaignMetadata {
    pub publish_date: String,
    pub url: String,
    pub location: String,
    pub category: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CampaignTable {
    entries: BTreeMap<String, CampaignMetadata>,
}

impl CampaignTable {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn get(&self, label: &str) -> Option<&CampaignMetadata> {
        self.entries.get(label)
    }

    pub fn insert(&mut self, label: impl Into<String>, metadata: CampaignMetadata) {
        self.entries.insert(label.into(), metadata);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_label_keyed_table() {
        let yaml = r#"
"《本溪文旅》抖音官号-城市风光宣传-AI生成":
  publish_date: "2024-07-11"
  url: "https://www.douyin.com/video/7390364835101330703"
  location: 辽宁
  category: 自然景观
"#;
        let table = CampaignTable::from_yaml(yaml).unwrap();
        assert_eq!(table.len(), 1);
        let meta = table.get("《本溪文旅》抖音官号-城市风光宣传-AI生成").unwrap();
        assert_eq!(meta.publish_date, "2024-07-11");
        assert_eq!(meta.location, "辽宁");
        assert!(table.get("unknown").is_none());
    }
}
