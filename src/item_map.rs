use crate::http::{get_json, Fetcher, ImportCause};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

/// Reference metadata for a single item
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemInfo {
    pub name: String,
    pub is_boot: bool,
    /// Items this one upgrades into
    pub into: Vec<String>,
    /// Components this one is built from
    pub from: Vec<String>,
    pub tags: Vec<String>,
}

/// Read-only lookup table of item ids to metadata.
///
/// Shared across every concurrent unit of an import run behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ItemMap {
    items: HashMap<String, ItemInfo>,
}

impl ItemMap {
    pub fn get(&self, id: &str) -> Option<&ItemInfo> {
        self.items.get(id)
    }

    /// Unknown ids are never boots
    pub fn is_boot(&self, id: &str) -> bool {
        self.items.get(id).map(|i| i.is_boot).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<(String, ItemInfo)> for ItemMap {
    fn from_iter<T: IntoIterator<Item = (String, ItemInfo)>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DdragonItems {
    data: HashMap<String, DdragonItem>,
}

#[derive(Debug, Deserialize)]
struct DdragonItem {
    #[serde(default)]
    name: String,
    #[serde(default)]
    into: Vec<String>,
    #[serde(default)]
    from: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
}

pub const DDRAGON_URL: &str = "https://ddragon.leagueoflegends.com";

/// Latest game version published by Data Dragon
pub async fn fetch_latest_version(fetcher: &dyn Fetcher) -> Result<String, ImportCause> {
    let versions: Vec<String> =
        get_json(fetcher, &format!("{}/api/versions.json", DDRAGON_URL)).await?;
    versions
        .into_iter()
        .next()
        .ok_or_else(|| ImportCause::Parse("Data Dragon returned no versions".to_string()))
}

/// Load the item reference map from Data Dragon's `item.json`
pub async fn fetch_item_map(
    fetcher: &dyn Fetcher,
    version: &str,
    language: &str,
) -> Result<ItemMap, ImportCause> {
    let url = format!(
        "{}/cdn/{}/data/{}/item.json",
        DDRAGON_URL, version, language
    );
    let payload: DdragonItems = get_json(fetcher, &url).await?;
    let map = parse_item_map(payload);
    info!("Loaded {} items for version {}", map.len(), version);
    Ok(map)
}

fn parse_item_map(payload: DdragonItems) -> ItemMap {
    payload
        .data
        .into_iter()
        .map(|(id, item)| {
            let is_boot = item.tags.iter().any(|t| t == "Boots");
            (
                id,
                ItemInfo {
                    name: item.name,
                    is_boot,
                    into: item.into,
                    from: item.from,
                    tags: item.tags,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_map_flags_boots_by_tag() {
        let payload: DdragonItems = serde_json::from_str(
            r#"{"data":{
                "1001":{"name":"Boots","into":["3006"],"tags":["Boots"]},
                "3089":{"name":"Rabadon's Deathcap","from":["1058"],"tags":["SpellDamage"]}
            }}"#,
        )
        .unwrap();

        let map = parse_item_map(payload);

        assert!(map.is_boot("1001"));
        assert!(!map.is_boot("3089"));
        assert!(!map.is_boot("9999"));
        assert_eq!(map.get("1001").unwrap().into, vec!["3006".to_string()]);
        assert_eq!(map.get("3089").unwrap().from, vec!["1058".to_string()]);
    }
}
