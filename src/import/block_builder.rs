use crate::item_map::ItemMap;
use crate::models::{ItemBlock, RawItem};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::debug;

pub const STARTERS: &str = "Starters";
pub const BOOTS: &str = "Boots";
pub const CORE_ITEMS: &str = "Core Items";

/// Default win-rate weight used when ranking item sets
pub const DEFAULT_WEIGHT: f64 = 2.5;

/// Group raw items into ordered blocks: boots first, then everything else.
///
/// Ids are deduplicated (first occurrence wins) before grouping, and relative
/// order inside each group follows the input. Ids missing from the item map are
/// treated as non-boots.
pub fn gen_file_blocks(
    raw_items: &[RawItem],
    item_map: &ItemMap,
    position: Option<&str>,
) -> Vec<ItemBlock> {
    let ids = dedup_ids(raw_items.iter().map(|i| i.id.clone()));
    let (boots, core): (Vec<String>, Vec<String>) =
        ids.into_iter().partition(|id| item_map.is_boot(id));

    let core_label = match position {
        Some(position) => format!("{} - {}", CORE_ITEMS, position),
        None => CORE_ITEMS.to_string(),
    };

    [ItemBlock::new(BOOTS, boots), ItemBlock::new(core_label, core)]
        .into_iter()
        .filter(|b| !b.is_empty())
        .collect()
}

/// Order-preserving dedup
pub fn dedup_ids(ids: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// Tunables for item set scoring
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSettings {
    /// Multiplier applied to frequency
    pub frequency_weight: f64,
    /// Sets seen less often than this are not considered
    pub min_frequency: f64,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            frequency_weight: 1.0,
            min_frequency: 0.0,
        }
    }
}

/// Weighted combination of win rate and frequency
pub fn score(win_rate: f64, frequency: f64, weight: f64, settings: &ScoreSettings) -> f64 {
    weight * win_rate + settings.frequency_weight * frequency
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStats {
    pub win_rate: f64,
    pub frequency: f64,
}

/// A candidate item combination keyed by its JSON-encoded id set (e.g. `"[1001,[3006,3020]]"`)
#[derive(Debug, Clone, PartialEq)]
pub struct ItemSet {
    pub key: String,
    pub stats: SetStats,
}

/// Sort candidates by descending score. Equal scores keep their input order.
pub fn rank_item_sets(sets: Vec<ItemSet>, weight: f64, settings: &ScoreSettings) -> Vec<ItemSet> {
    let mut scored: Vec<(f64, ItemSet)> = sets
        .into_iter()
        .filter(|s| s.stats.frequency >= settings.min_frequency)
        .map(|s| (score(s.stats.win_rate, s.stats.frequency, weight, settings), s))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, s)| s).collect()
}

/// Take the `limit` best sets and union their ids, first occurrence first
pub fn select_top_items(
    sets: Vec<ItemSet>,
    limit: usize,
    weight: f64,
    settings: &ScoreSettings,
) -> Vec<String> {
    let ranked = rank_item_sets(sets, weight, settings);
    let ids = ranked
        .iter()
        .take(limit)
        .flat_map(|set| parse_set_key(&set.key));

    let selected = dedup_ids(ids);
    debug!("Selected {} item(s) from top {} set(s)", selected.len(), limit);
    selected
}

/// Decode a set key into item ids.
///
/// The key is a JSON value: a single id, or an array of ids where a nested array
/// lists alternatives and only its first entry is used. Malformed keys yield no ids.
pub fn parse_set_key(key: &str) -> Vec<String> {
    let value: serde_json::Value = match serde_json::from_str(key) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };

    let entries = match value {
        serde_json::Value::Array(entries) => entries,
        single => vec![single],
    };

    entries
        .into_iter()
        .filter_map(|entry| match entry {
            serde_json::Value::Array(alternatives) => alternatives.into_iter().next(),
            other => Some(other),
        })
        .filter_map(|id| match id {
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
        .collect()
}
