use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Third-party provider of champion statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "op.gg")]
    OpGg,
    #[serde(rename = "lol.qq.com")]
    LolQq,
    #[serde(rename = "murderbridge")]
    MurderBridge,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::OpGg, Source::LolQq, Source::MurderBridge];

    pub fn id(&self) -> &'static str {
        match self {
            Source::OpGg => "op.gg",
            Source::LolQq => "lol.qq.com",
            Source::MurderBridge => "murderbridge",
        }
    }

    /// Prefix used when building task identities (`<prefix>-<unit key>`)
    pub fn identity_prefix(&self) -> &'static str {
        match self {
            Source::OpGg => "opgg",
            Source::LolQq => "qq",
            Source::MurderBridge => "mr",
        }
    }

    pub fn identity(&self, unit_key: &str) -> String {
        format!("{}-{}", self.identity_prefix(), unit_key)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "op.gg" | "opgg" => Ok(Source::OpGg),
            "lol.qq.com" | "lolqq" | "qq" => Ok(Source::LolQq),
            "murderbridge" | "mr" => Ok(Source::MurderBridge),
            other => Err(format!("Unknown source: {}", other)),
        }
    }
}

/// One item entry as scraped from a source, before grouping into blocks
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    pub id: String,
    pub pick_rate: Option<f64>,
    pub win_rate: Option<f64>,
}

impl RawItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pick_rate: None,
            win_rate: None,
        }
    }

    /// Build from the textual rates sources publish ("1,234", "55.12%")
    pub fn with_rates(id: impl Into<String>, pick_rate: &str, win_rate: &str) -> Self {
        Self {
            id: id.into(),
            pick_rate: parse_rate(pick_rate),
            win_rate: parse_rate(win_rate),
        }
    }
}

/// Parse a loosely formatted numeric rate, ignoring thousands separators and `%`
pub fn parse_rate(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '%')
        .collect();
    cleaned.parse::<f64>().ok()
}

/// Per champion/position recommendation as delivered by a source
#[derive(Debug, Clone, PartialEq)]
pub struct ChampionRecommendation {
    pub source: Source,
    pub champion: String,
    pub position: String,
    pub items: Vec<RawItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub count: u32,
}

impl Item {
    /// Items never stack in recommended builds
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            count: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub items: Vec<Item>,
}

impl ItemBlock {
    pub fn new(block_type: impl Into<String>, ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            block_type: block_type.into(),
            items: ids.into_iter().map(Item::new).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Finished recommended item set for one champion and position.
///
/// The constant fields (`sortrank`, `priority`, `map`, `mode`, `type`) are fixed
/// by the game client format and cannot be changed after construction.
/// Blocks are kept exactly as given, empty ones included.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildFile {
    champion: String,
    position: String,
    title: String,
    file_name: String,
    skills: Vec<Vec<String>>,
    blocks: Vec<ItemBlock>,
}

impl BuildFile {
    pub const SORTRANK: u32 = 1;
    pub const PRIORITY: bool = false;
    pub const MAP: &'static str = "any";
    pub const MODE: &'static str = "any";
    pub const TYPE: &'static str = "custom";

    pub fn new(
        champion: impl Into<String>,
        position: impl Into<String>,
        title: impl Into<String>,
        file_name: impl Into<String>,
        skills: Vec<Vec<String>>,
        blocks: Vec<ItemBlock>,
    ) -> Self {
        Self {
            champion: champion.into(),
            position: position.into(),
            title: title.into(),
            file_name: file_name.into(),
            skills,
            blocks,
        }
    }

    pub fn champion(&self) -> &str {
        &self.champion
    }

    pub fn position(&self) -> &str {
        &self.position
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn skills(&self) -> &[Vec<String>] {
        &self.skills
    }

    pub fn blocks(&self) -> &[ItemBlock] {
        &self.blocks
    }
}
