use super::{ImportContext, SourceAdapter, UnitRunner};
use crate::http::{get_json, Fetcher, ImportCause};
use crate::import::block_builder::gen_file_blocks;
use crate::import::cancellation::CancellationRegistry;
use crate::import::types::{ImportError, UnitOutcome};
use crate::item_map::ItemMap;
use crate::models::{BuildFile, RawItem, Source};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;
use tracing::{info, warn};

const HERO_LIST_URL: &str = "https://game.gtimg.cn/images/lol/act/img/js/heroList/hero_list.js";
const POSITIONS_URL: &str = "https://lol.qq.com/act/lbp/common/guides/guideschampion_position.js";

fn detail_url(hero_id: &str) -> String {
    format!(
        "https://lol.qq.com/act/lbp/common/guides/champDetail/champDetail_{}.js",
        hero_id
    )
}

fn code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\{"(.*)"\}"#).expect("valid embedded JSON pattern"))
}

/// Extract and parse the `{"..."}` object literal embedded in a script payload
pub fn parse_code<T: DeserializeOwned>(code: &str) -> Result<T, ImportCause> {
    let literal = code_re()
        .find(code)
        .ok_or_else(|| ImportCause::Parse("No embedded JSON object in payload".to_string()))?;
    Ok(serde_json::from_str(literal.as_str())?)
}

#[derive(Debug, Deserialize)]
struct HeroList {
    hero: Vec<Hero>,
    version: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Hero {
    hero_id: String,
    alias: String,
}

/// heroId -> position -> stats
#[derive(Debug, Deserialize)]
struct PositionPayload {
    list: BTreeMap<String, BTreeMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct DetailPayload {
    list: ChampionDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ChampionDetail {
    #[serde(rename = "championLane", default)]
    champion_lane: BTreeMap<String, Lane>,
}

#[derive(Debug, Deserialize)]
struct Lane {
    /// JSON-encoded array of item rows
    #[serde(default)]
    hold3: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HoldRow {
    itemid: Value,
    #[serde(default)]
    showrate: Value,
    #[serde(default)]
    winrate: Value,
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_lane_items(hold3: &str) -> Result<Vec<RawItem>, ImportCause> {
    let rows: Vec<HoldRow> = serde_json::from_str(hold3)?;
    Ok(rows
        .iter()
        .map(|row| {
            RawItem::with_rates(
                value_text(&row.itemid),
                &value_text(&row.showrate),
                &value_text(&row.winrate),
            )
        })
        .filter(|item| !item.id.is_empty())
        .collect())
}

/// Imports lane builds from lol.qq.com's champion guides.
///
/// One unit per champion; each unit writes one file per lane it has data for.
pub struct LolQq {
    fetcher: Arc<dyn Fetcher>,
    runner: UnitRunner,
    /// Hero list of this run; version and roster are read from it
    heroes: OnceCell<HeroList>,
}

impl LolQq {
    pub fn new(fetcher: Arc<dyn Fetcher>, registry: Arc<CancellationRegistry>) -> Self {
        Self {
            fetcher,
            runner: UnitRunner::new(registry),
            heroes: OnceCell::new(),
        }
    }

    async fn hero_list(&self) -> Result<&HeroList, ImportError> {
        let identity = self.runner.identity("stats");
        self.heroes
            .get_or_try_init(|| {
                self.runner
                    .call(&identity, get_json(self.fetcher.as_ref(), HERO_LIST_URL))
            })
            .await
    }

    async fn positions(&self) -> Result<PositionPayload, ImportError> {
        let identity = self.runner.identity("positions");
        self.runner
            .call(&identity, async {
                let code = self.fetcher.get_text(POSITIONS_URL).await?;
                parse_code(&code)
            })
            .await
    }

    fn make_build_file(
        alias: &str,
        position: &str,
        version: &str,
        items: &[RawItem],
        item_map: &ItemMap,
    ) -> BuildFile {
        BuildFile::new(
            alias,
            position,
            format!("[LOL.QQ.COM] {} - {}", position, version),
            format!("[LOL.QQ.COM]{}-{}-{}", alias, position, version),
            Vec::new(),
            gen_file_blocks(items, item_map, Some(position)),
        )
    }

    async fn import_champion(
        &self,
        ctx: &ImportContext,
        hero: Hero,
        positions: Vec<String>,
    ) -> Vec<UnitOutcome> {
        let identity = self.runner.identity(&hero.hero_id);
        let url = detail_url(&hero.hero_id);

        let detail = match self
            .runner
            .fetch(&ctx.dispatcher, &identity, &hero.alias, async {
                let code = self.fetcher.get_text(&url).await?;
                parse_code::<DetailPayload>(&code)
            })
            .await
        {
            Ok(payload) => payload.list,
            Err(e) => return vec![Err(e)],
        };

        let mut outcomes = Vec::new();
        for position in positions {
            let Some(hold3) = detail
                .champion_lane
                .get(&position)
                .and_then(|lane| lane.hold3.as_deref())
            else {
                continue;
            };

            let items = match parse_lane_items(hold3) {
                Ok(items) => items,
                Err(cause) => {
                    warn!("{} {}: bad lane data: {}", hero.alias, position, cause);
                    outcomes.push(Err(ImportError::new(
                        Source::LolQq,
                        Some(&hero.alias),
                        cause,
                    )));
                    continue;
                }
            };

            let file = Self::make_build_file(
                &hero.alias,
                &position,
                ctx.version.as_str(),
                &items,
                &ctx.item_map,
            );
            outcomes.push(self.runner.write(ctx, &file).await);
        }

        outcomes
    }
}

#[async_trait::async_trait]
impl SourceAdapter for LolQq {
    fn source(&self) -> Source {
        Source::LolQq
    }

    async fn get_version(&self) -> Result<String, ImportError> {
        Ok(self.hero_list().await?.version.clone())
    }

    async fn import(&self, ctx: &ImportContext) -> Result<Vec<UnitOutcome>, ImportError> {
        let (heroes, positions) = tokio::try_join!(self.hero_list(), self.positions())?;

        let heroes: BTreeMap<&str, &Hero> = heroes
            .hero
            .iter()
            .map(|h| (h.hero_id.as_str(), h))
            .collect();

        let mut units = Vec::new();
        let mut outcomes = Vec::new();
        for (hero_id, lanes) in positions.list {
            match heroes.get(hero_id.as_str()) {
                Some(&hero) => units.push((hero.clone(), lanes.into_keys().collect::<Vec<_>>())),
                None => outcomes.push(Err(ImportError::new(
                    Source::LolQq,
                    Some(&hero_id),
                    ImportCause::Parse(format!("Hero {} missing from hero list", hero_id)),
                ))),
            }
        }

        info!("LOL.QQ.COM: {} champion(s) to import", units.len());

        outcomes.extend(
            self.runner
                .run_units(ctx, units, |(hero, positions)| {
                    self.import_champion(ctx, hero, positions)
                })
                .await,
        );
        Ok(outcomes)
    }

    fn cancel(&self) {
        self.runner.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_code_extracts_embedded_object() {
        let code = r#"var CHAMPION_POSITION = {"list":{"103":{"mid":{}}},"gameVer":"10.16"};"#;
        let payload: PositionPayload = parse_code(code).unwrap();
        assert_eq!(
            payload.list["103"].keys().collect::<Vec<_>>(),
            vec!["mid"]
        );
    }

    #[test]
    fn test_parse_code_without_literal_is_parse_error() {
        let result = parse_code::<Value>("var nothing = [];");
        assert!(matches!(result, Err(ImportCause::Parse(_))));
    }

    #[test]
    fn test_parse_lane_items_accepts_numbers_and_strings() {
        let hold3 = r#"[{"itemid":"3089","showrate":4512,"winrate":"5230"},{"itemid":3020,"showrate":1,"winrate":2}]"#;
        let items = parse_lane_items(hold3).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "3089");
        assert_eq!(items[0].pick_rate, Some(4512.0));
        assert_eq!(items[1].id, "3020");
    }

    #[test]
    fn test_build_file_names_follow_site_prefix() {
        let items = vec![RawItem::new("3089")];
        let file = LolQq::make_build_file("Ahri", "mid", "10.16", &items, &ItemMap::default());
        assert_eq!(file.file_name(), "[LOL.QQ.COM]Ahri-mid-10.16");
        assert_eq!(file.title(), "[LOL.QQ.COM] mid - 10.16");
        assert_eq!(file.blocks()[0].block_type, "Core Items - mid");
    }
}
