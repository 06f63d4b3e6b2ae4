use super::{ImportContext, SourceAdapter, UnitRunner};
use crate::http::{get_json, Fetcher};
use crate::import::block_builder::{
    select_top_items, ItemSet, ScoreSettings, SetStats, BOOTS, CORE_ITEMS, DEFAULT_WEIGHT,
    STARTERS,
};
use crate::import::cancellation::CancellationRegistry;
use crate::import::types::{ImportError, UnitOutcome};
use crate::item_map::{ItemMap, DDRAGON_URL};
use crate::models::{BuildFile, ItemBlock, Source};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

const API_PREFIX: &str = "https://d23wati96d2ixg.cloudfront.net";

pub const STARTING_LIMIT: usize = 3;
pub const BUILD_LIMIT: usize = 13;

/// ARAM builds have no lane
pub const ARAM_POSITION: &str = "aram";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct General {
    up_to_date_version: String,
}

#[derive(Debug, Deserialize)]
struct ChampionIndex {
    data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ChampionStats {
    items: ItemStats,
}

/// Candidate sets keyed by JSON-encoded id lists, in payload order
#[derive(Debug, Deserialize)]
struct ItemStats {
    #[serde(default)]
    starting: Map<String, Value>,
    #[serde(default)]
    build: Map<String, Value>,
}

fn item_sets(raw: Map<String, Value>) -> Vec<ItemSet> {
    raw.into_iter()
        .filter_map(|(key, stats)| {
            let stats: SetStats = serde_json::from_value(stats).ok()?;
            Some(ItemSet { key, stats })
        })
        .collect()
}

/// Ranks ARAM item combinations from MurderBridge statistics.
///
/// One unit per champion listed by Data Dragon for the source's version.
pub struct MurderBridge {
    fetcher: Arc<dyn Fetcher>,
    runner: UnitRunner,
    settings: ScoreSettings,
    weight: f64,
}

impl MurderBridge {
    pub fn new(fetcher: Arc<dyn Fetcher>, registry: Arc<CancellationRegistry>) -> Self {
        Self {
            fetcher,
            runner: UnitRunner::new(registry),
            settings: ScoreSettings::default(),
            weight: DEFAULT_WEIGHT,
        }
    }

    /// Override the default ranking weight and settings
    pub fn with_scoring(mut self, weight: f64, settings: ScoreSettings) -> Self {
        self.weight = weight;
        self.settings = settings;
        self
    }

    async fn champions(&self, version: &str) -> Result<Vec<String>, ImportError> {
        let identity = self.runner.identity("champions");
        let url = format!(
            "{}/cdn/{}/data/en_US/champion.json",
            DDRAGON_URL, version
        );
        let index: ChampionIndex = self
            .runner
            .call(&identity, get_json(self.fetcher.as_ref(), &url))
            .await?;

        // Data Dragon keys are champion ids ("MonkeyKing")
        Ok(index.data.into_iter().map(|(id, _)| id).collect())
    }

    fn make_build_file(&self, champion: &str, stats: ItemStats, item_map: &ItemMap) -> BuildFile {
        let starters = select_top_items(
            item_sets(stats.starting),
            STARTING_LIMIT,
            self.weight,
            &self.settings,
        );
        let used: HashSet<&String> = starters.iter().collect();

        let build: Vec<String> = select_top_items(
            item_sets(stats.build),
            BUILD_LIMIT,
            self.weight,
            &self.settings,
        )
        .into_iter()
        .filter(|id| !used.contains(id))
        .collect();

        let (boots, core): (Vec<String>, Vec<String>) =
            build.into_iter().partition(|id| item_map.is_boot(id));

        debug!(
            "{}: {} starter(s), {} boot(s), {} core item(s)",
            champion,
            starters.len(),
            boots.len(),
            core.len()
        );

        // Starters and Core Items are always present, Boots only when any were picked
        let mut blocks = vec![ItemBlock::new(STARTERS, starters)];
        if !boots.is_empty() {
            blocks.push(ItemBlock::new(BOOTS, boots));
        }
        blocks.push(ItemBlock::new(CORE_ITEMS, core));

        let tag = Source::MurderBridge.id().to_uppercase();
        BuildFile::new(
            champion,
            ARAM_POSITION,
            format!("[{}] {}", tag, champion),
            format!("[ARAM] [{}] {}", tag, champion),
            Vec::new(),
            blocks,
        )
    }

    async fn import_champion(&self, ctx: &ImportContext, champion: String) -> UnitOutcome {
        let identity = self.runner.identity(&champion);
        let url = format!(
            "{}/save/{}/ARAM/{}.json",
            API_PREFIX,
            ctx.version.as_str(),
            champion
        );

        let stats: ChampionStats = self
            .runner
            .fetch(
                &ctx.dispatcher,
                &identity,
                &champion,
                get_json(self.fetcher.as_ref(), &url),
            )
            .await?;

        let file = self.make_build_file(&champion, stats.items, &ctx.item_map);
        self.runner.write(ctx, &file).await
    }
}

#[async_trait::async_trait]
impl SourceAdapter for MurderBridge {
    fn source(&self) -> Source {
        Source::MurderBridge
    }

    async fn get_version(&self) -> Result<String, ImportError> {
        let identity = self.runner.identity("version");
        let url = format!("{}/save/general.json", API_PREFIX);
        let general: General = self
            .runner
            .call(&identity, get_json(self.fetcher.as_ref(), &url))
            .await?;
        Ok(general.up_to_date_version)
    }

    async fn import(&self, ctx: &ImportContext) -> Result<Vec<UnitOutcome>, ImportError> {
        let champions = self.champions(ctx.version.as_str()).await?;
        info!("MurderBridge: {} champion(s) to import", champions.len());

        Ok(self
            .runner
            .run_units(ctx, champions, |champion| async move {
                vec![self.import_champion(ctx, champion).await]
            })
            .await)
    }

    fn cancel(&self) {
        self.runner.cancel();
    }
}
