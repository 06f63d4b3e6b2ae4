use super::{ImportContext, SourceAdapter, UnitRunner};
use crate::html::{attr, segments, slice_between, strip_tags, tag_blocks};
use crate::http::{Fetcher, ImportCause};
use crate::import::block_builder::gen_file_blocks;
use crate::import::cancellation::CancellationRegistry;
use crate::import::types::{ImportError, UnitOutcome};
use crate::item_map::ItemMap;
use crate::models::{BuildFile, ChampionRecommendation, RawItem, Source};
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tokio::sync::OnceCell;
use tracing::{debug, info};

const OPGG_URL: &str = "https://www.op.gg";

/// Champion with the positions OP.GG has statistics for
#[derive(Debug, Clone, PartialEq)]
struct RosterEntry {
    key: String,
    name: String,
    positions: Vec<String>,
}

/// Scrapes item and skill tables from OP.GG statistics pages.
///
/// One unit per (champion, position); rows are used in the order the site ranks them.
pub struct OpGg {
    fetcher: Arc<dyn Fetcher>,
    runner: UnitRunner,
    /// Statistics page of this run; version and roster are read from it
    statistics: OnceCell<String>,
}

impl OpGg {
    pub fn new(fetcher: Arc<dyn Fetcher>, registry: Arc<CancellationRegistry>) -> Self {
        Self {
            fetcher,
            runner: UnitRunner::new(registry),
            statistics: OnceCell::new(),
        }
    }

    async fn statistics_page(&self) -> Result<&str, ImportError> {
        let identity = self.runner.identity("stats");
        let url = Self::statistics_url();
        let page = self
            .statistics
            .get_or_try_init(|| self.runner.call(&identity, self.fetcher.get_text(&url)))
            .await?;
        Ok(page.as_str())
    }

    fn statistics_url() -> String {
        format!("{}/champion/statistics", OPGG_URL)
    }

    fn items_url(champion: &str, position: &str) -> String {
        format!("{}/champion/{}/statistics/{}/item", OPGG_URL, champion, position)
    }

    fn skills_url(champion: &str, position: &str) -> String {
        format!("{}/champion/{}/statistics/{}/skill", OPGG_URL, champion, position)
    }

    /// Build file for one champion/position from site-ranked items
    pub fn make_build_file(
        recommendation: &ChampionRecommendation,
        version: &str,
        skills: Vec<Vec<String>>,
        item_map: &ItemMap,
    ) -> BuildFile {
        let champion = &recommendation.champion;
        let position = &recommendation.position;

        BuildFile::new(
            champion.as_str(),
            position.as_str(),
            format!("[OP.GG] {} - {}", position, version),
            format!("[OP.GG]{}-{}-{}", champion, position, version),
            skills,
            gen_file_blocks(&recommendation.items, item_map, None),
        )
    }

    async fn fetch_unit(
        &self,
        champion: &str,
        position: &str,
    ) -> Result<(Vec<RawItem>, Vec<Vec<String>>), ImportCause> {
        let items_url = Self::items_url(champion, position);
        let skills_url = Self::skills_url(champion, position);

        let (items_html, skills_html) = tokio::try_join!(
            self.fetcher.get_text(&items_url),
            self.fetcher.get_text(&skills_url),
        )?;

        Ok((parse_item_table(&items_html)?, parse_skills(&skills_html)))
    }

    async fn import_unit(
        &self,
        ctx: &ImportContext,
        champion: String,
        position: String,
    ) -> UnitOutcome {
        let identity = self.runner.identity(&format!("{}-{}", champion, position));

        let (items, skills) = self
            .runner
            .fetch(
                &ctx.dispatcher,
                &identity,
                &champion,
                self.fetch_unit(&champion, &position),
            )
            .await?;

        let recommendation = ChampionRecommendation {
            source: Source::OpGg,
            champion,
            position,
            items,
        };
        let file = Self::make_build_file(
            &recommendation,
            ctx.version.as_str(),
            skills,
            &ctx.item_map,
        );
        self.runner.write(ctx, &file).await
    }
}

#[async_trait::async_trait]
impl SourceAdapter for OpGg {
    fn source(&self) -> Source {
        Source::OpGg
    }

    async fn get_version(&self) -> Result<String, ImportError> {
        let page = self.statistics_page().await?;
        parse_version(page).ok_or_else(|| {
            ImportError::for_source(
                Source::OpGg,
                ImportCause::Parse("No version on statistics page".to_string()),
            )
        })
    }

    async fn import(&self, ctx: &ImportContext) -> Result<Vec<UnitOutcome>, ImportError> {
        let page = self.statistics_page().await?;
        let roster =
            parse_roster(page).map_err(|cause| ImportError::for_source(Source::OpGg, cause))?;

        let units = unit_pairs(&roster);
        info!(
            "OP.GG: {} champion(s), {} position(s) to import",
            roster.len(),
            units.len()
        );

        Ok(self
            .runner
            .run_units(ctx, units, |(champion, position)| async move {
                vec![self.import_unit(ctx, champion, position).await]
            })
            .await)
    }

    fn cancel(&self) {
        self.runner.cancel();
    }
}

/// Distinct (champion, position) pairs in roster order
fn unit_pairs(roster: &[RosterEntry]) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    roster
        .iter()
        .flat_map(|entry| {
            entry
                .positions
                .iter()
                .map(move |position| (entry.key.clone(), position.clone()))
        })
        .filter(|pair| seen.insert(pair.clone()))
        .collect()
}

fn position_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)champion-index__champion-item__position(?:\s[^"]*)?"[^>]*>(.*?)</div>"#)
            .expect("valid position pattern")
    })
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)version\s*:?\s*(?:<[^>]*>\s*)*(\d+\.\d+(?:\.\d+)?)")
            .expect("valid version pattern")
    })
}

fn item_image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/(\d+)\.png").expect("valid item image pattern"))
}

fn parse_version(html: &str) -> Option<String> {
    version_re().captures(html).map(|c| c[1].to_string())
}

fn parse_roster(html: &str) -> Result<Vec<RosterEntry>, ImportCause> {
    let roster: Vec<RosterEntry> = segments(html, "data-champion-key=")
        .into_iter()
        .filter_map(|card| {
            let key = attr(card, "data-champion-key")?;
            let name = attr(card, "data-champion-name").unwrap_or_else(|| key.clone());
            let positions = position_re()
                .captures_iter(card)
                .map(|c| strip_tags(&c[1]).to_lowercase())
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>();
            debug!("OP.GG roster: {} [{}]", name, positions.join(", "));
            Some(RosterEntry {
                key,
                name,
                positions,
            })
        })
        .collect();

    if roster.is_empty() {
        return Err(ImportCause::Parse(
            "No champions on statistics page".to_string(),
        ));
    }

    debug!("Parsed {} OP.GG roster entries", roster.len());
    Ok(roster)
}

/// Rows of the side item table: item image, pick count, win rate
fn parse_item_table(html: &str) -> Result<Vec<RawItem>, ImportCause> {
    let side = html
        .find("l-champion-statistics-content__side")
        .map(|i| &html[i..])
        .ok_or_else(|| ImportCause::Parse("Item table not found".to_string()))?;
    let body = slice_between(side, "<tbody", "</tbody>")
        .ok_or_else(|| ImportCause::Parse("Item table has no body".to_string()))?;

    let items = tag_blocks(body, "tr")
        .into_iter()
        .filter_map(|row| {
            let cells = tag_blocks(row, "td");
            if cells.len() < 3 {
                return None;
            }
            let src = attr(cells[0], "src")?;
            let id = item_image_re().captures(&src)?[1].to_string();
            let pick = slice_between(cells[1], "<em", "</em>")
                .map(strip_tags)
                .unwrap_or_else(|| strip_tags(cells[1]));
            let win = strip_tags(cells[2]);
            Some(RawItem::with_rates(id, &pick, &win))
        })
        .collect();

    Ok(items)
}

/// Skill orders, one list per filter entry
fn parse_skills(html: &str) -> Vec<Vec<String>> {
    let Some(start) = html.find("champion-stats__filter__item") else {
        return Vec::new();
    };

    segments(&html[start..], r#"class="champion-stats__list""#)
        .into_iter()
        .filter_map(|list| {
            let end = list.find("</ul>").unwrap_or(list.len());
            let skills: Vec<String> = tag_blocks(&list[..end], "li")
                .into_iter()
                .map(strip_tags)
                .filter(|s| !s.is_empty())
                .collect();
            (!skills.is_empty()).then_some(skills)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item_map::ItemInfo;

    const ROSTER: &str = r#"
        <div class="champion-index__version">Version : <span>10.16</span></div>
        <div class="champion-index__champion-list">
          <div class="champion-index__champion-item" data-champion-key="Ahri" data-champion-name="Ahri">
            <div class="champion-index__champion-item__positions">
              <div class="champion-index__champion-item__position"><span>Mid</span></div>
            </div>
          </div>
          <div class="champion-index__champion-item" data-champion-key="Zed" data-champion-name="Zed">
            <div class="champion-index__champion-item__position"><span>Mid</span></div>
            <div class="champion-index__champion-item__position"><span>Jungle</span></div>
          </div>
        </div>"#;

    const ITEMS: &str = r#"
        <div class="l-champion-statistics-content__main"><table><tbody><tr><td>main</td></tr></tbody></table></div>
        <div class="l-champion-statistics-content__side">
          <table class="champion-stats__table"><tbody>
            <tr><td><img src="//opgg-static.akamaized.net/images/lol/item/3020.png?image=q_auto"></td><td><em>1,234</em></td><td>55.12%</td></tr>
            <tr><td><img src="//opgg-static.akamaized.net/images/lol/item/3089.png"></td><td><em>987</em></td><td>61%</td></tr>
          </tbody></table>
        </div>"#;

    const SKILLS: &str = r#"
        <ul class="champion-stats__filter">
          <li class="champion-stats__filter__item">
            <ul class="champion-stats__list"><li class="champion-stats__list__item">Q</li><li class="champion-stats__list__item">E</li><li class="champion-stats__list__item">W</li></ul>
          </li>
        </ul>"#;

    #[test]
    fn test_parse_roster_and_version() {
        let roster = parse_roster(ROSTER).unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].key, "Ahri");
        assert_eq!(roster[0].positions, vec!["mid"]);
        assert_eq!(roster[1].name, "Zed");
        assert_eq!(roster[1].positions, vec!["mid", "jungle"]);
        assert_eq!(parse_version(ROSTER).as_deref(), Some("10.16"));

        let pairs = unit_pairs(&roster);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2], ("Zed".to_string(), "jungle".to_string()));
    }

    #[test]
    fn test_parse_roster_without_champions_is_parse_error() {
        assert!(matches!(
            parse_roster("<html></html>"),
            Err(ImportCause::Parse(_))
        ));
    }

    #[test]
    fn test_parse_item_table_keeps_site_order() {
        let items = parse_item_table(ITEMS).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].id, "3020");
        assert_eq!(items[0].pick_rate, Some(1234.0));
        assert_eq!(items[0].win_rate, Some(55.12));
        assert_eq!(items[1].id, "3089");
    }

    #[test]
    fn test_parse_skills() {
        assert_eq!(
            parse_skills(SKILLS),
            vec![vec!["Q".to_string(), "E".to_string(), "W".to_string()]]
        );
        assert!(parse_skills("<div></div>").is_empty());
    }

    #[test]
    fn test_make_build_file_for_ahri_mid() {
        let recommendation = ChampionRecommendation {
            source: Source::OpGg,
            champion: "Ahri".to_string(),
            position: "mid".to_string(),
            items: vec![RawItem::with_rates("1001", "10", "55")],
        };
        let item_map: ItemMap = [(
            "1001".to_string(),
            ItemInfo {
                is_boot: true,
                ..Default::default()
            },
        )]
        .into_iter()
        .collect();

        let file = OpGg::make_build_file(&recommendation, "10.16", vec![], &item_map);

        assert_eq!(file.champion(), "Ahri");
        assert!(file.file_name().contains("Ahri-mid"));
        assert_eq!(file.title(), "[OP.GG] mid - 10.16");
        assert!(file.blocks().iter().any(|b| !b.items.is_empty()));
    }
}
