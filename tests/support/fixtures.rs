// Canned upstream payloads for one small roster: Ahri (mid) on every source, Zed on OP.GG

use champ_r::item_map::{ItemInfo, ItemMap};
use champ_r::test_support::MockFetcher;

pub const OPGG_STATISTICS: &str = "https://www.op.gg/champion/statistics";
pub const OPGG_AHRI_ITEMS: &str = "https://www.op.gg/champion/Ahri/statistics/mid/item";
pub const OPGG_AHRI_SKILLS: &str = "https://www.op.gg/champion/Ahri/statistics/mid/skill";
pub const OPGG_ZED_MID_ITEMS: &str = "https://www.op.gg/champion/Zed/statistics/mid/item";
pub const OPGG_ZED_MID_SKILLS: &str = "https://www.op.gg/champion/Zed/statistics/mid/skill";
pub const OPGG_ZED_JUNGLE_ITEMS: &str = "https://www.op.gg/champion/Zed/statistics/jungle/item";
pub const OPGG_ZED_JUNGLE_SKILLS: &str =
    "https://www.op.gg/champion/Zed/statistics/jungle/skill";

pub const QQ_HERO_LIST: &str =
    "https://game.gtimg.cn/images/lol/act/img/js/heroList/hero_list.js";
pub const QQ_POSITIONS: &str =
    "https://lol.qq.com/act/lbp/common/guides/guideschampion_position.js";
pub const QQ_AHRI_DETAIL: &str =
    "https://lol.qq.com/act/lbp/common/guides/champDetail/champDetail_103.js";

pub const MR_GENERAL: &str = "https://d23wati96d2ixg.cloudfront.net/save/general.json";
pub const MR_CHAMPIONS: &str =
    "https://ddragon.leagueoflegends.com/cdn/10.16.1/data/en_US/champion.json";
pub const MR_AHRI: &str = "https://d23wati96d2ixg.cloudfront.net/save/10.16.1/ARAM/Ahri.json";

const ROSTER_HTML: &str = r#"
<div class="champion-index__version">Version : <span>10.16</span></div>
<div class="champion-index__champion-list">
  <div class="champion-index__champion-item" data-champion-key="Ahri" data-champion-name="Ahri">
    <div class="champion-index__champion-item__position"><span>Mid</span></div>
  </div>
  <div class="champion-index__champion-item" data-champion-key="Zed" data-champion-name="Zed">
    <div class="champion-index__champion-item__position"><span>Mid</span></div>
    <div class="champion-index__champion-item__position"><span>Jungle</span></div>
  </div>
</div>"#;

const ITEMS_HTML: &str = r#"
<div class="l-champion-statistics-content__side">
  <table class="champion-stats__table"><tbody>
    <tr><td><img src="//opgg-static.akamaized.net/images/lol/item/3020.png"></td><td><em>1,234</em></td><td>55.12%</td></tr>
    <tr><td><img src="//opgg-static.akamaized.net/images/lol/item/3089.png"></td><td><em>987</em></td><td>61%</td></tr>
    <tr><td><img src="//opgg-static.akamaized.net/images/lol/item/3157.png"></td><td><em>850</em></td><td>58%</td></tr>
  </tbody></table>
</div>"#;

const SKILLS_HTML: &str = r#"
<ul class="champion-stats__filter">
  <li class="champion-stats__filter__item">
    <ul class="champion-stats__list"><li class="champion-stats__list__item">Q</li><li class="champion-stats__list__item">E</li><li class="champion-stats__list__item">W</li></ul>
  </li>
</ul>"#;

const HERO_LIST_JSON: &str = r#"{"hero":[{"heroId":"103","alias":"Ahri"}],"version":"10.16"}"#;
const POSITIONS_JS: &str = r#"var CHAMPION_POSITION = {"list":{"103":{"mid":{}}},"gameVer":"10.16"};"#;
const AHRI_DETAIL_JS: &str = r#"var CHAMPION_DETAIL_103 = {"list":{"championLane":{"mid":{"hold3":"[{\"itemid\":\"3020\",\"showrate\":\"4512\",\"winrate\":\"5230\"},{\"itemid\":\"3285\",\"showrate\":\"3000\",\"winrate\":\"5400\"}]"}}},"gameVer":"10.16"};"#;

const MR_GENERAL_JSON: &str = r#"{"upToDateVersion":"10.16.1"}"#;
const MR_CHAMPIONS_JSON: &str = r#"{"data":{"Ahri":{"id":"Ahri","key":"103"}}}"#;
const MR_AHRI_JSON: &str = r#"{"items":{
    "starting":{"[1056,2003]":{"winRate":0.55,"frequency":0.5}},
    "build":{"[3020,3089]":{"winRate":0.6,"frequency":0.4},"[3157]":{"winRate":0.5,"frequency":0.2}}
}}"#;

/// Mock serving every route of the fixture roster
pub fn mock_upstream() -> MockFetcher {
    let fetcher = MockFetcher::new();
    fetcher
        .text(OPGG_STATISTICS, ROSTER_HTML)
        .text(OPGG_AHRI_ITEMS, ITEMS_HTML)
        .text(OPGG_AHRI_SKILLS, SKILLS_HTML)
        .text(OPGG_ZED_MID_ITEMS, ITEMS_HTML)
        .text(OPGG_ZED_MID_SKILLS, SKILLS_HTML)
        .text(OPGG_ZED_JUNGLE_ITEMS, ITEMS_HTML)
        .text(OPGG_ZED_JUNGLE_SKILLS, SKILLS_HTML)
        .text(QQ_HERO_LIST, HERO_LIST_JSON)
        .text(QQ_POSITIONS, POSITIONS_JS)
        .text(QQ_AHRI_DETAIL, AHRI_DETAIL_JS)
        .text(MR_GENERAL, MR_GENERAL_JSON)
        .text(MR_CHAMPIONS, MR_CHAMPIONS_JSON)
        .text(MR_AHRI, MR_AHRI_JSON);
    fetcher
}

/// 3020 is the only boot
pub fn item_map() -> ItemMap {
    [
        (
            "3020".to_string(),
            ItemInfo {
                name: "Sorcerer's Shoes".to_string(),
                is_boot: true,
                tags: vec!["Boots".to_string()],
                ..Default::default()
            },
        ),
        (
            "3089".to_string(),
            ItemInfo {
                name: "Rabadon's Deathcap".to_string(),
                ..Default::default()
            },
        ),
    ]
    .into_iter()
    .collect()
}

pub fn items_html() -> String {
    ITEMS_HTML.to_string()
}

/// ARAM statistics URL of `champion` on the fixture version
pub fn mr_stats_url(champion: &str) -> String {
    format!(
        "https://d23wati96d2ixg.cloudfront.net/save/10.16.1/ARAM/{}.json",
        champion
    )
}

/// Same statistics for every champion
pub fn mr_champion_json() -> String {
    MR_AHRI_JSON.to_string()
}

/// Data Dragon index listing `champions`
pub fn mr_roster_json(champions: &[String]) -> String {
    let data: serde_json::Map<String, serde_json::Value> = champions
        .iter()
        .map(|c| (c.clone(), serde_json::json!({ "id": c })))
        .collect();
    serde_json::json!({ "data": data }).to_string()
}
