// Immutable run settings: rule tables, paths, and network policy.
//
// The rule tables encode institutional knowledge about the target site's
// URL conventions and catalog gaps. They are data, not logic: the expected
// maintenance loop is "fetch fails -> add an override or ignore entry ->
// re-run", with the page cache making re-runs incremental.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration for a whole pipeline run, constructed once at startup and
/// passed by reference into every stage.
///
/// Every field has a curated default; a settings JSON file only needs to
/// name the fields it changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Exact line marking the start of the history table in the export file.
    pub content_start: String,
    /// Exact line marking the end of the history table.
    pub content_end: String,

    /// Base page URL; pages live at `{base_url}/{platform}/{slug}`.
    pub base_url: String,
    /// Platform variants in fetch priority order.
    pub platforms: Vec<String>,

    /// Punctuation stripped from titles when building slugs.
    pub remove_chars: Vec<char>,
    /// Ordered substring replacements applied last; order matters because
    /// later rules can match strings produced by earlier ones.
    pub replacers: Vec<(String, String)>,
    /// Phrases dropped from titles before slugging, e.g. edition qualifiers
    /// so DLC falls back to the main game's page.
    pub remove_phrases: Vec<String>,
    /// Titles whose automatic slug would be wrong; maps raw title to slug.
    pub overrides: BTreeMap<String, String>,
    /// Titles confirmed absent from the target catalog; never fetched.
    pub ignored: BTreeSet<String>,

    /// Browser-like request headers. Without these the site answers with
    /// an endless anti-bot redirect chain instead of the page.
    pub headers: Vec<(String, String)>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Pause after each successful download, in seconds.
    pub politeness_secs: u64,

    /// Directory holding one `{platform}_{slug}.html` file per fetched page.
    pub cache_dir: String,

    /// Report columns in output order. Empty names are visual spacers.
    pub column_order: Vec<String>,
    /// Keep the spacer columns in the report, or drop them.
    pub keep_empty_columns: bool,
    /// Report filename stem; a timestamp is appended per run.
    pub report_basename: String,
}

impl Settings {
    /// Load settings from a JSON file, or return the defaults when no
    /// path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                Ok(serde_json::from_str(&text)?)
            }
            None => Ok(Self::default()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            content_start: "Purchase History".to_string(),
            content_end: "BACK TO TOP".to_string(),

            base_url: "https://www.metacritic.com/game".to_string(),
            platforms: vec![
                "pc".to_string(),
                "playstation-4".to_string(),
                "switch".to_string(),
            ],

            remove_chars: vec!['.', ':', '\'', ',', '"'],
            replacers: vec![
                (" - ".to_string(), "---".to_string()),
                (" ".to_string(), "-".to_string()),
                ("-ep-".to_string(), "-episode-".to_string()),
            ],
            remove_phrases: [
                "A Post Nuclear Role Playing Game",
                " - Enhanced Plus Edition",
                ": Enhanced Edition",
                "Year Two Season Three Epic Pack",
                " - Carols, Candles and Candy",
                " - Match Day",
                " - Pearls From the East",
                " - Standard Editio...",
                ": Trials of Fear Edition",
                " - Gold Edition",
                " - Definitive Edition",
                " and 1 more",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            overrides: [
                ("Encased", "encased-a-sci-fi-post-apocalyptic-rpg"),
                ("PUBG: BATTLEGROUNDS", "playerunknowns-battlegrounds"),
                ("Cave Story+", "cave-story-+"),
                ("ARK Ragnarok", "ark-survival-evolved---ragnarok-expansion"),
                ("ARK The Center", "ark-survival-evolved---the-center-expansion"),
                ("Shadowrun Collection", "shadowrun-returns"),
                (
                    "Commander Lilith DLC",
                    "borderlands-2-commander-lilith-the-fight-for-sanctuary",
                ),
                ("The Textorcist", "the-textorcist-the-story-of-ray-bibbia"),
                ("MudRunner", "spintires-mudrunner"),
                ("MudRunner - Ridge DLC", "spintires-mudrunner---the-ridge"),
                ("MudRunner - Valley DLC", "spintires-mudrunner---the-valley"),
                ("MudRunner - Old Timers DLC", "spintires-mudrunner---old-timers"),
                ("Crying Suns Demo", "crying-suns"),
                ("Halcyon 6", "halcyon-6-starbase-commander"),
                ("Godfall Challenger Edition", "godfall"),
                ("Cities: Skylines - Pearls From the East", "cities-skylines"),
                ("Geneforge 1 - Mutagen", "geneforge-1---mutagen"),
                ("Alba - A Wildlife Adventure", "alba-a-wildlife-adventure"),
                (
                    "A Game Of Thrones: The Board Game Digital Edit...",
                    "a-game-of-thrones-the-board-game---digital-edition",
                ),
                (
                    "Total War: WARHAMMER - Grombrindal The White D...",
                    "total-war-warhammer---grombrindal-the-white-dwarf",
                ),
                ("Borderlands: The Handsome Collection", "borderlands-2"),
                (
                    "Rise of the Tomb Raider: 20 Year Celebration",
                    "rise-of-the-tomb-raider",
                ),
                ("Overcooked", "overcooked!"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            ignored: [
                "PUBG Founder's Pack",
                "Epic Cheerleader Pack",
                "Cook, Serve, Delicious! 3?!",
                "ARK Editor",
                "ARK Crystal Isles",
                "ARK Valguero",
                "Ultra HD Texture Pack",
                "Surviving Mars - Mysteries Resupply Pack",
                "Total War: WARHAMMER - Assembly Kit",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),

            headers: [
                ("Accept-Encoding", "gzip, deflate, sdch"),
                ("Accept-Language", "en-US,en;q=0.8"),
                ("Upgrade-Insecure-Requests", "1"),
                (
                    "User-Agent",
                    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                     (KHTML, like Gecko) Chrome/56.0.2924.87 Safari/537.36",
                ),
                (
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,\
                     image/webp,*/*;q=0.8",
                ),
                ("Cache-Control", "max-age=0"),
                ("Connection", "keep-alive"),
            ]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            timeout_secs: 5,
            politeness_secs: 2,

            cache_dir: "metacritic".to_string(),

            column_order: [
                "game",
                "metascore",
                "metascore_based",
                "userscore",
                "userscore_based",
                "players",
                "released",
                "platform",
                "developer",
                "publisher",
                "genres",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            keep_empty_columns: true,
            report_basename: "scorecard".to_string(),
        }
    }
}
