use serde::{Deserialize, Serialize};

/// One interior row of the purchase-history table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurchaseRecord {
    /// Title exactly as exported by the storefront (e.g., "PUBG: BATTLEGROUNDS").
    pub raw_title: String,
    /// The full tab-separated row, in export order. `raw_title` is `columns[1]`.
    pub columns: Vec<String>,
}

impl PurchaseRecord {
    /// Purchase date column, if the export carried one.
    pub fn purchase_date(&self) -> &str {
        self.columns.first().map(String::as_str).unwrap_or("")
    }
}

/// A title whose page could not be fetched on any platform variant.
///
/// Accumulated during a fetch run and reported at the end; never retried
/// automatically. The expected follow-up is a manual settings change
/// (override map or ignore list) and a re-run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedDownload {
    pub record: PurchaseRecord,
    /// Slug that was tried on every platform variant.
    pub slug: String,
    /// HTTP status of the last variant tried, if any request got a response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl FailedDownload {
    /// One-line summary for the end-of-run failure report.
    pub fn summary(&self) -> String {
        match self.status {
            Some(code) => format!("{} = {} = {}", code, self.slug, self.record.raw_title),
            None => format!("no response = {} = {}", self.slug, self.record.raw_title),
        }
    }
}

/// Review metadata extracted from one cached aggregator page.
///
/// One record per (game, platform) pair. Numeric fields default to 0 when
/// the page has no reviews yet; text fields default to empty strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldRecord {
    /// Platform variant the page was fetched under (e.g., "pc").
    pub platform: String,
    /// URL slug of the game (e.g., "borderlands-2").
    pub game: String,
    /// Critic score, 0 if the page shows none.
    pub metascore: i64,
    /// Number of critic reviews the score is based on.
    pub metascore_based: i64,
    /// User score, 0.0 for the "tbd" placeholder.
    pub userscore: f64,
    /// Number of user ratings; negative N means "still awaiting N more
    /// ratings before a score is shown" (distinct from zero ratings).
    pub userscore_based: i64,
    /// "# of players" text, empty when the page has no such entry.
    pub players: String,
    pub released: String,
    pub developer: String,
    pub publisher: String,
    /// Genre tags in page order, despaced.
    pub genres: Vec<String>,
}

impl FieldRecord {
    /// New record with everything at its "absent" default.
    pub fn new(platform: &str, game: &str) -> Self {
        Self {
            platform: platform.to_string(),
            game: game.to_string(),
            metascore: 0,
            metascore_based: 0,
            userscore: 0.0,
            userscore_based: 0,
            players: String::new(),
            released: String::new(),
            developer: String::new(),
            publisher: String::new(),
            genres: Vec::new(),
        }
    }

    /// Uniqueness key for the record map.
    pub fn key(&self) -> String {
        format!("{}_{}", self.game, self.platform)
    }

    /// Render one named report column.
    ///
    /// Unknown names (including the blank spacer column) render as an
    /// empty string so the report writer never has to special-case them.
    pub fn column(&self, name: &str) -> String {
        match name {
            "game" => self.game.clone(),
            "platform" => self.platform.clone(),
            "metascore" => self.metascore.to_string(),
            "metascore_based" => self.metascore_based.to_string(),
            "userscore" => format!("{:.1}", self.userscore),
            "userscore_based" => self.userscore_based.to_string(),
            "players" => self.players.clone(),
            "released" => self.released.clone(),
            "developer" => self.developer.clone(),
            "publisher" => self.publisher.clone(),
            "genres" => self.genres.join(","),
            _ => String::new(),
        }
    }
}
