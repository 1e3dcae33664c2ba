use anyhow::{Context, Result};
use scraper::Html;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use scorecard_model::{FieldRecord, Settings};

pub mod labels;
pub mod scores;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("critic score block not found (not a review page?)")]
    ScoreBlockMissing,

    #[error("failed to read cached page: {0}")]
    Io(#[from] std::io::Error),
}

/// A cache file that could not be turned into a record.
#[derive(Debug)]
pub struct SkippedPage {
    pub file: String,
    pub error: ExtractError,
}

/// Result of an extraction run over the cache directory.
#[derive(Debug, Default)]
pub struct ExtractOutcome {
    /// Records keyed by `game_platform`.
    pub records: BTreeMap<String, FieldRecord>,
    /// Pages skipped with their faults, reported at the end of the run.
    pub skipped: Vec<SkippedPage>,
}

/// Extract a `FieldRecord` from one cached page.
///
/// Partial-tolerant: optional fields degrade to 0 or empty strings. Only
/// a missing critic score block fails, and that failure is per-record —
/// the caller skips the page and keeps going.
pub fn extract_page(html: &str, platform: &str, game: &str) -> Result<FieldRecord, ExtractError> {
    let doc = Html::parse_document(html);
    let urlpath = format!("/game/{platform}/{game}");

    let mut record = FieldRecord::new(platform, game);
    (record.metascore, record.metascore_based) = scores::critic_scores(&doc, &urlpath)?;
    (record.userscore, record.userscore_based) = scores::user_scores(&doc, &urlpath);

    let lines = labels::body_lines(&doc);
    record.developer = labels::value_after(&lines, "Developer:")
        .unwrap_or_default()
        .to_string();
    record.released = labels::value_after(&lines, "Release Date:")
        .unwrap_or_default()
        .to_string();
    record.players = labels::value_after(&lines, "# of players:")
        .unwrap_or_default()
        .to_string();
    record.publisher = labels::join_between(&lines, "Publisher:", "Release Date:")
        .unwrap_or_default();
    record.genres = labels::genres(&lines);

    Ok(record)
}

/// Split a cache filename into its (platform, game) pair.
///
/// Filenames look like `playstation-4_dragon-quest-xi.html`; the platform
/// is everything before the first underscore.
fn parse_cache_filename<'a>(name: &'a str, settings: &Settings) -> Option<(&'a str, &'a str)> {
    let stem = name.strip_suffix(".html")?;
    let (platform, game) = stem.split_once('_')?;
    if !settings.platforms.iter().any(|p| p == platform) {
        return None;
    }
    Some((platform, game))
}

/// Run extraction over every cached page.
///
/// Files are processed in sorted order for deterministic output. A page
/// that fails extraction is logged, recorded in `skipped`, and does not
/// stop the batch.
pub fn extract_dir(cache_dir: &Path, settings: &Settings) -> Result<ExtractOutcome> {
    let mut names: Vec<String> = std::fs::read_dir(cache_dir)
        .with_context(|| format!("Failed to read cache dir {}", cache_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| parse_cache_filename(name, settings).is_some())
        .collect();
    names.sort();
    tracing::info!(files = names.len(), dir = %cache_dir.display(), "Found cached pages");

    let mut outcome = ExtractOutcome::default();

    for (i, name) in names.iter().enumerate() {
        let (platform, game) = parse_cache_filename(name, settings).expect("pre-filtered");

        let result = std::fs::read_to_string(cache_dir.join(name))
            .map_err(ExtractError::from)
            .and_then(|html| extract_page(&html, platform, game));

        match result {
            Ok(record) => {
                tracing::info!(
                    i,
                    game = %game,
                    platform = %platform,
                    metascore = record.metascore,
                    userscore = record.userscore,
                    "Extracted"
                );
                outcome.records.insert(record.key(), record);
            }
            Err(error) => {
                tracing::error!(i, file = %name, error = %error, "Skipping page");
                outcome.skipped.push(SkippedPage {
                    file: name.clone(),
                    error,
                });
            }
        }
    }

    tracing::info!(
        records = outcome.records.len(),
        skipped = outcome.skipped.len(),
        "Extraction complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    // A trimmed-down review page with every field the extractor reads.
    const PAGE: &str = r#"
    <html><body>
        <div class="score_summary metascore_summary">
            <span itemprop="ratingValue">93</span>
            <div class="summary">
                <a href="/game/pc/hades/critic-reviews"><span>35</span> Critic Reviews</a>
            </div>
        </div>
        <div class="userscore_wrap feature_userscore">
            <div class="metascore_w user large game positive">8.7</div>
            <div class="summary">
                <a href="/game/pc/hades/user-reviews">2784 Ratings</a>
            </div>
        </div>
        <div class="details">
            <span>Developer:</span>
            <span>Supergiant Games</span>
            <span>Publisher:</span>
            <span>Supergiant Games</span>
            <span>Release Date:</span>
            <span>Sep 17, 2020</span>
            <span>Genre(s):  Action,  Roguelike,  Action  RPG</span>
            <span># of players:</span>
            <span>No Online Multiplayer</span>
        </div>
    </body></html>
    "#;

    #[test]
    fn test_extract_full_page() {
        let record = extract_page(PAGE, "pc", "hades").unwrap();
        assert_eq!(record.metascore, 93);
        assert_eq!(record.metascore_based, 35);
        assert_eq!(record.userscore, 8.7);
        assert_eq!(record.userscore_based, 2784);
        assert_eq!(record.developer, "Supergiant Games");
        assert_eq!(record.publisher, "Supergiant Games");
        assert_eq!(record.released, "Sep 17, 2020");
        assert_eq!(record.players, "No Online Multiplayer");
        assert_eq!(record.genres, vec!["Action", "Roguelike", "ActionRPG"]);
        assert_eq!(record.key(), "hades_pc");
    }

    #[test]
    fn test_extract_page_without_critic_block_fails_that_record() {
        let err = extract_page("<html><body>404</body></html>", "pc", "gone").unwrap_err();
        assert!(matches!(err, ExtractError::ScoreBlockMissing));
    }

    #[test]
    fn test_missing_optional_fields_degrade_to_defaults() {
        let html = r#"
        <html><body>
            <div class="score_summary metascore_summary">
                <span itemprop="ratingValue">71</span>
            </div>
        </body></html>
        "#;
        let record = extract_page(html, "switch", "quiet-game").unwrap();
        assert_eq!(record.metascore, 71);
        assert_eq!(record.metascore_based, 0);
        assert_eq!(record.userscore, 0.0);
        assert_eq!(record.userscore_based, 0);
        assert_eq!(record.developer, "");
        assert_eq!(record.players, "");
        assert!(record.genres.is_empty());
    }

    #[test]
    fn test_parse_cache_filename() {
        let s = Settings::default();
        assert_eq!(
            parse_cache_filename("pc_hades.html", &s),
            Some(("pc", "hades"))
        );
        assert_eq!(
            parse_cache_filename("playstation-4_dragon-quest-xi.html", &s),
            Some(("playstation-4", "dragon-quest-xi"))
        );
        // Wrong platform prefix or extension is not a cache file
        assert_eq!(parse_cache_filename("xbox_halo.html", &s), None);
        assert_eq!(parse_cache_filename("pc_hades.json", &s), None);
    }
}
