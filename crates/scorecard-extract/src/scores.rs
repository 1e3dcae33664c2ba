// Score-block extraction via structural tag lookups.
//
// The critic and user score blocks have stable container classes; inside
// them, everything is optional. A page with no critic reviews yet simply
// lacks the rating element, and the user block swaps its review-count link
// for an "Awaiting N more ratings" message until enough ratings exist.

use crate::ExtractError;
use regex::Regex;
use scraper::{Html, Selector};

fn selector(s: &str) -> Selector {
    Selector::parse(s).expect("valid selector")
}

/// Critic score and its review count.
///
/// The score container is the one mandatory structure on a page: its
/// absence means this is not a review page at all, and the record is
/// skipped. Within it, a missing rating value or review-count link
/// means "no critic reviews yet" and yields 0.
pub fn critic_scores(doc: &Html, urlpath: &str) -> Result<(i64, i64), ExtractError> {
    let block = doc
        .select(&selector("div.score_summary.metascore_summary"))
        .next()
        .ok_or(ExtractError::ScoreBlockMissing)?;

    let metascore = block
        .select(&selector(r#"span[itemprop="ratingValue"]"#))
        .next()
        .and_then(|span| {
            let text = span.text().collect::<String>();
            let text = text.trim();
            text.parse::<i64>()
                .map_err(|_| tracing::warn!(text = %text, "Unparseable critic score, using 0"))
                .ok()
        })
        .unwrap_or(0);

    let based = block
        .select(&selector(&format!(r#"a[href="{urlpath}/critic-reviews"]"#)))
        .next()
        .and_then(|link| link.select(&selector("span")).next())
        .and_then(|span| span.text().collect::<String>().trim().parse::<i64>().ok())
        .unwrap_or(0);

    Ok((metascore, based))
}

/// User score and its rating count, degrading to (0.0, 0).
///
/// Exactly one large user-score tag is expected; zero or several is an
/// extraction fault on this page and both fields stay at their defaults
/// rather than failing the record. The site's "tbd" placeholder also maps
/// to 0. A negative count means the score is withheld until that many
/// more ratings arrive.
pub fn user_scores(doc: &Html, urlpath: &str) -> (f64, i64) {
    let Some(block) = doc
        .select(&selector("div.userscore_wrap.feature_userscore"))
        .next()
    else {
        tracing::warn!(urlpath = %urlpath, "User score block not found, using defaults");
        return (0.0, 0);
    };

    let tags: Vec<_> = block
        .select(&selector(r#"div[class^="metascore_w user large game"]"#))
        .collect();
    if tags.len() != 1 {
        tracing::warn!(
            urlpath = %urlpath,
            tags = tags.len(),
            "Expected exactly one user score tag, using defaults"
        );
        return (0.0, 0);
    }

    let text = tags[0].text().collect::<String>();
    let text = text.trim();
    let userscore = if text == "tbd" {
        0.0
    } else {
        match text.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(text = %text, "Unparseable user score, using 0");
                0.0
            }
        }
    };

    let based = block
        .select(&selector(&format!(r#"a[href="{urlpath}/user-reviews"]"#)))
        .next()
        .and_then(|link| {
            let text = link.text().collect::<String>();
            text.replace("Ratings", "").trim().parse::<i64>().ok()
        })
        .or_else(|| awaiting_count(block))
        .unwrap_or(0);

    (userscore, based)
}

/// Parse the "Awaiting N more ratings" message into -N.
fn awaiting_count(block: scraper::ElementRef) -> Option<i64> {
    let msg = block.select(&selector("span.connect4_msg")).next()?;
    let text = msg.text().collect::<String>();
    let re = Regex::new(r"Awaiting\s+(\d+)\s+more rating").unwrap();
    let n: i64 = re.captures(text.trim())?.get(1)?.as_str().parse().ok()?;
    Some(-n)
}

#[cfg(test)]
mod tests {
    use super::*;

    const URLPATH: &str = "/game/pc/example-game";

    fn doc(body: &str) -> Html {
        Html::parse_document(&format!("<html><body>{body}</body></html>"))
    }

    #[test]
    fn test_critic_scores_full_block() {
        let doc = doc(r#"
            <div class="score_summary metascore_summary">
                <span itemprop="ratingValue">87</span>
                <div class="summary">
                    based on <a href="/game/pc/example-game/critic-reviews">
                        <span>42</span> Critic Reviews
                    </a>
                </div>
            </div>
        "#);
        assert_eq!(critic_scores(&doc, URLPATH).unwrap(), (87, 42));
    }

    #[test]
    fn test_critic_scores_no_reviews_yet() {
        let doc = doc(r#"<div class="score_summary metascore_summary"></div>"#);
        assert_eq!(critic_scores(&doc, URLPATH).unwrap(), (0, 0));
    }

    #[test]
    fn test_missing_critic_block_is_a_fault() {
        let doc = doc("<p>not a review page</p>");
        assert!(matches!(
            critic_scores(&doc, URLPATH),
            Err(ExtractError::ScoreBlockMissing)
        ));
    }

    #[test]
    fn test_user_scores_with_rating_link() {
        let doc = doc(r#"
            <div class="userscore_wrap feature_userscore">
                <div class="metascore_w user large game positive">8.4</div>
                <div class="summary">
                    based on <a href="/game/pc/example-game/user-reviews">123 Ratings</a>
                </div>
            </div>
        "#);
        assert_eq!(user_scores(&doc, URLPATH), (8.4, 123));
    }

    #[test]
    fn test_tbd_placeholder_is_zero_not_a_fault() {
        let doc = doc(r#"
            <div class="userscore_wrap feature_userscore">
                <div class="metascore_w user large game tbd">tbd</div>
                <div class="summary">
                    <span class="connect4_msg">Awaiting 3 more ratings</span>
                </div>
            </div>
        "#);
        assert_eq!(user_scores(&doc, URLPATH), (0.0, -3));
    }

    #[test]
    fn test_multiple_user_tags_degrade_to_defaults() {
        let doc = doc(r#"
            <div class="userscore_wrap feature_userscore">
                <div class="metascore_w user large game positive">8.4</div>
                <div class="metascore_w user large game positive">7.1</div>
            </div>
        "#);
        assert_eq!(user_scores(&doc, URLPATH), (0.0, 0));
    }

    #[test]
    fn test_missing_user_block_degrades_to_defaults() {
        let doc = doc(r#"<div class="score_summary metascore_summary"></div>"#);
        assert_eq!(user_scores(&doc, URLPATH), (0.0, 0));
    }
}
