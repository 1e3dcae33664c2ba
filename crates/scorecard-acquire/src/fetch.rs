// Page fetching with platform fallback and an on-disk cache.
//
// One file per (platform, slug) pair; file existence is the whole cache
// contract, content is never revalidated. Requests run strictly one at a
// time with a pause after each download. That is a policy toward the
// remote site, not a technical limit.

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use scorecard_model::{FailedDownload, PurchaseRecord, Settings};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What one GET against a platform variant came back with.
enum Attempt {
    /// Connection failure or timeout; no response at all.
    Transport,
    /// Got a response, but not the page (404, redirect chain, etc.).
    Rejected(u16),
    /// 200; body persisted to the cache.
    Saved,
}

/// Tally for one fetch run.
#[derive(Debug, Default)]
pub struct FetchReport {
    /// Pages downloaded this run.
    pub fetched: usize,
    /// Titles skipped because a cache file already existed.
    pub cached: usize,
    /// Titles on the ignore list.
    pub ignored: usize,
    /// Titles no platform variant could serve.
    pub failed: Vec<FailedDownload>,
}

/// Cache file location for a (platform, slug) pair.
pub fn cache_path(cache_dir: &Path, platform: &str, slug: &str) -> PathBuf {
    cache_dir.join(format!("{platform}_{slug}.html"))
}

/// First platform variant with an existing cache file, in priority order.
pub fn find_cached(cache_dir: &Path, platforms: &[String], slug: &str) -> Option<PathBuf> {
    platforms
        .iter()
        .map(|p| cache_path(cache_dir, p, slug))
        .find(|path| path.exists())
}

/// Resolve a finished attempt sequence into a failure status.
///
/// The loop stops at the first `Saved`, so a sequence containing one means
/// success. Otherwise the failure carries the status of the last variant
/// that answered at all, `None` when every attempt died in transport.
fn failure_status(attempts: &[Attempt]) -> Option<Option<u16>> {
    let mut last = None;
    for attempt in attempts {
        match attempt {
            Attempt::Saved => return None,
            Attempt::Rejected(code) => last = Some(*code),
            Attempt::Transport => {}
        }
    }
    Some(last)
}

fn build_client(settings: &Settings) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    for (name, value) in &settings.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .with_context(|| format!("Invalid header name '{name}' in settings"))?;
        let value = HeaderValue::from_str(value)
            .with_context(|| format!("Invalid header value for '{name:?}' in settings"))?;
        headers.insert(name, value);
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// Fetch the page for every record, trying platform variants in priority
/// order and caching each success to disk.
///
/// Already-cached titles cost zero network calls, so re-runs after a
/// settings tweak only touch the titles that previously failed.
pub async fn fetch_all(records: &[PurchaseRecord], settings: &Settings) -> Result<FetchReport> {
    let cache_dir = Path::new(&settings.cache_dir);
    std::fs::create_dir_all(cache_dir)
        .with_context(|| format!("Failed to create cache dir {}", cache_dir.display()))?;

    let client = build_client(settings)?;
    let mut report = FetchReport::default();

    for (i, record) in records.iter().enumerate() {
        let Some(slug) = crate::normalize::normalize(&record.raw_title, settings) else {
            tracing::info!(i, title = %record.raw_title, "On ignore list, skipping");
            report.ignored += 1;
            continue;
        };

        if let Some(path) = find_cached(cache_dir, &settings.platforms, &slug) {
            tracing::debug!(i, slug = %slug, path = %path.display(), "Already cached");
            report.cached += 1;
            continue;
        }

        let mut attempts = Vec::new();
        for platform in &settings.platforms {
            let url = format!("{}/{}/{}", settings.base_url, platform, slug);

            match client.get(&url).send().await {
                Err(e) => {
                    tracing::debug!(platform = %platform, error = %e, "Request failed, trying next");
                    attempts.push(Attempt::Transport);
                }
                Ok(response) if response.status() == StatusCode::OK => {
                    // A connection that dies mid-body is still a transport
                    // fault; fall through like a failed send.
                    let body = match response.text().await {
                        Ok(body) => body,
                        Err(e) => {
                            tracing::debug!(platform = %platform, error = %e, "Body read failed, trying next");
                            attempts.push(Attempt::Transport);
                            continue;
                        }
                    };
                    let path = cache_path(cache_dir, platform, &slug);
                    std::fs::write(&path, &body)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    tracing::info!(
                        i,
                        date = %record.purchase_date(),
                        slug = %slug,
                        platform = %platform,
                        bytes = body.len(),
                        "Page saved"
                    );
                    attempts.push(Attempt::Saved);
                    tokio::time::sleep(Duration::from_secs(settings.politeness_secs)).await;
                    break;
                }
                Ok(response) => {
                    let code = response.status().as_u16();
                    tracing::debug!(platform = %platform, status = code, "Rejected, trying next");
                    attempts.push(Attempt::Rejected(code));
                }
            }
        }

        match failure_status(&attempts) {
            None => report.fetched += 1,
            Some(status) => {
                tracing::warn!(i, title = %record.raw_title, slug = %slug, ?status, "All platforms failed");
                report.failed.push(FailedDownload {
                    record: record.clone(),
                    slug,
                    status,
                });
            }
        }
    }

    tracing::info!(
        fetched = report.fetched,
        cached = report.cached,
        ignored = report.ignored,
        failed = report.failed.len(),
        "Fetch run complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("scorecard-cache-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_cache_path_shape() {
        let path = cache_path(Path::new("metacritic"), "pc", "hades");
        assert_eq!(path, Path::new("metacritic").join("pc_hades.html"));
    }

    #[test]
    fn test_find_cached_prefers_priority_order() {
        let dir = temp_cache();
        let platforms = vec!["pc".to_string(), "playstation-4".to_string()];

        std::fs::write(cache_path(&dir, "playstation-4", "hades"), "<html>").unwrap();
        let hit = find_cached(&dir, &platforms, "hades").unwrap();
        assert!(hit.ends_with("playstation-4_hades.html"));

        // Once the higher-priority file exists it wins
        std::fs::write(cache_path(&dir, "pc", "hades"), "<html>").unwrap();
        let hit = find_cached(&dir, &platforms, "hades").unwrap();
        assert!(hit.ends_with("pc_hades.html"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_find_cached_misses_cleanly() {
        let dir = temp_cache();
        let platforms = vec!["pc".to_string()];
        assert_eq!(find_cached(&dir, &platforms, "not-downloaded"), None);
    }

    #[test]
    fn test_failure_status_carries_last_rejection() {
        let attempts = [
            Attempt::Rejected(404),
            Attempt::Transport,
            Attempt::Rejected(301),
        ];
        assert_eq!(failure_status(&attempts), Some(Some(301)));
    }

    #[test]
    fn test_failure_status_transport_only() {
        let attempts = [Attempt::Transport, Attempt::Transport];
        assert_eq!(failure_status(&attempts), Some(None));
    }

    #[test]
    fn test_failure_status_success_is_not_a_failure() {
        let attempts = [Attempt::Rejected(404), Attempt::Saved];
        assert_eq!(failure_status(&attempts), None);
    }

    fn record(title: &str) -> PurchaseRecord {
        PurchaseRecord {
            raw_title: title.to_string(),
            columns: vec!["2023-01-01".to_string(), title.to_string()],
        }
    }

    fn test_settings(cache_dir: &Path, base_url: String, platforms: &[&str]) -> Settings {
        Settings {
            base_url,
            platforms: platforms.iter().map(|p| p.to_string()).collect(),
            cache_dir: cache_dir.to_str().unwrap().to_string(),
            politeness_secs: 0,
            ..Settings::default()
        }
    }

    fn read_request(conn: &mut std::net::TcpStream) {
        use std::io::Read;
        let mut buf = [0u8; 1024];
        let mut seen = Vec::new();
        loop {
            let n = conn.read(&mut buf).unwrap();
            seen.extend_from_slice(&buf[..n]);
            if n == 0 || seen.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_body_read_failure_falls_through_to_next_platform() {
        use std::io::Write;

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = std::thread::spawn(move || {
            // First platform: claim a long body, send 5 bytes, drop the
            // socket mid-read.
            let (mut conn, _) = listener.accept().unwrap();
            read_request(&mut conn);
            conn.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\n\r\nhello")
                .unwrap();
            drop(conn);

            // Second platform: clean 200.
            let (mut conn, _) = listener.accept().unwrap();
            read_request(&mut conn);
            conn.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nworld")
                .unwrap();
        });

        let dir = std::env::temp_dir().join(format!("scorecard-fetch-net-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let settings = test_settings(&dir, format!("http://127.0.0.1:{port}"), &["pc", "switch"]);

        let report = fetch_all(&[record("Example Game")], &settings).await.unwrap();
        server.join().unwrap();

        assert_eq!(report.fetched, 1);
        assert!(report.failed.is_empty());
        let saved = cache_path(&dir, "switch", "example-game");
        assert_eq!(std::fs::read_to_string(&saved).unwrap(), "world");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_ignored_and_cached_titles_make_no_network_calls() {
        // Nothing listens on this address; any attempted request would show
        // up as a FailedDownload.
        let dir =
            std::env::temp_dir().join(format!("scorecard-fetch-offline-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(cache_path(&dir, "pc", "hades"), "<html>").unwrap();

        let settings = test_settings(&dir, "http://127.0.0.1:1".to_string(), &["pc"]);

        let report = fetch_all(&[record("ARK Editor"), record("Hades")], &settings)
            .await
            .unwrap();

        assert_eq!(report.ignored, 1);
        assert_eq!(report.cached, 1);
        assert_eq!(report.fetched, 0);
        assert!(report.failed.is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }
}
