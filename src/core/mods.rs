use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::core::downloader::Downloader;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{LauncherEvent, SharedSink};
use crate::core::paths::LauncherPaths;

const MOD_REPO_LISTING_URL: &str =
    "https://api.github.com/repos/nation-community/client-mods/contents";
const LISTING_URL_ENV: &str = "NATION_MOD_REPO_URL";

const MOD_EXTENSION: &str = ".jar";

/// One file entry of the hosted repository listing. Extra fields in the
/// response are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoEntry {
    pub name: String,
    pub download_url: Option<String>,
}

/// Keep only the modification archives; everything else in the listing
/// (readme, configs) is ignored.
pub fn filter_mod_entries(entries: Vec<RepoEntry>) -> Vec<RepoEntry> {
    entries
        .into_iter()
        .filter(|entry| entry.name.ends_with(MOD_EXTENSION))
        .collect()
}

/// Mirrors the remote mod listing into the local mods directory.
///
/// Sequential and idempotent: files already on disk are skipped (and
/// reported as cached), missing ones are fetched one at a time in listing
/// order. Written files are not verified afterwards.
pub struct ModSynchronizer<'a> {
    paths: &'a LauncherPaths,
    downloader: &'a Downloader,
    client: &'a reqwest::Client,
}

impl<'a> ModSynchronizer<'a> {
    pub fn new(
        paths: &'a LauncherPaths,
        downloader: &'a Downloader,
        client: &'a reqwest::Client,
    ) -> Self {
        Self {
            paths,
            downloader,
            client,
        }
    }

    /// Returns the number of mod entries in the remote listing.
    pub async fn sync(&self, sink: &SharedSink) -> LauncherResult<usize> {
        let mods = filter_mod_entries(self.fetch_listing().await?);
        self.sync_entries(&mods, sink).await
    }

    async fn sync_entries(&self, mods: &[RepoEntry], sink: &SharedSink) -> LauncherResult<usize> {
        if mods.is_empty() {
            return Ok(0);
        }

        let mods_dir = self.paths.mods_dir();
        tokio::fs::create_dir_all(&mods_dir)
            .await
            .map_err(|source| LauncherError::Io {
                path: mods_dir.clone(),
                source,
            })?;

        let total = mods.len();
        sink.emit(LauncherEvent::progress(total, 0, None, false));

        for (index, entry) in mods.iter().enumerate() {
            if !needs_download(&mods_dir, &entry.name) {
                sink.emit(LauncherEvent::progress(
                    total,
                    index + 1,
                    Some(entry.name.clone()),
                    true,
                ));
                continue;
            }

            sink.emit(LauncherEvent::progress(
                total,
                index + 1,
                Some(entry.name.clone()),
                false,
            ));

            let url = entry.download_url.as_deref().ok_or_else(|| {
                LauncherError::RepoUnavailable(format!(
                    "listing entry {} has no download URL",
                    entry.name
                ))
            })?;
            self.downloader.download_file(url, &mods_dir.join(&entry.name)).await?;
        }

        info!("Mod sync finished: {} entries", total);
        Ok(total)
    }

    async fn fetch_listing(&self) -> LauncherResult<Vec<RepoEntry>> {
        let url = listing_url();
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::RepoUnavailable(format!(
                "listing returned HTTP {status}"
            )));
        }

        let body: serde_json::Value = response.json().await?;
        if !body.is_array() {
            // GitHub answers with an object (message, rate limit info) when
            // the repo path is wrong or the API rejects the request.
            return Err(LauncherError::RepoUnavailable(
                "listing response is not a file list".into(),
            ));
        }

        Ok(serde_json::from_value(body)?)
    }
}

fn listing_url() -> String {
    std::env::var(LISTING_URL_ENV).unwrap_or_else(|_| MOD_REPO_LISTING_URL.to_string())
}

/// Whether a listing entry still needs a download into `mods_dir`.
pub fn needs_download(mods_dir: &Path, name: &str) -> bool {
    !mods_dir.join(name).exists()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::events::test_support::CollectingSink;

    fn entry(name: &str) -> RepoEntry {
        RepoEntry {
            name: name.into(),
            download_url: Some(format!("https://example.invalid/{name}")),
        }
    }

    #[test]
    fn keeps_only_jar_entries_in_listing_order() {
        let filtered = filter_mod_entries(vec![entry("a.jar"), entry("b.txt"), entry("c.jar")]);
        let names: Vec<&str> = filtered.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.jar", "c.jar"]);
    }

    #[test]
    fn empty_listing_filters_to_nothing() {
        assert!(filter_mod_entries(vec![]).is_empty());
        assert!(filter_mod_entries(vec![entry("readme.md")]).is_empty());
    }

    #[test]
    fn present_files_do_not_need_a_second_download() {
        let dir = tempfile::tempdir().unwrap();

        assert!(needs_download(dir.path(), "a.jar"));
        std::fs::write(dir.path().join("a.jar"), b"jar bytes").unwrap();
        assert!(!needs_download(dir.path(), "a.jar"));
    }

    #[tokio::test]
    async fn sync_pass_over_present_files_downloads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LauncherPaths::at(dir.path());
        let client = reqwest::Client::new();
        let downloader = Downloader::new(client.clone());

        let mods_dir = paths.mods_dir();
        std::fs::create_dir_all(&mods_dir).unwrap();
        for name in ["a.jar", "c.jar"] {
            std::fs::write(mods_dir.join(name), b"jar bytes").unwrap();
        }

        // No download URL anywhere: if the loop tried to fetch, it would
        // error instead of finishing.
        let mods = vec![
            RepoEntry {
                name: "a.jar".into(),
                download_url: None,
            },
            RepoEntry {
                name: "c.jar".into(),
                download_url: None,
            },
        ];

        let sink_impl = Arc::new(CollectingSink::default());
        let sink: SharedSink = sink_impl.clone();
        let synchronizer = ModSynchronizer::new(&paths, &downloader, &client);
        let count = synchronizer.sync_entries(&mods, &sink).await.unwrap();
        assert_eq!(count, 2);

        let cached_flags: Vec<bool> = sink_impl
            .events()
            .into_iter()
            .filter_map(|event| match event {
                LauncherEvent::Progress { current, cached, .. } if current > 0 => Some(cached),
                _ => None,
            })
            .collect();
        assert_eq!(cached_flags, vec![true, true]);
    }

    #[tokio::test]
    async fn absent_file_without_download_url_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LauncherPaths::at(dir.path());
        let client = reqwest::Client::new();
        let downloader = Downloader::new(client.clone());

        let mods = vec![RepoEntry {
            name: "a.jar".into(),
            download_url: None,
        }];

        let sink_impl = Arc::new(CollectingSink::default());
        let sink: SharedSink = sink_impl.clone();
        let synchronizer = ModSynchronizer::new(&paths, &downloader, &client);
        let err = synchronizer.sync_entries(&mods, &sink).await.unwrap_err();
        assert!(matches!(err, LauncherError::RepoUnavailable(_)));
    }

    #[test]
    fn listing_entry_parses_from_github_shape() {
        let json = r#"[
            {"name": "a.jar", "download_url": "https://raw.example/a.jar", "size": 10, "type": "file"},
            {"name": ".gitignore", "download_url": null, "type": "file"}
        ]"#;
        let entries: Vec<RepoEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "a.jar");
        assert!(entries[1].download_url.is_none());
    }
}
