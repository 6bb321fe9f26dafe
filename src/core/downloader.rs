use std::path::Path;

use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// Sequential single-file downloader.
///
/// Downloads never overlap by design: every provisioning step finishes its
/// transfer before the next one starts, so there is no concurrency here.
/// Files are written without checksum or size verification — an interrupted
/// write is indistinguishable from a complete one on the next run.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Download a single file to `dest`, creating parent directories as
    /// needed. The file handle is dropped immediately after writing to
    /// avoid Windows OS Error 5 on follow-up renames.
    pub async fn download_file(&self, url: &str, dest: &Path) -> LauncherResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::Download {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await?;

        {
            let mut file =
                tokio::fs::File::create(dest)
                    .await
                    .map_err(|source| LauncherError::Io {
                        path: dest.to_path_buf(),
                        source,
                    })?;
            file.write_all(&bytes)
                .await
                .map_err(|source| LauncherError::Io {
                    path: dest.to_path_buf(),
                    source,
                })?;
            file.flush().await.map_err(|source| LauncherError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
            // file is dropped here — critical on Windows
        }

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }
}
