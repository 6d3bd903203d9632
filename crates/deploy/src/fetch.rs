use async_trait::async_trait;
use futures::StreamExt;
use modelstack_common::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// A remote source of files: model downloads, update candidates
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch `url` into `dest`, returning the byte count.
    ///
    /// `dest` must only ever hold a complete file: implementations stream
    /// into a side file and rename on success.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// HTTP implementation of [`RemoteSource`]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Download(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        if url.trim().is_empty() {
            return Err(Error::Validation("URL is empty".to_string()));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Download(format!("request to {url} failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::Download(format!(
                "{url} returned {}",
                response.status()
            )));
        }
        let expected = response.content_length();

        let part = part_path(dest)?;
        let mut file = tokio::fs::File::create(&part).await?;
        // The partial file is removed on every early exit; once the rename
        // has happened this fires on a path that no longer exists.
        let part = scopeguard::guard(part, |p| {
            let _ = std::fs::remove_file(p);
        });

        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        loop {
            tokio::select! {
                chunk = stream.next() => match chunk {
                    Some(Ok(bytes)) => {
                        file.write_all(&bytes).await?;
                        written += bytes.len() as u64;
                    }
                    Some(Err(e)) => {
                        return Err(Error::Download(format!("stream from {url} broke: {e}")));
                    }
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    warn!("download of {url} interrupted");
                    return Err(Error::Cancelled("download interrupted".to_string()));
                }
            }
        }
        file.flush().await?;
        drop(file);

        // A truncated body must never be mistaken for a complete file
        match expected {
            Some(expected) if written != expected => {
                return Err(Error::Download(format!(
                    "incomplete download: {written} of {expected} bytes"
                )));
            }
            None if written == 0 => {
                return Err(Error::Download("empty response body".to_string()));
            }
            _ => {}
        }

        tokio::fs::rename(&*part, dest).await?;
        info!("fetched {written} bytes to {}", dest.display());
        Ok(written)
    }
}

fn part_path(dest: &Path) -> Result<PathBuf> {
    let name = dest.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
        Error::Validation(format!("unusable download destination: {}", dest.display()))
    })?;
    Ok(dest.with_file_name(format!("{name}.part")))
}
