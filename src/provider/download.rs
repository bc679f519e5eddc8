use std::ffi::OsString;
use std::path::{Path, PathBuf};

use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{ProviderError, Result};

/// Sibling path a download is written to before being moved into place
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Stream the body of `url` to `path`, returning the number of bytes written
///
/// The body is written chunk by chunk to `<path>.part` and renamed over
/// `path` once complete, so an interrupted download never leaves a truncated
/// file at the destination.
pub async fn stream_to_file(client: &Client, provider: &str, url: &str, path: &Path) -> Result<u64> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let partial = partial_path(path);
    match write_body(client, provider, url, &partial).await {
        Ok(written) => {
            tokio::fs::rename(&partial, path).await?;
            debug!("Downloaded {} bytes from {} to {:?}", written, url, path);
            Ok(written)
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&partial).await;
            Err(e)
        }
    }
}

async fn write_body(client: &Client, provider: &str, url: &str, partial: &Path) -> Result<u64> {
    let request_failed = |e: reqwest::Error| ProviderError::RequestFailed {
        provider: provider.to_string(),
        reason: e.to_string(),
    };

    let mut response = client.get(url).send().await.map_err(request_failed)?;

    if !response.status().is_success() {
        return Err(ProviderError::BadStatus {
            provider: provider.to_string(),
            status: response.status().as_u16(),
        }.into());
    }

    let mut file = tokio::fs::File::create(partial).await?;
    let mut written = 0u64;

    while let Some(chunk) = response.chunk().await.map_err(request_failed)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(partial_path(Path::new("a/b/photo.jpg")), PathBuf::from("a/b/photo.jpg.part"));
    }
}
