//! Single-GET downloader that never leaves a partial file at the destination.
//!
//! The body goes to a hidden `.part` sibling of the destination, is synced, then
//! renamed over it. On any failure the temp file is removed.

use std::path::{Path, PathBuf};

use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Client, Response};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{Cause, DownloadError};
use crate::filename::content_disposition_filename;

/// What a successful download produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub bytes: u64,
    /// Filename the server suggested via `Content-Disposition`, if any.
    pub remote_name: Option<String>,
}

/// Temp path used while `destination` is being written: `dir/.name.part`.
pub fn part_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".into());
    destination.with_file_name(format!(".{name}.part"))
}

/// Downloads `url` into `destination`, creating or replacing exactly that file.
pub async fn download_file(
    client: &Client,
    url: &str,
    destination: &Path,
) -> Result<Downloaded, DownloadError> {
    let fail = |cause| DownloadError {
        url: url.to_string(),
        cause,
    };

    let mut res = client
        .get(url)
        .send()
        .await
        .map_err(|e| fail(Cause::from_reqwest(&e)))?;

    let status = res.status();
    if !status.is_success() {
        return Err(fail(Cause::Status(status.as_u16())));
    }

    let remote_name = res
        .headers()
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(content_disposition_filename);

    let temp_path = part_path(destination);
    let written = match write_body(&mut res, &temp_path).await {
        Ok(n) => n,
        Err(cause) => {
            discard(&temp_path).await;
            return Err(fail(cause));
        }
    };

    if let Err(e) = fs::rename(&temp_path, destination).await {
        discard(&temp_path).await;
        return Err(fail(Cause::io(e)));
    }

    debug!("wrote {} bytes to {}", written, destination.display());
    Ok(Downloaded {
        bytes: written,
        remote_name,
    })
}

async fn write_body(res: &mut Response, temp_path: &Path) -> Result<u64, Cause> {
    let mut file = File::create(temp_path).await.map_err(Cause::io)?;
    let mut written = 0u64;

    while let Some(chunk) = res.chunk().await.map_err(|e| Cause::from_reqwest(&e))? {
        file.write_all(&chunk).await.map_err(Cause::io)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(Cause::io)?;
    file.sync_all().await.map_err(Cause::io)?;
    Ok(written)
}

async fn discard(temp_path: &Path) {
    if let Err(e) = fs::remove_file(temp_path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("couldn't remove {}: {}", temp_path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::ScraperConfig;
    use crate::request::build_client;

    fn client() -> Client {
        build_client(&ScraperConfig::default()).unwrap()
    }

    #[test]
    fn part_path_is_a_hidden_sibling() {
        let p = part_path(Path::new("/data/statistica-mai-2024/tranzactii.xlsx"));
        assert_eq!(
            p,
            Path::new("/data/statistica-mai-2024/.tranzactii.xlsx.part")
        );
    }

    #[tokio::test]
    async fn writes_body_and_reports_remote_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download.php"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(
                        "Content-Disposition",
                        r#"attachment; filename="Tranzactii_Mai_2024.xlsx""#,
                    )
                    .set_body_bytes(b"PK\x03\x04 spreadsheet".to_vec()),
            )
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("tranzactii_mai.xlsx");
        let url = format!("{}/download.php?id=17882", server.uri());

        let done = download_file(&client(), &url, &dest).await.unwrap();
        assert_eq!(done.bytes, 16);
        assert_eq!(done.remote_name.as_deref(), Some("Tranzactii_Mai_2024.xlsx"));
        assert_eq!(std::fs::read(&dest).unwrap(), b"PK\x03\x04 spreadsheet");
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_string("moved"))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("file.xlsx");
        download_file(&client(), &format!("{}/old", server.uri()), &dest)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "moved");
    }

    #[tokio::test]
    async fn error_status_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("missing.xlsx");
        let url = format!("{}/download.php?id=1", server.uri());

        let err = download_file(&client(), &url, &dest).await.unwrap_err();
        assert_eq!(err.url, url);
        assert_eq!(err.cause, Cause::Status(404));
        assert!(!dest.exists());
        assert!(!part_path(&dest).exists());
    }

    #[tokio::test]
    async fn unwritable_destination_is_an_io_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("data"))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let dest = dir.path().join("no-such-dir").join("file.xlsx");
        let err = download_file(&client(), &server.uri(), &dest)
            .await
            .unwrap_err();
        assert!(matches!(err.cause, Cause::Io(_)));
        assert!(!dest.exists());
    }
}
