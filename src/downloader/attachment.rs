//! Streaming download of a single attachment file

use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};
use url::Url;

use crate::regulations::RegulationsError;

/// Bytes buffered before each write to disk
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Suffix of a file that is still being written
pub const PARTIAL_SUFFIX: &str = ".part";

/// Local name for an attachment: its last two path segments joined together.
///
/// Attachments usually share names like `attachment_1.pdf` and differ only in
/// the comment id segment before it. This is a naming heuristic; two URLs with
/// the same trailing segments still collide.
pub fn attachment_file_name(url: &str) -> Result<String, RegulationsError> {
    let parsed = Url::parse(url).map_err(|_| RegulationsError::InvalidUrl(url.to_string()))?;
    let segments: Vec<&str> = parsed
        .path_segments()
        .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
        .unwrap_or_default();

    match segments.as_slice() {
        [] => Err(RegulationsError::InvalidUrl(url.to_string())),
        [only] => Ok(only.to_string()),
        [.., parent, name] => Ok(format!("{}{}", parent, name)),
    }
}

/// Stream `url` into `dir`, returning the path of the finished file.
///
/// The body goes to `<name>.part` first and is renamed once fully written, so
/// an interrupted transfer never leaves a file under the final name.
pub async fn download_attachment(
    client: &Client,
    url: &str,
    dir: &Path,
) -> Result<PathBuf, RegulationsError> {
    let name = attachment_file_name(url)?;
    let final_path = dir.join(&name);
    let part_path = dir.join(format!("{}{}", name, PARTIAL_SUFFIX));

    debug!("Downloading attachment from: {}", url);
    let response = client.get(url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(RegulationsError::ApiError {
            status_code: status.as_u16(),
            url: url.to_string(),
        });
    }

    let file = tokio::fs::File::create(&part_path).await?;
    let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                writer.flush().await?;
                warn!(
                    "Transfer of {} failed after {} bytes, partial file left at {}",
                    url,
                    written,
                    part_path.display()
                );
                return Err(e.into());
            }
        };
        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    writer.flush().await?;
    drop(writer);
    tokio::fs::rename(&part_path, &final_path).await?;

    debug!("Wrote {} bytes to {}", written, final_path.display());
    Ok(final_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    /// Serve one connection announcing `declared` body bytes but sending only `body`
    async fn serve_short_body(declared: usize, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                declared
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            socket.flush().await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{}/files/CMS-2011-0142-0009/attachment_1.pdf", addr)
    }

    #[tokio::test]
    async fn test_truncated_transfer_leaves_part_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let url = serve_short_body(100, vec![b'x'; 30]).await;

        let result = download_attachment(&Client::new(), &url, temp_dir.path()).await;
        assert!(matches!(result, Err(RegulationsError::Http(_))));

        let part = temp_dir.path().join("CMS-2011-0142-0009attachment_1.pdf.part");
        let finished = temp_dir.path().join("CMS-2011-0142-0009attachment_1.pdf");
        assert!(!finished.exists());
        assert_eq!(std::fs::read(&part).unwrap(), vec![b'x'; 30]);
    }

    #[test]
    fn test_attachment_file_name() {
        assert_eq!(
            attachment_file_name("https://downloads.regulations.gov/CMS-2011-0142-0009/attachment_1.pdf").unwrap(),
            "CMS-2011-0142-0009attachment_1.pdf"
        );
        assert_eq!(
            attachment_file_name("https://downloads.regulations.gov/a/b/c/file.docx").unwrap(),
            "cfile.docx"
        );
        assert_eq!(attachment_file_name("https://host/file.pdf").unwrap(), "file.pdf");
    }

    #[test]
    fn test_attachment_file_name_rejects_bad_urls() {
        assert!(matches!(
            attachment_file_name("not a url"),
            Err(RegulationsError::InvalidUrl(_))
        ));
        assert!(matches!(
            attachment_file_name("https://host/"),
            Err(RegulationsError::InvalidUrl(_))
        ));
    }
}
