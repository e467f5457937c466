use anyhow::Context;
use bytes::Bytes;
use std::path::Path;

/// Initialize tracing for CLI binaries.
///
/// `LOG_FORMAT=json` switches to JSON lines for log shipping.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Read a file for upload; returns its file name and contents.
pub async fn read_upload(path: &Path) -> anyhow::Result<(String, Bytes)> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Not a file path: {}", path.display()))?
        .to_string();

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok((filename, Bytes::from(data)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_upload_returns_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("widget.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let (filename, data) = read_upload(&path).await.unwrap();
        assert_eq!(filename, "widget.jpg");
        assert_eq!(&data[..], b"jpeg bytes");
    }

    #[tokio::test]
    async fn read_upload_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_upload(&dir.path().join("missing.png"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
