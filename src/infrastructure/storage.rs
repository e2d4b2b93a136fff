use crate::config::ServiceConfig;
use crate::services::upload_store::UploadStore;
use anyhow::Context;
use tracing::info;

pub async fn setup_upload_store(config: &ServiceConfig) -> anyhow::Result<UploadStore> {
    let store = UploadStore::new(&config.upload_folder);

    store.init().await.with_context(|| {
        format!(
            "failed to create upload folder {}",
            config.upload_folder.display()
        )
    })?;

    info!(
        "📁 Upload folder: {} (retention {}s)",
        store.root().display(),
        config.upload_retention.as_secs()
    );

    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_setup_creates_missing_folder() {
        let dir = TempDir::new().unwrap();
        let folder = dir.path().join("nested").join("uploads");
        let config = ServiceConfig::development(&folder);

        let store = setup_upload_store(&config).await.unwrap();

        assert!(folder.is_dir());
        assert_eq!(store.root(), folder.as_path());
    }
}
