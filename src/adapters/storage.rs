use crate::domain::model::{Archive, MashupRequest};
use crate::domain::ports::{Delivery, Storage};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data).await?;
        Ok(full_path.to_string_lossy().into_owned())
    }
}

/// Lowercase ASCII alphanumerics separated by single dashes.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        "mashup".to_string()
    } else {
        slug.to_string()
    }
}

/// Keeps the archive in a storage backend instead of emailing it.
#[derive(Debug, Clone)]
pub struct LocalDelivery<S: Storage> {
    storage: S,
}

impl<S: Storage> LocalDelivery<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn target_name(request: &MashupRequest, archive: &Archive) -> String {
        format!("{}-{}", slugify(&request.singer), archive.file_name)
    }
}

#[async_trait]
impl<S: Storage> Delivery for LocalDelivery<S> {
    async fn deliver(&self, request: &MashupRequest, archive: &Archive) -> Result<String> {
        let data = tokio::fs::read(&archive.path).await?;
        let name = Self::target_name(request, archive);
        let written = self.storage.write_file(&name, &data).await?;
        tracing::info!("💾 Archive saved: {}", written);
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Sharry Maan"), "sharry-maan");
        assert_eq!(slugify("  AC/DC!! "), "ac-dc");
        assert_eq!(slugify("Beyoncé"), "beyonc");
        assert_eq!(slugify("★★★"), "mashup");
    }

    #[tokio::test]
    async fn test_local_storage_round_trip_creates_parents() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_string_lossy().into_owned());

        let written = storage.write_file("nested/out.bin", b"data").await.unwrap();
        assert!(written.ends_with("out.bin"));
        assert_eq!(storage.read_file("nested/out.bin").await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn test_local_delivery_names_file_after_singer() {
        let work = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let zip_path = work.path().join("mashup-output.zip");
        tokio::fs::write(&zip_path, b"zip-bytes").await.unwrap();

        let archive = Archive {
            path: zip_path,
            file_name: "mashup-output.zip".to_string(),
            size_bytes: 9,
        };
        let request = MashupRequest::new("Taylor Swift", 3, 5, "");
        let delivery = LocalDelivery::new(LocalStorage::new(out.path().to_string_lossy().into_owned()));

        let receipt = delivery.deliver(&request, &archive).await.unwrap();

        let expected = out.path().join("taylor-swift-mashup-output.zip");
        assert_eq!(receipt, expected.to_string_lossy());
        assert_eq!(std::fs::read(expected).unwrap(), b"zip-bytes");
    }
}
