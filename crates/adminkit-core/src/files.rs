//! File uploads.
//!
//! A [`FileManager`] validates and stores one uploaded file and returns the
//! location the admin should persist in the model column. Three managers are
//! provided:
//!
//! - [`OnPremiseFileManager`] writes to a local directory and returns the file path.
//! - [`StaticFilesManager`] wraps it and returns a URL under a static mount prefix.
//! - `S3FileManager` (feature `s3`) stores the object in a bucket and returns its public URL.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{AdminError, AdminResult};
use crate::settings::{AdminSettings, DEFAULT_MAX_UPLOAD_SIZE};

/// A file received from a multipart form.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    /// The filename sent by the client. Empty when the field was left blank.
    pub filename: String,
    /// The MIME type sent by the client.
    pub content_type: String,
    /// The file content.
    pub content: Bytes,
}

impl UploadedFile {
    /// Creates an uploaded file.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            content: content.into(),
        }
    }

    /// The content size in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// The lowercased extension of the filename, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
    }
}

/// Stores uploaded files.
#[async_trait]
pub trait FileManager: Send + Sync {
    /// Validates and stores `file`, returning its location.
    async fn upload(&self, file: &UploadedFile) -> AdminResult<String>;
}

/// Picks the stored filename for an upload.
pub type FilenameGenerator = Arc<dyn Fn(&UploadedFile) -> String + Send + Sync>;

/// Writes uploads to a local directory.
///
/// Validation order is size first, then extension.
#[derive(Clone)]
pub struct OnPremiseFileManager {
    uploads_dir: PathBuf,
    allow_extensions: Vec<String>,
    max_size: u64,
    filename_generator: Option<FilenameGenerator>,
}

impl fmt::Debug for OnPremiseFileManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnPremiseFileManager")
            .field("uploads_dir", &self.uploads_dir)
            .field("allow_extensions", &self.allow_extensions)
            .field("max_size", &self.max_size)
            .field("filename_generator", &self.filename_generator.is_some())
            .finish()
    }
}

impl OnPremiseFileManager {
    /// Accepts any extension up to the default size limit.
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            allow_extensions: Vec::new(),
            max_size: DEFAULT_MAX_UPLOAD_SIZE,
            filename_generator: None,
        }
    }

    /// Builds a manager from the upload section of the settings.
    pub fn from_settings(settings: &AdminSettings) -> Self {
        Self::new(&settings.uploads_dir)
            .allow_extensions(settings.allow_extensions.iter().cloned())
            .max_size(settings.max_upload_size)
    }

    /// Restricts uploads to these extensions. An empty list allows any.
    #[must_use]
    pub fn allow_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_extensions = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Sets the maximum size in bytes.
    #[must_use]
    pub const fn max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Replaces the client filename with a generated one.
    #[must_use]
    pub fn filename_generator(
        mut self,
        generator: impl Fn(&UploadedFile) -> String + Send + Sync + 'static,
    ) -> Self {
        self.filename_generator = Some(Arc::new(generator));
        self
    }

    /// The directory uploads are written to.
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Rejects files over the size limit or with a disallowed extension.
    pub fn validate(&self, file: &UploadedFile, filename: &str) -> AdminResult<()> {
        let size = file.size();
        if size > self.max_size {
            return Err(AdminError::FileMaxSizeLimit {
                size,
                max_size: self.max_size,
            });
        }
        if !self.is_extension_allowed(filename) {
            return Err(AdminError::FileExtNotAllowed {
                filename: filename.to_string(),
                allowed: self.allow_extensions.clone(),
            });
        }
        Ok(())
    }

    fn is_extension_allowed(&self, filename: &str) -> bool {
        if self.allow_extensions.is_empty() {
            return true;
        }
        Path::new(filename)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.allow_extensions.contains(&ext))
    }

    fn stored_filename(&self, file: &UploadedFile) -> AdminResult<String> {
        let name = match &self.filename_generator {
            Some(generate) => generate(file),
            None => file.filename.clone(),
        };
        // Only the final component is kept so a crafted name cannot leave the directory.
        Path::new(&name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AdminError::BadRequest(format!("Invalid upload filename '{name}'")))
    }

    /// Writes `content` to `uploads_dir/filename`.
    pub async fn save_file(&self, filename: &str, content: &[u8]) -> AdminResult<PathBuf> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        let path = self.uploads_dir.join(filename);
        tokio::fs::write(&path, content).await?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "Stored upload");
        Ok(path)
    }
}

#[async_trait]
impl FileManager for OnPremiseFileManager {
    async fn upload(&self, file: &UploadedFile) -> AdminResult<String> {
        let filename = self.stored_filename(file)?;
        self.validate(file, &filename)?;
        let path = self.save_file(&filename, &file.content).await?;
        Ok(path.display().to_string())
    }
}

/// Stores uploads on disk and returns their URL under a static mount.
#[derive(Debug, Clone)]
pub struct StaticFilesManager {
    inner: OnPremiseFileManager,
    prefix: String,
}

impl StaticFilesManager {
    /// Wraps `inner`, serving files under `/static/uploads`.
    pub fn new(inner: OnPremiseFileManager) -> Self {
        Self {
            inner,
            prefix: "/static/uploads".to_string(),
        }
    }

    /// Builds a manager from the upload section of the settings.
    pub fn from_settings(settings: &AdminSettings) -> Self {
        Self::new(OnPremiseFileManager::from_settings(settings))
            .prefix(&settings.static_uploads_prefix)
    }

    /// Sets the URL prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

#[async_trait]
impl FileManager for StaticFilesManager {
    async fn upload(&self, file: &UploadedFile) -> AdminResult<String> {
        let stored = self.inner.upload(file).await?;
        let filename = Path::new(&stored)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(stored);
        Ok(format!("{}/{filename}", self.prefix.trim_end_matches('/')))
    }
}

/// Returns an object identifier of the form `prefix + timestamp + extension`.
pub fn create_unique_file_identifier(file: &UploadedFile, prefix: &str) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S%6f");
    match file.extension() {
        Some(ext) => format!("{prefix}{stamp}.{ext}"),
        None => format!("{prefix}{stamp}"),
    }
}

#[cfg(feature = "s3")]
pub use s3::S3FileManager;

#[cfg(feature = "s3")]
mod s3 {
    use async_trait::async_trait;
    use aws_config::Region;
    use aws_sdk_s3::config::{BehaviorVersion, Credentials};
    use aws_sdk_s3::primitives::ByteStream;

    use super::{create_unique_file_identifier, FileManager, UploadedFile};
    use crate::error::{AdminError, AdminResult};

    /// Stores uploads in an S3 bucket and returns their public URL.
    #[derive(Debug, Clone)]
    pub struct S3FileManager {
        client: aws_sdk_s3::Client,
        bucket: String,
        region: String,
        prefix: String,
    }

    impl S3FileManager {
        /// Creates a manager with static credentials.
        pub fn new(
            bucket: impl Into<String>,
            access_key: &str,
            secret_key: &str,
            region: impl Into<String>,
            prefix: impl Into<String>,
        ) -> Self {
            let region = region.into();
            let credentials = Credentials::new(access_key, secret_key, None, None, "adminkit");
            let config = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new(region.clone()))
                .credentials_provider(credentials)
                .build();
            Self {
                client: aws_sdk_s3::Client::from_conf(config),
                bucket: bucket.into(),
                region,
                prefix: prefix.into(),
            }
        }

        /// The public URL of an object key.
        pub fn object_url(&self, key: &str) -> String {
            format!(
                "https://{}.s3.{}.amazonaws.com/{key}",
                self.bucket, self.region
            )
        }
    }

    #[async_trait]
    impl FileManager for S3FileManager {
        async fn upload(&self, file: &UploadedFile) -> AdminResult<String> {
            let key = create_unique_file_identifier(file, &self.prefix);
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&key)
                .content_type(&file.content_type)
                .body(ByteStream::from(file.content.to_vec()))
                .send()
                .await
                .map_err(|e| AdminError::Storage(format!("S3 upload of '{key}' failed: {e}")))?;
            tracing::debug!(bucket = %self.bucket, key = %key, "Uploaded object");
            Ok(self.object_url(&key))
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str, size: usize) -> UploadedFile {
        UploadedFile::new(name, "image/png", vec![7u8; size])
    }

    #[test]
    fn test_uploaded_file_extension() {
        assert_eq!(png("Avatar.PNG", 1).extension().as_deref(), Some("png"));
        assert_eq!(png("README", 1).extension(), None);
    }

    #[test]
    fn test_size_checked_before_extension() {
        let manager = OnPremiseFileManager::new("unused")
            .allow_extensions(["jpg"])
            .max_size(4);
        let err = manager.validate(&png("a.png", 10), "a.png").unwrap_err();
        assert!(matches!(err, AdminError::FileMaxSizeLimit { size: 10, max_size: 4 }));
    }

    #[test]
    fn test_extension_allow_list() {
        let manager = OnPremiseFileManager::new("unused").allow_extensions([".PNG", "jpg"]);
        assert!(manager.validate(&png("a.png", 1), "a.png").is_ok());
        assert!(manager.validate(&png("a.jpg", 1), "a.jpg").is_ok());
        assert!(matches!(
            manager.validate(&png("a.exe", 1), "a.exe"),
            Err(AdminError::FileExtNotAllowed { .. })
        ));
        assert!(manager.validate(&png("png", 1), "png").is_err());
    }

    #[test]
    fn test_empty_allow_list_accepts_anything() {
        let manager = OnPremiseFileManager::new("unused");
        assert!(manager.validate(&png("a.bin", 1), "a.bin").is_ok());
    }

    #[test]
    fn test_stored_filename_strips_directories() {
        let manager = OnPremiseFileManager::new("unused");
        assert_eq!(
            manager.stored_filename(&png("../../etc/passwd", 1)).unwrap(),
            "passwd"
        );
        assert!(manager.stored_filename(&png("", 1)).is_err());
    }

    #[test]
    fn test_unique_identifier_keeps_extension() {
        let id = create_unique_file_identifier(&png("photo.png", 1), "media/");
        assert!(id.starts_with("media/"));
        assert!(id.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_static_manager_prefixes_filename() {
        let dir = tempfile::tempdir().unwrap();
        let manager =
            StaticFilesManager::new(OnPremiseFileManager::new(dir.path())).prefix("/static/media/");
        let url = manager.upload(&png("logo.png", 3)).await.unwrap();
        assert_eq!(url, "/static/media/logo.png");
        assert!(dir.path().join("logo.png").is_file());
    }
}
