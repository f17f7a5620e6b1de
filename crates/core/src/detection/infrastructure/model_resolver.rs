use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// A model known by file name and release URL.
#[derive(Clone, Copy, Debug)]
pub struct ModelSource<'a> {
    pub name: &'a str,
    pub url: &'a str,
}

/// Locates model files on disk, downloading them into a cache when missing.
///
/// Resolution order:
/// 1. Cache directory
/// 2. Bundled directory (for development / pre-packaged installs)
/// 3. Download from URL to cache
#[derive(Clone, Debug)]
pub struct ModelResolver {
    cache_dir: PathBuf,
    bundled_dir: Option<PathBuf>,
}

impl ModelResolver {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            bundled_dir: None,
        }
    }

    /// Resolver rooted at the platform cache directory.
    pub fn with_default_cache() -> Result<Self, ModelResolveError> {
        Ok(Self::new(default_cache_dir()?))
    }

    pub fn with_bundled_dir(mut self, dir: PathBuf) -> Self {
        self.bundled_dir = Some(dir);
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Use `explicit` when given (it must exist); otherwise resolve `source`.
    pub fn resolve_or(
        &self,
        explicit: Option<&Path>,
        source: ModelSource<'_>,
    ) -> Result<PathBuf, ModelResolveError> {
        match explicit {
            Some(path) if path.exists() => Ok(path.to_path_buf()),
            Some(path) => Err(ModelResolveError::NotFound(path.to_path_buf())),
            None => self.resolve(source),
        }
    }

    pub fn resolve(&self, source: ModelSource<'_>) -> Result<PathBuf, ModelResolveError> {
        let cached_path = self.cache_dir.join(source.name);
        if cached_path.exists() {
            log::debug!("Using cached model {}", cached_path.display());
            return Ok(cached_path);
        }

        if let Some(dir) = &self.bundled_dir {
            let bundled_path = dir.join(source.name);
            if bundled_path.exists() {
                log::debug!("Using bundled model {}", bundled_path.display());
                return Ok(bundled_path);
            }
        }

        fs::create_dir_all(&self.cache_dir).map_err(ModelResolveError::CacheDir)?;
        log::info!("Downloading {} from {}", source.name, source.url);
        download(source.url, &cached_path)?;
        log::info!("Saved model to {}", cached_path.display());
        Ok(cached_path)
    }
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/FaceCheck/models/`
/// - Linux: `$XDG_CACHE_HOME/FaceCheck/models/` or `~/.cache/FaceCheck/models/`
/// - Windows: `%LOCALAPPDATA%/FaceCheck/models/`
pub fn default_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("FaceCheck").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("FaceCheck").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path);

    // Never leave a truncated .part file behind
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }

    result
}

fn download_inner(url: &str, dest: &Path, temp_path: &Path) -> Result<(), ModelResolveError> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ModelResolveError::Write { path, source }
    };

    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut progress = ProgressLog::new(total);

    let mut file = fs::File::create(temp_path).map_err(write_err(temp_path))?;

    // Stream in chunks; models can exceed 100MB
    let mut reader = response;
    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = reader.read(&mut buf).map_err(write_err(temp_path))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n]).map_err(write_err(temp_path))?;
        progress.advance(n as u64);
    }

    file.flush().map_err(write_err(temp_path))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(write_err(dest))
}

/// Logs download progress at every 10% step.
struct ProgressLog {
    total: u64,
    downloaded: u64,
    last_decile: u64,
}

impl ProgressLog {
    fn new(total: u64) -> Self {
        Self {
            total,
            downloaded: 0,
            last_decile: 0,
        }
    }

    /// Returns the percentage when a new 10% step was crossed.
    fn advance(&mut self, bytes: u64) -> Option<u64> {
        self.downloaded += bytes;
        if self.total == 0 {
            return None;
        }
        let decile = (self.downloaded * 10 / self.total).min(10);
        if decile <= self.last_decile {
            return None;
        }
        self.last_decile = decile;
        let percent = decile * 10;
        log::info!(
            "Model download {percent}% ({} / {} bytes)",
            self.downloaded,
            self.total
        );
        Some(percent)
    }
}
