//! Fetches DAS annotation documents through a content-addressed disk cache
//! and runs them through parsing, gene aggregation and lane layout.
//!
//! Cache files live at `<cache dir>/<sha256 of source>.xml` and never expire.
//! A source is only written to the cache after it parsed successfully, and
//! always through a `.part` file that is renamed into place, so a failed or
//! interrupted load never leaves a cache entry behind.

use crate::{
    annotation::{Exon, Gene, ViewScale},
    das_xml::{parse_das_xml_text, ParsedAnnotations},
    error::{DigestError, FetchError, LoadError},
    gene_builder::build_genes,
    track_layout::assign_orders,
};
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    ffi::OsString,
    fs::{self, File},
    io::{BufWriter, ErrorKind, Read, Write},
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_DAS_URL: &str = "http://genome.ucsc.edu/cgi-bin/das/hg19/features?segment=1:500000,900000;type=refGene;type=knownGene;";
pub const CACHE_FILE_EXTENSION: &str = "xml";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Loader settings, usually read from a JSON file. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Defaults to the system temp directory.
    #[serde(default)]
    pub cache_dir: Option<String>,
    /// Upper bound on one HTTP request; 0 disables the bound.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_use_system_proxy")]
    pub use_system_proxy: bool,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_use_system_proxy() -> bool {
    true
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            timeout_secs: default_timeout_secs(),
            use_system_proxy: default_use_system_proxy(),
            user_agent: None,
        }
    }
}

impl LoaderConfig {
    pub fn from_json_file(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Could not read loader config '{path}'"))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Could not parse loader config '{path}'"))
    }
}

/// Everything the renderer needs for one view: the window, the exons and
/// the genes, each carrying its lane.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AnnotationTrack {
    pub view_scale: Option<ViewScale>,
    pub exons: Vec<Exon>,
    pub genes: Vec<Gene>,
}

impl AnnotationTrack {
    pub fn from_parsed(parsed: ParsedAnnotations) -> Self {
        let ParsedAnnotations {
            view_scale,
            mut exons,
        } = parsed;
        let mut genes = build_genes(&exons);
        assign_orders(&mut genes, &mut exons);
        Self {
            view_scale,
            exons,
            genes,
        }
    }
}

/// Lowercase hex SHA-256 of the source string.
pub fn cache_key(source: &str) -> Result<String, DigestError> {
    if source.trim().is_empty() {
        return Err(DigestError::EmptySource);
    }
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    let digest = hasher.finalize();
    Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationLoader {
    config: LoaderConfig,
}

impl AnnotationLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.config
            .cache_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn cache_path(&self, source: &str) -> Result<PathBuf, DigestError> {
        let key = cache_key(source)?;
        Ok(self
            .cache_dir()
            .join(format!("{key}.{CACHE_FILE_EXTENSION}")))
    }

    pub fn is_cached(&self, source: &str) -> Result<bool, DigestError> {
        Ok(self.cache_path(source)?.is_file())
    }

    /// Resolves `source` to parsed annotations, from cache when possible.
    pub fn load(&self, source: &str) -> Result<ParsedAnnotations, LoadError> {
        let cache_path = self.cache_path(source)?;
        if let Some(parsed) = read_from_cache(&cache_path)? {
            return Ok(parsed);
        }
        self.read_from_source(source, &cache_path)
    }

    /// `load` followed by gene aggregation and lane assignment.
    pub fn load_track(&self, source: &str) -> Result<AnnotationTrack, LoadError> {
        let track = AnnotationTrack::from_parsed(self.load(source)?);
        info!(
            "Loaded {} exons in {} genes from '{source}'",
            track.exons.len(),
            track.genes.len()
        );
        Ok(track)
    }

    fn read_from_source(
        &self,
        source: &str,
        cache_path: &Path,
    ) -> Result<ParsedAnnotations, LoadError> {
        let body = self.fetch_source(source)?;
        let parsed = parse_das_xml_text(&body)?;
        match write_cache_file(cache_path, body.as_bytes()) {
            Ok(()) => debug!("Cached '{source}' as '{}'", cache_path.display()),
            Err(e) => warn!("{e}"),
        }
        Ok(parsed)
    }

    fn fetch_source(&self, source: &str) -> Result<String, FetchError> {
        if is_http_source(source) {
            return self.fetch_http(source);
        }
        let path = local_source_path(source);
        info!("Reading annotations from '{path}'");
        read_local_source(path).map_err(|e| FetchError::Read {
            source_name: path.to_string(),
            source: e,
        })
    }

    fn fetch_http(&self, url: &str) -> Result<String, FetchError> {
        info!("Fetching annotations from '{url}'");
        let client = self
            .http_client()
            .map_err(|e| self.request_error(url, e))?;
        let response = client
            .get(url)
            .send()
            .map_err(|e| self.request_error(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().map_err(|e| self.request_error(url, e))
    }

    fn http_client(&self) -> reqwest::Result<reqwest::blocking::Client> {
        let mut builder = reqwest::blocking::Client::builder();
        if self.config.timeout_secs > 0 {
            let timeout = Duration::from_secs(self.config.timeout_secs);
            builder = builder.timeout(timeout).connect_timeout(timeout);
        }
        if !self.config.use_system_proxy {
            builder = builder.no_proxy();
        }
        if let Some(user_agent) = &self.config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        builder.build()
    }

    fn request_error(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.config.timeout_secs,
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                source: e,
            }
        }
    }
}

fn is_http_source(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Strips a `file://` scheme, matched case-insensitively like the HTTP schemes.
fn local_source_path(source: &str) -> &str {
    const FILE_SCHEME: &str = "file://";
    match source.get(..FILE_SCHEME.len()) {
        Some(scheme) if scheme.eq_ignore_ascii_case(FILE_SCHEME) => &source[FILE_SCHEME.len()..],
        _ => source,
    }
}

fn is_gzip_source(source: &str) -> bool {
    source.to_ascii_lowercase().ends_with(".gz")
}

fn read_local_source(path: &str) -> std::io::Result<String> {
    if !is_gzip_source(path) {
        return fs::read_to_string(path);
    }
    let mut text = String::new();
    GzDecoder::new(File::open(path)?).read_to_string(&mut text)?;
    Ok(text)
}

/// A cache file that no longer parses is removed and reported as a miss.
fn read_from_cache(path: &Path) -> Result<Option<ParsedAnnotations>, LoadError> {
    if !path.is_file() {
        debug!("Cache miss for '{}'", path.display());
        return Ok(None);
    }
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            discard_cache_file(path, &e);
            return Ok(None);
        }
        Err(e) => {
            return Err(LoadError::Io {
                path: path.display().to_string(),
                source: e,
            });
        }
    };
    match parse_das_xml_text(&text) {
        Ok(parsed) => {
            info!("Read annotations from cache '{}'", path.display());
            Ok(Some(parsed))
        }
        Err(e) => {
            discard_cache_file(path, &e);
            Ok(None)
        }
    }
}

fn discard_cache_file(path: &Path, reason: &dyn std::fmt::Display) {
    warn!("Discarding unreadable cache file '{}': {reason}", path.display());
    if let Err(e) = fs::remove_file(path) {
        warn!("Could not remove '{}': {e}", path.display());
    }
}

fn write_cache_file(destination: &Path, bytes: &[u8]) -> Result<(), FetchError> {
    let cache_write_error = |path: &Path, e: std::io::Error| FetchError::CacheWrite {
        path: path.display().to_string(),
        source: e,
    };

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| cache_write_error(parent, e))?;
    }
    let mut tmp_os: OsString = destination.as_os_str().to_os_string();
    tmp_os.push(".part");
    let tmp_path = PathBuf::from(tmp_os);

    let written = File::create(&tmp_path).and_then(|file| {
        let mut writer = BufWriter::new(file);
        writer.write_all(bytes)?;
        writer.flush()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(cache_write_error(&tmp_path, e));
    }
    fs::rename(&tmp_path, destination).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        cache_write_error(destination, e)
    })
}
