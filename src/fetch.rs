use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, RANGE, USER_AGENT};
use tracing::{debug, info, instrument};

use crate::error::{DownloadCause, Error, Result};

/// User agent sent with every request unless overridden in [`Config`](crate::Config).
pub const DEFAULT_USER_AGENT: &str = concat!("jma-gsm-fetch/", env!("CARGO_PKG_VERSION"));

/// Default timeout for a whole transfer; upper-air files are 100MB+.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const TEMP_SUFFIX: &str = ".part";

/// Static HTTP Basic credentials for the restricted product.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Both parts must be present and non-empty, otherwise requests stay anonymous.
    pub fn from_parts(user: Option<String>, password: Option<String>) -> Option<Self> {
        match (user, password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some(Self::new(u, p)),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Outcome of a single [`Fetcher::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// `true` when a complete file was already present and no request was made.
    pub skipped: bool,
}

/// Blocking single-shot downloader with atomic publish.
///
/// Holds only a pooled HTTP client; fetches for different destinations can run
/// from several threads at once. Two fetches of the same destination are not
/// coordinated: each writes its own temporary file and the last rename wins.
#[derive(Debug, Clone)]
pub struct Fetcher {
    http: HttpClient,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|_| Error::InvalidInput(format!("invalid user agent: {user_agent:?}")))?,
        );

        let http = HttpClient::builder().default_headers(headers).build()?;
        Ok(Self { http })
    }

    /// Materialize `url` at `destination`.
    ///
    /// Unless `overwrite` is set, a non-empty file already at `destination` is
    /// returned as is. Otherwise the body is written to a sibling
    /// `<name>.<random>.part` file and renamed onto `destination`, so the
    /// destination never holds a partial transfer.
    #[instrument(level = "debug", skip(self, credentials), fields(auth = credentials.is_some()))]
    pub fn fetch(
        &self,
        url: &str,
        destination: &Path,
        credentials: Option<&Credentials>,
        overwrite: bool,
        timeout: Duration,
    ) -> Result<Fetched> {
        let io_err = |e: io::Error| Error::download(url, destination, DownloadCause::Io(e));

        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(io_err)?;

        if !overwrite {
            if let Some(size) = complete_file_size(destination) {
                info!(path = %destination.display(), size, "file already present, skipping download");
                return Ok(Fetched {
                    path: destination.to_path_buf(),
                    size_bytes: size,
                    skipped: true,
                });
            }
        }

        let mut request = self.http.get(url).timeout(timeout);
        if let Some(c) = credentials {
            request = request.basic_auth(&c.user, Some(&c.password));
        }

        info!(url, "downloading");
        let mut resp = request
            .send()
            .map_err(|e| Error::download(url, destination, DownloadCause::Transport(e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::download(
                url,
                destination,
                DownloadCause::Status(status.as_u16()),
            ));
        }
        debug!(content_length = ?resp.content_length(), "response headers received");

        let prefix = format!(
            "{}.",
            destination
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "download".to_string())
        );
        // Dropped (and removed) on any early return below.
        let tmp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(parent)
            .map_err(io_err)?;

        let size = {
            let mut writer = BufWriter::new(tmp.as_file());
            let n = io::copy(&mut resp, &mut writer).map_err(io_err)?;
            writer.flush().map_err(io_err)?;
            n
        };
        tmp.as_file().sync_all().map_err(io_err)?;

        tmp.persist(destination).map_err(|e| io_err(e.error))?;

        info!(path = %destination.display(), size, "download complete");
        Ok(Fetched {
            path: destination.to_path_buf(),
            size_bytes: size,
            skipped: false,
        })
    }

    /// Probe a URL for existence without downloading it.
    ///
    /// Tries HEAD first. Some endpoints refuse HEAD even though GET works; in
    /// that case a single-byte ranged GET decides.
    pub fn probe_exists(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
        timeout: Duration,
    ) -> Result<bool> {
        let mut head = self.http.head(url).timeout(timeout);
        if let Some(c) = credentials {
            head = head.basic_auth(&c.user, Some(&c.password));
        }

        match head.send() {
            Ok(resp) => {
                if resp.status().is_success() {
                    return Ok(true);
                }
                if !matches!(
                    resp.status().as_u16(),
                    403 | 405 | 409 | 429 | 500 | 501 | 502 | 503
                ) {
                    debug!(url, status = resp.status().as_u16(), "probe: not available");
                    return Ok(false);
                }
            }
            Err(e) => {
                debug!(url, error = %e, "probe: HEAD failed, falling back to ranged GET");
            }
        }

        let mut get = self
            .http
            .get(url)
            .header(RANGE, "bytes=0-0")
            .timeout(timeout);
        if let Some(c) = credentials {
            get = get.basic_auth(&c.user, Some(&c.password));
        }
        let resp = get.send()?;

        Ok(matches!(resp.status().as_u16(), 200 | 206))
    }
}

fn complete_file_size(path: &Path) -> Option<u64> {
    let meta = fs::metadata(path).ok()?;
    (meta.is_file() && meta.len() > 0).then_some(meta.len())
}
