use std::path::PathBuf;

use chrono::{DateTime, TimeZone};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::fetch::{Fetched, Fetcher};
use crate::product::{GridResolution, OpenLeadRange};
use crate::run::{RunIdentity, recent_cycles};
use crate::store::LocalStore;
use crate::url_builder::{
    build_open_upper_air_url, build_restricted_upper_air_url, filename_from_url,
};

/// One resolved and reconciled file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub url: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    /// The file was already complete locally and no request was made.
    pub skipped: bool,
}

/// Resolves GSM files and fetches them into the configured store.
#[derive(Debug, Clone)]
pub struct Client {
    config: Config,
    store: LocalStore,
    fetcher: Fetcher,
}

impl Client {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::with_user_agent(&config.user_agent)?;
        let store = LocalStore::new(config.data_dir.clone());
        Ok(Self {
            config,
            store,
            fetcher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Remote URL and local path of a high-resolution upper-air file.
    pub fn resolve_restricted(
        &self,
        run: &RunIdentity,
        grid: GridResolution,
        lead_hours: i64,
    ) -> Result<(String, PathBuf)> {
        let url = build_restricted_upper_air_url(
            &self.config.restricted_base_url,
            grid,
            run,
            lead_hours,
        )?;
        let filename = filename_from_url(&url)?;
        let path = self.store.path_for_restricted(grid, run, &filename);
        debug!(%run, %grid, lead_hours, url = %url, path = %path.display(), "resolved restricted file");
        Ok((url, path))
    }

    /// Remote URL and local path of an open 1.25 degree upper-air file.
    pub fn resolve_open(
        &self,
        run: &RunIdentity,
        range: OpenLeadRange,
    ) -> Result<(String, PathBuf)> {
        let url = build_open_upper_air_url(&self.config.open_base_url, run, range.token());
        let filename = filename_from_url(&url)?;
        let path = self.store.path_for_open(run, &filename);
        debug!(%run, %range, url = %url, path = %path.display(), "resolved open file");
        Ok((url, path))
    }

    /// Fetch one high-resolution file, authenticating when credentials are configured.
    pub fn download_restricted(
        &self,
        run: &RunIdentity,
        grid: GridResolution,
        lead_hours: i64,
        overwrite: bool,
    ) -> Result<Download> {
        let (url, path) = self.resolve_restricted(run, grid, lead_hours)?;
        let fetched = self.fetcher.fetch(
            &url,
            &path,
            self.config.credentials.as_ref(),
            overwrite,
            self.config.timeout,
        )?;
        Ok(Download::from_fetched(url, fetched))
    }

    /// Fetch one open-product file. Always anonymous.
    pub fn download_open(
        &self,
        run: &RunIdentity,
        range: OpenLeadRange,
        overwrite: bool,
    ) -> Result<Download> {
        let (url, path) = self.resolve_open(run, range)?;
        let fetched = self
            .fetcher
            .fetch(&url, &path, None, overwrite, self.config.timeout)?;
        Ok(Download::from_fetched(url, fetched))
    }

    /// Fetch several lead times of one run. A failure is recorded for its lead
    /// time and the remaining ones are still attempted.
    pub fn download_restricted_many(
        &self,
        run: &RunIdentity,
        grid: GridResolution,
        lead_hours: &[i64],
        overwrite: bool,
    ) -> Vec<(i64, Result<Download>)> {
        lead_hours
            .iter()
            .map(|&fh| {
                let res = self.download_restricted(run, grid, fh, overwrite);
                if let Err(e) = &res {
                    warn!(%run, %grid, lead_hours = fh, error = %e, "download failed");
                }
                (fh, res)
            })
            .collect()
    }

    /// Newest run among the `max_cycles` cycles at or before `now` whose open
    /// file for `range` is published. Nothing is written to disk.
    pub fn latest_open_run<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        max_cycles: usize,
        range: OpenLeadRange,
    ) -> Result<Option<RunIdentity>> {
        for run in recent_cycles(now, max_cycles) {
            let url = build_open_upper_air_url(&self.config.open_base_url, &run, range.token());
            if self.fetcher.probe_exists(&url, None, self.config.timeout)? {
                info!(%run, "latest published open run");
                return Ok(Some(run));
            }
            debug!(%run, "open run not published yet");
        }
        Ok(None)
    }
}

impl Download {
    fn from_fetched(url: String, fetched: Fetched) -> Self {
        Self {
            url,
            path: fetched.path,
            size_bytes: fetched.size_bytes,
            skipped: fetched.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn client(data_dir: &str) -> Client {
        Client::new(Config {
            data_dir: PathBuf::from(data_dir),
            restricted_base_url: "https://hr.test/base/".into(),
            open_base_url: "https://open.test/grib".into(),
            ..Config::default()
        })
        .unwrap()
    }

    #[test]
    fn resolve_restricted_mirrors_remote_filename() {
        let c = client("data");
        let run = RunIdentity::parse_run_id("2026013006").unwrap();
        let (url, path) = c
            .resolve_restricted(&run, GridResolution::HalfDegree, 264)
            .unwrap();
        assert_eq!(
            url,
            "https://hr.test/base/0.5_0.5/90.0_-90.0_0.0_359.5/Upper_air_layers/20260130/060000/GSM_GPV_Rgl_Gll0p5deg_L-pall_FD1100_grib2.bin"
        );
        assert_eq!(
            path,
            PathBuf::from(
                "data/raw/jma_gsm_hr/grid_0.5/global/20260130/060000/GSM_GPV_Rgl_Gll0p5deg_L-pall_FD1100_grib2.bin"
            )
        );
    }

    #[test]
    fn resolve_open_uses_open_store() {
        let c = client("data");
        let run = RunIdentity::parse_run_id("2026013000").unwrap();
        let (url, path) = c.resolve_open(&run, OpenLeadRange::Late).unwrap();
        assert!(url.starts_with("https://open.test/grib/Global_Spectral_Model/"));
        assert!(path.starts_with("data/raw/jma_gsm_open/gsm_1p25/upper_air_global/20260130/000000"));
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            filename_from_url(&url).unwrap()
        );
    }

    #[test]
    fn invalid_lead_time_fails_before_io() {
        let dir = tempfile::tempdir().unwrap();
        let c = client(dir.path().to_str().unwrap());
        let run = RunIdentity::parse_run_id("2026013000").unwrap();
        let err = c
            .download_restricted(&run, GridResolution::QuarterDegree, -1, false)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(!dir.path().join("raw").exists());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let err = Client::new(Config {
            open_base_url: "not a url".into(),
            ..Config::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
