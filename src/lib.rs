#![forbid(unsafe_code)]

//! Resolve and fetch JMA Global Spectral Model (GSM) GRIB2 files.
//!
//! Two product lines are published on the JMA WIS portal:
//! - the high-resolution GSM (0.5 and 0.25 degree) under the "Closed" tree,
//!   which may require HTTP Basic credentials;
//! - the open deterministic GSM at 1.25 degree, anonymous.
//!
//! Given a run (date + cycle hour), a grid and a lead time, this crate derives
//! the remote URL and the local store path deterministically, then
//! materializes the file exactly once: a complete file already on disk is
//! never downloaded again, and a partially transferred file never shows up at
//! the final path.
//!
//! **Quick start**
//! ```no_run
//! use jma_gsm_fetch::{Client, Config, GridResolution, OpenLeadRange, RunIdentity};
//!
//! let client = Client::new(Config::from_env()?)?;
//! let run = RunIdentity::parse_run_id("2026013000")?;
//!
//! let hr = client.download_restricted(&run, GridResolution::HalfDegree, 132, false)?;
//! println!("{} ({} bytes)", hr.path.display(), hr.size_bytes);
//!
//! let open = client.download_open(&run, OpenLeadRange::Early, false)?;
//! println!("{}", open.url);
//! # Ok::<(), jma_gsm_fetch::Error>(())
//! ```
//!
//! **Pure resolution**
//! ```
//! use jma_gsm_fetch::{build_open_upper_air_url, fd_code, RunIdentity};
//!
//! assert_eq!(fd_code(132)?, "FD0512");
//!
//! let run = RunIdentity::parse_run_id("2026013000")?;
//! let url = build_open_upper_air_url("https://www.wis-jma.go.jp/d/o/RJTD/GRIB/", &run, "FD0000-0512");
//! assert!(url.ends_with("C_RJTD_20260130000000_GSM_GPV_Rgl_Gll1p25deg_L-all_FD0000-0512_grib2.bin"));
//! # Ok::<(), jma_gsm_fetch::Error>(())
//! ```

mod client;
mod config;
mod decode;
mod error;
mod fetch;
mod lead_time;
mod product;
mod run;
mod store;
mod url_builder;

pub use crate::client::{Client, Download};
pub use crate::config::{
    Config, ENV_DATA_DIR, ENV_DATA_DIR_LEGACY, ENV_OPEN_BASE_URL, ENV_PASSWORD,
    ENV_RESTRICTED_BASE_URL, ENV_RESTRICTED_BASE_URL_LEGACY, ENV_USER,
};
pub use crate::decode::{DatasetSummary, GribDecoder, GribRsDecoder, expand_inputs, inspect_files};
pub use crate::error::{DownloadCause, Error, Result};
pub use crate::fetch::{Credentials, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, Fetched, Fetcher};
pub use crate::lead_time::fd_code;
pub use crate::product::{
    DEFAULT_OPEN_BASE_URL, DEFAULT_RESTRICTED_BASE_URL, GridResolution, OpenLeadRange,
};
pub use crate::run::{RunIdentity, SYNOPTIC_HOURS, recent_cycles};
pub use crate::store::LocalStore;
pub use crate::url_builder::{
    build_open_upper_air_url, build_restricted_upper_air_url, filename_from_url,
    open_upper_air_filename, restricted_upper_air_filename,
};
