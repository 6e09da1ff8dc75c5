use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Default base URL of the high-resolution ("Closed") GSM tree on the WIS portal.
pub const DEFAULT_RESTRICTED_BASE_URL: &str =
    "https://www.wis-jma.go.jp/d/c/RJTD/GRIB/Global_Spectral_Model/Latitude_Longitude/";

/// Default base URL of the open GRIB tree on the WIS portal.
pub const DEFAULT_OPEN_BASE_URL: &str = "https://www.wis-jma.go.jp/d/o/RJTD/GRIB/";

pub fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Grid spacing of the high-resolution product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridResolution {
    HalfDegree,
    QuarterDegree,
}

impl GridResolution {
    pub const ALL: [GridResolution; 2] =
        [GridResolution::HalfDegree, GridResolution::QuarterDegree];

    /// Directory segment, e.g. `0.5_0.5`.
    pub fn dir_token(self) -> &'static str {
        match self {
            GridResolution::HalfDegree => "0.5_0.5",
            GridResolution::QuarterDegree => "0.25_0.25",
        }
    }

    /// Global coverage as published: `north_south_west_east`.
    pub fn global_bbox_token(self) -> &'static str {
        match self {
            GridResolution::HalfDegree => "90.0_-90.0_0.0_359.5",
            GridResolution::QuarterDegree => "90.0_-90.0_0.0_359.75",
        }
    }

    pub fn filename_token(self) -> &'static str {
        match self {
            GridResolution::HalfDegree => "Gll0p5deg",
            GridResolution::QuarterDegree => "Gll0p25deg",
        }
    }

    /// Degree string used on the command line and in local store paths.
    pub fn degrees(self) -> &'static str {
        match self {
            GridResolution::HalfDegree => "0.5",
            GridResolution::QuarterDegree => "0.25",
        }
    }
}

impl FromStr for GridResolution {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0.5" | "0p5" => Ok(GridResolution::HalfDegree),
            "0.25" | "0p25" => Ok(GridResolution::QuarterDegree),
            other => Err(Error::UnsupportedGrid(other.to_string())),
        }
    }
}

impl fmt::Display for GridResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.degrees())
    }
}

/// Lead-time ranges published for the open 1.25 degree product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OpenLeadRange {
    /// 0 to 132 hours.
    #[default]
    Early,
    /// 144 to 264 hours.
    Late,
}

impl OpenLeadRange {
    pub const ALL: [OpenLeadRange; 2] = [OpenLeadRange::Early, OpenLeadRange::Late];

    pub fn token(self) -> &'static str {
        match self {
            OpenLeadRange::Early => "FD0000-0512",
            OpenLeadRange::Late => "FD0600-1100",
        }
    }
}

impl FromStr for OpenLeadRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "FD0000-0512" => Ok(OpenLeadRange::Early),
            "FD0600-1100" => Ok(OpenLeadRange::Late),
            other => Err(Error::InvalidInput(format!(
                "lead range must be FD0000-0512 or FD0600-1100, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for OpenLeadRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
