use std::path::{Path, PathBuf};

use crate::product::GridResolution;
use crate::run::RunIdentity;

/// Local mirror of the remote trees, split per product line under `raw/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn restricted_dir(&self) -> PathBuf {
        self.raw_dir().join("jma_gsm_hr")
    }

    pub fn open_dir(&self) -> PathBuf {
        self.raw_dir().join("jma_gsm_open")
    }

    /// `raw/jma_gsm_hr/grid_<res>/global/<YYYYMMDD>/<HH>0000/<filename>`
    pub fn path_for_restricted(
        &self,
        grid: GridResolution,
        run: &RunIdentity,
        filename: &str,
    ) -> PathBuf {
        self.restricted_dir()
            .join(format!("grid_{}", grid.degrees()))
            .join("global")
            .join(run.date_token())
            .join(run.cycle_dir())
            .join(filename)
    }

    /// `raw/jma_gsm_open/gsm_1p25/upper_air_global/<YYYYMMDD>/<HH>0000/<filename>`
    pub fn path_for_open(&self, run: &RunIdentity, filename: &str) -> PathBuf {
        self.open_dir()
            .join("gsm_1p25")
            .join("upper_air_global")
            .join(run.date_token())
            .join(run.cycle_dir())
            .join(filename)
    }
}
