//! Summaries of downloaded GRIB2 files.
//!
//! Decoding is a collaborator of the fetch core: it receives finished paths and
//! reports, per file, the datasets found inside or an error. A failure on one
//! file never affects the others.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use grib::codetables::{CodeTable4_2, Lookup};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// One homogeneous group of fields, in the spirit of a cfgrib dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub index: usize,
    pub sizes: BTreeMap<String, usize>,
    pub coords: Vec<String>,
    pub data_vars: Vec<String>,
}

pub trait GribDecoder {
    fn summarize(&self, path: &Path) -> Result<Vec<DatasetSummary>>;
}

/// Decoder backed by the pure-Rust `grib` crate. Only metadata is read.
#[derive(Debug, Clone, Copy, Default)]
pub struct GribRsDecoder;

impl GribDecoder for GribRsDecoder {
    fn summarize(&self, path: &Path) -> Result<Vec<DatasetSummary>> {
        let decode_err = |message: String| Error::Decode {
            path: path.to_path_buf(),
            message,
        };

        let f = File::open(path).map_err(|e| decode_err(e.to_string()))?;
        let grib2 = grib::from_reader(BufReader::new(f)).map_err(|e| decode_err(e.to_string()))?;

        let mut fields = Vec::new();
        for (_, submessage) in grib2.iter() {
            let discipline = submessage.indicator().discipline;
            let prod_def = submessage.prod_def();

            let variable = match (prod_def.parameter_category(), prod_def.parameter_number()) {
                (Some(category), Some(number)) => CodeTable4_2::new(discipline, category)
                    .lookup(usize::from(number))
                    .to_string(),
                _ => "unknown".to_string(),
            };
            let first_surface = prod_def.fixed_surfaces().map(|(first, _)| first);

            fields.push(FieldMeta {
                surface_type: first_surface.as_ref().map(|s| s.surface_type),
                level: first_surface.as_ref().map(|s| s.value().to_string()),
                step: prod_def.forecast_time().map(|ft| ft.to_string()),
                variable,
                num_points: submessage.grid_def().num_points() as usize,
            });
        }

        if fields.is_empty() {
            return Err(decode_err("no GRIB2 submessages found".into()));
        }
        debug!(path = %path.display(), fields = fields.len(), "decoded grib metadata");
        Ok(summarize_fields(&fields))
    }
}

/// Metadata of a single GRIB2 field.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldMeta {
    pub surface_type: Option<u8>,
    pub level: Option<String>,
    pub step: Option<String>,
    pub variable: String,
    pub num_points: usize,
}

/// Group fields by fixed-surface type, keeping first-seen order of groups and
/// variables.
pub(crate) fn summarize_fields(fields: &[FieldMeta]) -> Vec<DatasetSummary> {
    struct Group {
        level_name: String,
        levels: HashSet<String>,
        steps: HashSet<String>,
        vars: Vec<String>,
        points: usize,
    }

    let mut order: Vec<Option<u8>> = Vec::new();
    let mut groups: BTreeMap<Option<u8>, Group> = BTreeMap::new();

    for field in fields {
        let group = groups.entry(field.surface_type).or_insert_with(|| {
            order.push(field.surface_type);
            Group {
                level_name: level_name(field.surface_type),
                levels: HashSet::new(),
                steps: HashSet::new(),
                vars: Vec::new(),
                points: 0,
            }
        });
        if let Some(level) = &field.level {
            group.levels.insert(level.clone());
        }
        if let Some(step) = &field.step {
            group.steps.insert(step.clone());
        }
        if !group.vars.contains(&field.variable) {
            group.vars.push(field.variable.clone());
        }
        group.points = group.points.max(field.num_points);
    }

    order
        .iter()
        .enumerate()
        .filter_map(|(index, key)| {
            let g = groups.get(key)?;
            let mut sizes = BTreeMap::new();
            sizes.insert("step".to_string(), g.steps.len().max(1));
            sizes.insert(g.level_name.clone(), g.levels.len().max(1));
            sizes.insert("values".to_string(), g.points);
            Some(DatasetSummary {
                index,
                sizes,
                coords: vec!["time".to_string(), "step".to_string(), g.level_name.clone()],
                data_vars: g.vars.clone(),
            })
        })
        .collect()
}

/// Code Table 4.5 names as used by cfgrib's `typeOfLevel`.
fn level_name(surface_type: Option<u8>) -> String {
    match surface_type {
        Some(1) => "surface".to_string(),
        Some(100) => "isobaricInhPa".to_string(),
        Some(101) => "meanSea".to_string(),
        Some(102) => "heightAboveSea".to_string(),
        Some(103) => "heightAboveGround".to_string(),
        Some(105) => "hybrid".to_string(),
        Some(106) => "depthBelowLandLayer".to_string(),
        Some(n) => format!("surfaceType{n}"),
        None => "unknownLevel".to_string(),
    }
}

/// Matches of `pattern` followed by the explicit `paths`, first occurrence kept.
///
/// Unreadable directory entries met while globbing are skipped.
pub fn expand_inputs(pattern: Option<&str>, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    if let Some(pattern) = pattern {
        let matches = glob::glob(pattern)
            .map_err(|e| Error::InvalidInput(format!("invalid glob pattern {pattern:?}: {e}")))?;
        for entry in matches {
            match entry {
                Ok(p) => found.push(p),
                Err(e) => debug!(error = %e, "skipping unreadable glob entry"),
            }
        }
    }
    found.extend(paths.iter().cloned());

    let mut seen = HashSet::new();
    found.retain(|p| seen.insert(p.clone()));
    Ok(found)
}

/// Summarize each path independently, de-duplicating while keeping order.
pub fn inspect_files<D>(
    decoder: &D,
    paths: &[PathBuf],
) -> Vec<(PathBuf, Result<Vec<DatasetSummary>>)>
where
    D: GribDecoder + ?Sized,
{
    let mut seen = HashSet::new();
    paths
        .iter()
        .filter(|p| seen.insert((*p).clone()))
        .map(|p| {
            let res = if p.is_file() {
                decoder.summarize(p)
            } else {
                Err(Error::Decode {
                    path: p.clone(),
                    message: "not a file".into(),
                })
            };
            if let Err(e) = &res {
                warn!(path = %p.display(), error = %e, "inspection failed");
            }
            (p.clone(), res)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct FakeDecoder;

    impl GribDecoder for FakeDecoder {
        fn summarize(&self, path: &Path) -> Result<Vec<DatasetSummary>> {
            if path.extension().is_some_and(|e| e == "bad") {
                return Err(Error::Decode {
                    path: path.to_path_buf(),
                    message: "corrupt".into(),
                });
            }
            Ok(vec![DatasetSummary {
                index: 0,
                sizes: BTreeMap::new(),
                coords: vec![],
                data_vars: vec!["t".into()],
            }])
        }
    }

    fn field(surface: u8, level: &str, var: &str) -> FieldMeta {
        FieldMeta {
            surface_type: Some(surface),
            level: Some(level.to_string()),
            step: Some("0 Hour".to_string()),
            variable: var.to_string(),
            num_points: 720 * 361,
        }
    }

    #[test]
    fn groups_by_surface_type() {
        let fields = vec![
            field(100, "85000", "Temperature"),
            field(100, "50000", "Temperature"),
            field(100, "85000", "Geopotential height"),
            field(101, "0", "Pressure reduced to MSL"),
            field(100, "30000", "Temperature"),
        ];
        let out = summarize_fields(&fields);
        assert_eq!(out.len(), 2);

        assert_eq!(out[0].index, 0);
        assert_eq!(out[0].sizes["isobaricInhPa"], 3);
        assert_eq!(out[0].sizes["step"], 1);
        assert_eq!(out[0].sizes["values"], 720 * 361);
        assert_eq!(out[0].data_vars, vec!["Temperature", "Geopotential height"]);
        assert_eq!(out[0].coords, vec!["time", "step", "isobaricInhPa"]);

        assert_eq!(out[1].index, 1);
        assert_eq!(out[1].data_vars, vec!["Pressure reduced to MSL"]);
        assert_eq!(out[1].sizes["meanSea"], 1);
    }

    #[test]
    fn unknown_surface_gets_generic_name() {
        let mut f = field(7, "0", "x");
        assert_eq!(summarize_fields(&[f.clone()])[0].coords[2], "surfaceType7");
        f.surface_type = None;
        assert_eq!(summarize_fields(&[f])[0].coords[2], "unknownLevel");
    }

    #[test]
    fn inspect_reports_errors_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.bin");
        let bad = dir.path().join("b.bad");
        fs::write(&good, b"x").unwrap();
        fs::write(&bad, b"x").unwrap();
        let missing = dir.path().join("missing.bin");

        let paths = vec![
            good.clone(),
            bad.clone(),
            good.clone(),
            missing.clone(),
            dir.path().to_path_buf(),
        ];
        let out = inspect_files(&FakeDecoder, &paths);

        assert_eq!(out.len(), 4);
        assert_eq!(out[0].0, good);
        assert!(out[0].1.is_ok());
        assert!(matches!(out[1].1, Err(Error::Decode { .. })));
        assert_eq!(out[2].0, missing);
        assert!(matches!(&out[2].1, Err(Error::Decode { message, .. }) if message == "not a file"));
        assert!(out[3].1.is_err());
    }

    #[test]
    fn expand_inputs_puts_glob_matches_first_without_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        let other = dir.path().join("c.idx");
        for p in [&a, &b, &other] {
            fs::write(p, b"x").unwrap();
        }

        let root = glob::Pattern::escape(&dir.path().to_string_lossy());
        let pattern = format!("{root}/*.bin");
        let out = expand_inputs(Some(&pattern), &[other.clone(), a.clone()]).unwrap();
        assert_eq!(out, vec![a, b, other]);
    }

    #[test]
    fn expand_inputs_without_glob_keeps_explicit_order() {
        let paths = vec![
            PathBuf::from("z.bin"),
            PathBuf::from("a.bin"),
            PathBuf::from("z.bin"),
        ];
        let out = expand_inputs(None, &paths).unwrap();
        assert_eq!(out, vec![PathBuf::from("z.bin"), PathBuf::from("a.bin")]);

        let none = expand_inputs(Some("nothing-matches-*.grib2"), &[]).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn expand_inputs_rejects_bad_pattern() {
        let err = expand_inputs(Some("data/[*.bin"), &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn grib_decoder_rejects_non_grib_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("not_grib.bin");
        fs::write(&p, b"<html>login required</html>").unwrap();
        let err = GribRsDecoder.summarize(&p).unwrap_err();
        assert!(matches!(err, Error::Decode { path, .. } if path == p));
    }
}
