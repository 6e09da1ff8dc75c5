use url::Url;

use crate::error::{Error, Result};
use crate::lead_time::fd_code;
use crate::product::GridResolution;
use crate::run::RunIdentity;

const UPPER_AIR_LAYERS: &str = "Upper_air_layers";

const OPEN_GSM_1P25_SUBDIR: &str =
    "Global_Spectral_Model/Latitude_Longitude/1.25_1.25/90.0_-90.0_0.0_358.75/Upper_air_layers";

/// Filename of a high-resolution upper-air file, e.g.
/// `GSM_GPV_Rgl_Gll0p5deg_L-pall_FD0512_grib2.bin`.
pub fn restricted_upper_air_filename(grid: GridResolution, lead_hours: i64) -> Result<String> {
    let fd = fd_code(lead_hours)?;
    Ok(format!(
        "GSM_GPV_Rgl_{}_L-pall_{fd}_grib2.bin",
        grid.filename_token()
    ))
}

/// Filename of an open 1.25 degree upper-air file, e.g.
/// `W_jp-JMA-tokyo,MODEL,JMA+gsm+gpv,C_RJTD_20260130000000_GSM_GPV_Rgl_Gll1p25deg_L-all_FD0000-0512_grib2.bin`.
pub fn open_upper_air_filename(run: &RunIdentity, lead_range: &str) -> String {
    format!(
        "W_jp-JMA-tokyo,MODEL,JMA+gsm+gpv,C_RJTD_{}_GSM_GPV_Rgl_Gll1p25deg_L-all_{lead_range}_grib2.bin",
        run.init_stamp()
    )
}

/// High-resolution (restricted) upper-air file for the global domain.
pub fn build_restricted_upper_air_url(
    base_url: &str,
    grid: GridResolution,
    run: &RunIdentity,
    lead_hours: i64,
) -> Result<String> {
    let fname = restricted_upper_air_filename(grid, lead_hours)?;
    Ok(join_segments(&[
        base_url.trim_end_matches('/'),
        grid.dir_token(),
        grid.global_bbox_token(),
        UPPER_AIR_LAYERS,
        &run.date_token(),
        &run.cycle_dir(),
        &fname,
    ]))
}

/// Open deterministic global GSM (1.25 degree) upper-air file.
///
/// `lead_range` is used verbatim; parse it into an
/// [`OpenLeadRange`](crate::OpenLeadRange) first when it comes from user input.
pub fn build_open_upper_air_url(base_url: &str, run: &RunIdentity, lead_range: &str) -> String {
    join_segments(&[
        base_url.trim_end_matches('/'),
        OPEN_GSM_1P25_SUBDIR,
        &run.date_token(),
        &run.cycle_dir(),
        &open_upper_air_filename(run, lead_range),
    ])
}

/// Last path segment of a resolved URL; files keep their remote name on disk.
pub fn filename_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    parsed
        .path_segments()
        .and_then(|mut segs| segs.next_back())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .ok_or_else(|| Error::InvalidInput(format!("url has no filename: {url}")))
}

fn join_segments(segments: &[&str]) -> String {
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::OpenLeadRange;

    const HR_BASE: &str =
        "https://www.wis-jma.go.jp/d/c/RJTD/GRIB/Global_Spectral_Model/Latitude_Longitude/";
    const OPEN_BASE: &str = "https://www.wis-jma.go.jp/d/o/RJTD/GRIB/";

    fn run() -> RunIdentity {
        RunIdentity::parse_run_id("2026013000").unwrap()
    }

    #[test]
    fn restricted_half_degree_url() {
        let url = build_restricted_upper_air_url(HR_BASE, GridResolution::HalfDegree, &run(), 132)
            .unwrap();
        assert_eq!(
            url,
            "https://www.wis-jma.go.jp/d/c/RJTD/GRIB/Global_Spectral_Model/Latitude_Longitude/\
             0.5_0.5/90.0_-90.0_0.0_359.5/Upper_air_layers/20260130/000000/\
             GSM_GPV_Rgl_Gll0p5deg_L-pall_FD0512_grib2.bin"
        );
    }

    #[test]
    fn restricted_url_is_pure_and_ends_with_fd_code() {
        let r = RunIdentity::parse_run_id("2026020112").unwrap();
        for grid in GridResolution::ALL {
            for fh in [0, 6, 84, 264] {
                let a = build_restricted_upper_air_url(HR_BASE, grid, &r, fh).unwrap();
                let b = build_restricted_upper_air_url(HR_BASE, grid, &r, fh).unwrap();
                assert_eq!(a, b);
                let suffix = format!("{}_grib2.bin", fd_code(fh).unwrap());
                assert!(a.ends_with(&suffix), "{a}");
                assert!(a.contains(&format!("/{}/", grid.dir_token())));
                assert!(a.contains("/120000/"));
                assert!(!a.contains("//Upper"));
            }
        }
    }

    #[test]
    fn restricted_url_rejects_negative_lead() {
        assert!(matches!(
            build_restricted_upper_air_url(HR_BASE, GridResolution::QuarterDegree, &run(), -6),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn trailing_slashes_are_normalized() {
        let a = build_open_upper_air_url("https://example.test/grib///", &run(), "FD0000-0512");
        let b = build_open_upper_air_url("https://example.test/grib", &run(), "FD0000-0512");
        assert_eq!(a, b);
        assert!(a.starts_with("https://example.test/grib/Global_Spectral_Model/"));
    }

    #[test]
    fn open_url_builder_example() {
        let url = build_open_upper_air_url(OPEN_BASE, &run(), OpenLeadRange::Early.token());
        assert!(url.contains("Global_Spectral_Model/Latitude_Longitude/1.25_1.25"));
        assert!(url.contains("Upper_air_layers/20260130/000000"));
        assert!(url.contains("C_RJTD_20260130000000"));
        assert!(url.ends_with("FD0000-0512_grib2.bin"));
    }

    #[test]
    fn filename_is_last_segment() {
        let url = build_open_upper_air_url(OPEN_BASE, &run(), "FD0600-1100");
        assert_eq!(
            filename_from_url(&url).unwrap(),
            open_upper_air_filename(&run(), "FD0600-1100")
        );
        assert!(filename_from_url("https://example.test/dir/").is_err());
    }
}
