//! `jma-gsm`: download and inspect JMA GSM GRIB2 files.

use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::debug;

use jma_gsm_fetch::{
    Client, Config, Credentials, Download, ENV_PASSWORD, ENV_USER, GribRsDecoder, GridResolution,
    OpenLeadRange, RunIdentity, expand_inputs, inspect_files, recent_cycles,
};

#[derive(Parser, Debug)]
#[command(name = "jma-gsm")]
#[command(author, version, about = "Fetch JMA Global Spectral Model GRIB2 files")]
struct Args {
    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download high-resolution (Closed) GSM upper-air global files
    DownloadHr {
        /// UTC run id: YYYYMMDDHH (HH=00/06/12/18)
        #[arg(long)]
        run_id: RunIdentity,

        /// Grid spacing in degrees: 0.5 or 0.25
        #[arg(long, default_value = "0.5")]
        grid: GridResolution,

        /// Forecast lead hours (FDddhh); repeat or comma-separate for several files
        #[arg(long, value_delimiter = ',', default_value = "0")]
        fh: Vec<i64>,

        #[command(flatten)]
        common: CommonArgs,

        /// Auth user
        #[arg(long, env = ENV_USER)]
        user: Option<String>,

        /// Auth password
        #[arg(long, env = ENV_PASSWORD, hide_env_values = true)]
        password: Option<Secret>,
    },

    /// Download the open deterministic GSM (1.25 degree) upper-air file
    DownloadOpen {
        /// UTC run id: YYYYMMDDHH (HH=00/06/12/18)
        #[arg(long)]
        run_id: RunIdentity,

        /// FD0000-0512 (0-132h) or FD0600-1100 (144-264h)
        #[arg(long, default_value = "FD0000-0512")]
        fd_range: OpenLeadRange,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Print JSON summaries of GRIB2 files
    InspectGrib {
        /// GRIB2 file paths
        #[arg(required_unless_present = "glob")]
        paths: Vec<PathBuf>,

        /// Pattern expanded by the tool itself, for shells that do not glob
        /// (e.g. 'data/raw/jma_gsm_open/**/*.bin')
        #[arg(long)]
        glob: Option<String>,
    },

    /// List the most recent synoptic runs
    RecentRuns {
        #[arg(long, default_value_t = 12)]
        count: usize,

        /// Report the newest run whose open file is already published
        #[arg(long)]
        probe: bool,

        #[arg(long, default_value = "FD0000-0512")]
        fd_range: OpenLeadRange,
    },

    /// Print the current UTC time
    NowUtc,
}

/// A command-line secret that never shows up in `Debug` output.
#[derive(Clone)]
struct Secret(String);

impl FromStr for Secret {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// Override data dir (default: JMA_GSM_DATA_DIR or ./data)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Override the product base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Download again even if the file exists
    #[arg(long)]
    overwrite: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 300)]
    timeout_sec: u64,
}

impl CommonArgs {
    fn apply(&self, cfg: &mut Config) {
        if let Some(dir) = &self.out_dir {
            cfg.data_dir = dir.clone();
        }
        cfg.timeout = Duration::from_secs(self.timeout_sec);
    }
}

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.verbose);
    debug!(?args, "arguments parsed");

    let mut cfg = Config::from_env().context("invalid configuration")?;

    match args.command {
        Command::DownloadHr {
            run_id,
            grid,
            fh,
            common,
            user,
            password,
        } => {
            common.apply(&mut cfg);
            if let Some(base) = &common.base_url {
                cfg.restricted_base_url = base.clone();
            }
            if user.is_some() || password.is_some() {
                let current = cfg.credentials.take();
                cfg.credentials = Credentials::from_parts(
                    user.or_else(|| current.as_ref().map(|c| c.user.clone())),
                    password.map(|p| p.0).or_else(|| current.map(|c| c.password)),
                );
            }

            let client = Client::new(cfg)?;
            let mut failed = false;
            let results = client.download_restricted_many(&run_id, grid, &fh, common.overwrite);
            for (lead, res) in results {
                match res {
                    Ok(d) => print_download(&d),
                    Err(e) => {
                        failed = true;
                        eprintln!("Download failed (FH {lead}): {e}");
                    }
                }
            }
            if failed {
                eprintln!(
                    "Hint: HR GSM is under 'Closed' and may require registration/valid credentials."
                );
                return Ok(ExitCode::from(1));
            }
        }

        Command::DownloadOpen {
            run_id,
            fd_range,
            common,
        } => {
            common.apply(&mut cfg);
            if let Some(base) = &common.base_url {
                cfg.open_base_url = base.clone();
            }

            let client = Client::new(cfg)?;
            match client.download_open(&run_id, fd_range, common.overwrite) {
                Ok(d) => print_download(&d),
                Err(e) => {
                    eprintln!("Download failed: {e}");
                    return Ok(ExitCode::from(1));
                }
            }
        }

        Command::InspectGrib { paths, glob } => {
            let inputs = expand_inputs(glob.as_deref(), &paths)?;
            if inputs.is_empty() {
                bail!("no input files: provide PATH(s) or a --glob pattern");
            }

            let mut out = serde_json::Map::new();
            for (path, res) in inspect_files(&GribRsDecoder, &inputs) {
                let value = match res {
                    Ok(summaries) => serde_json::to_value(summaries)?,
                    Err(e) => serde_json::json!({ "error": e.to_string() }),
                };
                out.insert(path.display().to_string(), value);
            }
            println!("{}", serde_json::to_string_pretty(&out)?);
        }

        Command::RecentRuns {
            count,
            probe,
            fd_range,
        } => {
            let now = Utc::now();
            for run in recent_cycles(&now, count) {
                println!("{run}");
            }
            if probe {
                let client = Client::new(cfg)?;
                match client.latest_open_run(&now, count, fd_range)? {
                    Some(run) => println!("latest published ({fd_range}): {run}"),
                    None => println!("no published run found in the last {count} cycles"),
                }
            }
        }

        Command::NowUtc => println!("{}", Utc::now().to_rfc3339()),
    }

    Ok(ExitCode::SUCCESS)
}

fn print_download(d: &Download) {
    println!("URL: {}", d.url);
    println!("OUT: {}", d.path.display());
    if d.skipped {
        println!(
            "Already present: {} ({} bytes)",
            d.path.display(),
            d.size_bytes
        );
    } else {
        println!("Downloaded: {} ({} bytes)", d.path.display(), d.size_bytes);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
