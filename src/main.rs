use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use robotropolis_tiles::classify::TileClassification;
use robotropolis_tiles::config::ToolConfig;
use robotropolis_tiles::validate::{self, Report, Severity};
use robotropolis_tiles::{scan, tsj, tsx, Tileset};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Tool settings file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG is used otherwise
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarise a tileset (the built-in robotropolis set when no file is given)
    Info {
        tsx: Option<PathBuf>,
    },
    /// Check a tileset against the format's structural rules
    Validate {
        tsx: Option<PathBuf>,

        /// Also check that every referenced image exists with the declared size
        #[arg(long)]
        images: bool,

        /// Report images in this folder that no tile uses
        #[arg(long, value_name = "DIR")]
        sprites: Option<PathBuf>,

        /// Fail on warnings as well as errors
        #[arg(long)]
        strict: bool,
    },
    /// Convert a tileset to the editor's JSON format
    ExportJson {
        tsx: Option<PathBuf>,

        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-emit a tileset in canonical layout
    Format {
        tsx: PathBuf,

        /// Output file; rewrites the input when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Build a tileset from a folder of sprites
    Scan {
        dir: PathBuf,

        /// Tileset name
        #[arg(long)]
        name: String,

        /// Tileset file to write; sources are made relative to its folder
        #[arg(short, long)]
        output: PathBuf,

        /// Keep the tiles of an existing output file and only add new sprites
        #[arg(long)]
        append: bool,
    },
    /// Show gameplay kinds and custom objects from a classification file
    Classify {
        /// Classification file (JSON)
        #[arg(value_name = "CONFIG")]
        classes: PathBuf,

        tsx: Option<PathBuf>,

        /// Only show this tile id
        #[arg(long)]
        id: Option<u32>,
    },
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        2 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder.init();
}

/// Load `path`, or the embedded tileset when none is given. Also returns the
/// directory image sources are relative to.
fn load_tileset(path: Option<&Path>) -> Result<(Tileset, PathBuf)> {
    match path {
        Some(path) => {
            let ts = tsx::load(path).with_context(|| format!("loading {}", path.display()))?;
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            Ok((ts, base))
        }
        None => {
            let ts = robotropolis_tiles::robotropolis().context("parsing the built-in tileset")?;
            Ok((ts, Path::new(env!("CARGO_MANIFEST_DIR")).join("assets")))
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Gaps listed by `info`; a sparse id range can have billions.
const MAX_GAPS_SHOWN: usize = 64;

fn print_info(ts: &Tileset) {
    println!("{ts}");
    if let Some(grid) = ts.grid {
        println!("grid: {} {}x{}", grid.orientation.as_str(), grid.width, grid.height);
    }
    println!(
        "declared: tile {}x{}, count {}, columns {}",
        ts.tile_width, ts.tile_height, ts.tile_count, ts.columns
    );
    let mut gaps = ts.missing_ids();
    let shown: Vec<u32> = gaps.by_ref().take(MAX_GAPS_SHOWN).collect();
    if !shown.is_empty() {
        let more = if gaps.next().is_some() { " ..." } else { "" };
        println!("unused ids: {shown:?}{more}");
    }
    for tile in ts {
        let (cols, rows) = ts.cell_span(tile.id).unwrap_or((1, 1));
        println!(
            "{:>4}  {:>3}x{:<3}  {cols}x{rows} cells  {}",
            tile.id, tile.image.width, tile.image.height, tile.image.source
        );
    }
}

fn print_report(report: &Report) {
    for issue in &report.issues {
        let tag = match issue.severity() {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        println!("{tag}: {issue}");
    }
    println!(
        "{} error(s), {} warning(s)",
        report.errors().count(),
        report.warnings().count()
    );
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => ToolConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => ToolConfig::default(),
    };

    match cli.command {
        Command::Info { tsx } => {
            let (ts, _) = load_tileset(tsx.as_deref())?;
            print_info(&ts);
        }

        Command::Validate { tsx, images, sprites, strict } => {
            let (ts, base) = load_tileset(tsx.as_deref())?;
            let mut report = validate::validate(&ts);
            if images || config.check_images {
                report.extend(validate::check_images(&ts, &base));
            }
            if let Some(dir) = sprites.or(config.sprite_dir.clone()) {
                report.extend(validate::unreferenced_images(&ts, &base, &dir, &config.image_extensions));
            }
            print_report(&report);

            let strict = strict || config.strict;
            if !report.is_ok() || (strict && !report.is_clean()) {
                return Ok(ExitCode::from(2));
            }
        }

        Command::ExportJson { tsx, output } => {
            let (ts, _) = load_tileset(tsx.as_deref())?;
            match output {
                Some(out) => tsj::save(&ts, &out).with_context(|| format!("writing {}", out.display()))?,
                None => println!("{}", tsj::to_json(&ts)?),
            }
        }

        Command::Format { tsx, output } => {
            let ts = tsx::load(&tsx).with_context(|| format!("loading {}", tsx.display()))?;
            let out = output.unwrap_or(tsx);
            tsx::save(&ts, &out).with_context(|| format!("writing {}", out.display()))?;
        }

        Command::Scan { dir, name, output, append } => {
            let opts = config.scan_options(&parent_dir(&output));
            let ts = if append && output.is_file() {
                let mut ts = tsx::load(&output).with_context(|| format!("loading {}", output.display()))?;
                let added = scan::append_folder(&mut ts, &dir, &opts)?;
                println!("added {} tiles", added.len());
                ts
            } else {
                let ts = scan::scan_folder(&name, &dir, &opts)?;
                println!("found {} tiles", ts.len());
                ts
            };
            tsx::save(&ts, &output).with_context(|| format!("writing {}", output.display()))?;
        }

        Command::Classify { classes: classes_path, tsx, id } => {
            let classes = TileClassification::load(&classes_path)
                .with_context(|| format!("loading {}", classes_path.display()))?;
            let (ts, _) = load_tileset(tsx.as_deref())?;

            match id {
                Some(id) => {
                    println!("{id}: {:?}", classes.tile_type(id));
                    if let Some(obj) = classes.object_at(id) {
                        println!("  top-left of '{}' ({})", obj.name, obj.type_name);
                    }
                }
                None => {
                    for (id, kind) in classes.classified() {
                        let source = ts.get(id).map_or("<missing>", |t| t.image.source.as_str());
                        println!("{id:>4}  {kind:?}  {source}");
                    }
                    for obj in classes.objects() {
                        let (cols, rows) = obj.size();
                        println!("object '{}' ({}): {cols}x{rows} tiles", obj.name, obj.type_name);
                    }
                }
            }

            let unknown = classes.unknown_ids(&ts);
            if !unknown.is_empty() {
                log::warn!("classification refers to tile ids not in {}: {unknown:?}", ts.name);
                println!("unknown ids: {unknown:?}");
                return Ok(ExitCode::from(2));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
