use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use geneview::{
    about,
    annotation_loader::{cache_key, DEFAULT_DAS_URL},
    das_xml::parse_das_xml_file,
    track_layout::lane_span,
    AnnotationLoader, AnnotationTrack, GeneOrientation, LoaderConfig,
};
use log::debug;
use serde::Serialize;
use std::path::PathBuf;

/// Load DAS gene annotation and lay it out on strand-aware lanes.
#[derive(Parser, Debug)]
#[command(name = "geneview")]
#[command(author, version = about::GENEVIEW_DISPLAY_VERSION, about)]
struct Cli {
    #[command(flatten)]
    loader: LoaderArgs,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Args, Debug)]
struct LoaderArgs {
    /// JSON loader configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding cached DAS responses (default: system temp dir)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// HTTP timeout in seconds, 0 for none
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch (or read from cache) a DAS features document and print the laid-out track as JSON
    Load {
        /// DAS features URL, file:// URL or local path
        #[arg(default_value = DEFAULT_DAS_URL)]
        url: String,
    },

    /// Like `load`, but print counts and lane extents only
    Summary {
        #[arg(default_value = DEFAULT_DAS_URL)]
        url: String,
    },

    /// Parse a local DAS XML file without touching the cache
    Parse { file: PathBuf },

    /// Print the cache key and cache file path for a URL
    CacheKey { url: String },

    /// Print build information
    Version,
}

#[derive(Serialize)]
struct TrackSummary {
    source: String,
    chromosome: Option<String>,
    start: Option<i64>,
    stop: Option<i64>,
    exon_count: usize,
    gene_count: usize,
    plus_genes: usize,
    minus_genes: usize,
    unknown_genes: usize,
    lowest_lane: i32,
    highest_lane: i32,
}

#[derive(Serialize)]
struct CacheKeyReport {
    url: String,
    key: String,
    path: String,
    cached: bool,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text =
        serde_json::to_string_pretty(value).context("Could not serialize JSON output")?;
    println!("{text}");
    Ok(())
}

fn build_loader(args: &LoaderArgs) -> Result<AnnotationLoader> {
    let mut config = match &args.config {
        Some(path) => LoaderConfig::from_json_file(&path.to_string_lossy())?,
        None => LoaderConfig::default(),
    };
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = Some(dir.display().to_string());
    }
    if let Some(timeout) = args.timeout {
        config.timeout_secs = timeout;
    }
    debug!("Loader configuration: {config:?}");
    Ok(AnnotationLoader::new(config))
}

fn summarize(source: &str, track: &AnnotationTrack) -> TrackSummary {
    let count = |orientation: GeneOrientation| {
        track
            .genes
            .iter()
            .filter(|g| g.orientation == orientation)
            .count()
    };
    let (lowest_lane, highest_lane) = lane_span(&track.genes);
    TrackSummary {
        source: source.to_string(),
        chromosome: track.view_scale.as_ref().map(|s| s.chr().to_string()),
        start: track.view_scale.as_ref().map(|s| s.start()),
        stop: track.view_scale.as_ref().map(|s| s.stop()),
        exon_count: track.exons.len(),
        gene_count: track.genes.len(),
        plus_genes: count(GeneOrientation::Plus),
        minus_genes: count(GeneOrientation::Minus),
        unknown_genes: count(GeneOrientation::Unknown),
        lowest_lane,
        highest_lane,
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .init();

    match cli.cmd {
        Command::Load { url } => {
            let loader = build_loader(&cli.loader)?;
            let track = loader
                .load_track(&url)
                .with_context(|| format!("loading annotations from {url}"))?;
            print_json(&track)?;
        }

        Command::Summary { url } => {
            let loader = build_loader(&cli.loader)?;
            let track = loader
                .load_track(&url)
                .with_context(|| format!("loading annotations from {url}"))?;
            print_json(&summarize(&url, &track))?;
        }

        Command::Parse { file } => {
            let parsed = parse_das_xml_file(&file.to_string_lossy())
                .with_context(|| format!("parsing {}", file.display()))?;
            print_json(&AnnotationTrack::from_parsed(parsed))?;
        }

        Command::CacheKey { url } => {
            let loader = build_loader(&cli.loader)?;
            let key = cache_key(&url)?;
            let path = loader.cache_path(&url)?;
            print_json(&CacheKeyReport {
                cached: path.is_file(),
                path: path.display().to_string(),
                key,
                url,
            })?;
        }

        Command::Version => println!("{}", about::version_cli_text()),
    }

    Ok(())
}
