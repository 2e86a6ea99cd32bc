use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use mangaview::config;
use mangaview::decode::ImageDecoder;
use mangaview::settings::Color;
use mangaview::source::{self, FsSource};
use mangaview::viewer::{View, ViewEvent};
use mangaview::worker::DecodeWorker;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("MANGAVIEW_BUILD_GIT_HASH"),
    ", ",
    env!("MANGAVIEW_BUILD_PROFILE"),
    ")"
);

/// How long a headless walk waits for the pages around one scroll position.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(
    name = "mangaview",
    version = VERSION,
    about = "Continuous-scroll comic viewer core"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log output file path (logs go to stderr otherwise)
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// Maximum page width in pixels (0 = no cap)
    #[arg(long, global = true)]
    max_width: Option<u32>,

    /// Gap between pages in pixels
    #[arg(long, global = true)]
    spacing: Option<u32>,

    /// Background color as #rrggbb
    #[arg(long, global = true)]
    background: Option<Color>,
}

#[derive(Subcommand)]
enum Command {
    /// List the pages found in a directory, in reading order
    List {
        dir: PathBuf,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },
    /// Scroll through a directory headlessly, decoding pages as a viewer would
    Walk {
        dir: PathBuf,

        /// Page to start at (0-based)
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Viewport width in pixels
        #[arg(long, default_value_t = 1280)]
        width: u32,

        /// Viewport height in pixels
        #[arg(long, default_value_t = 720)]
        height: u32,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Read every file into memory before viewing
        #[arg(long)]
        preload: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Some(log_path) = &cli.log {
        match std::fs::File::create(log_path) {
            Ok(file) => env_logger::Builder::from_default_env()
                .target(env_logger::Target::Pipe(Box::new(file)))
                .init(),
            Err(e) => {
                eprintln!("Error: failed to open log file {}: {e}", log_path.display());
                std::process::exit(1);
            }
        }
    } else {
        env_logger::init();
    }

    // Load config file and merge CLI overrides
    let mut cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    };
    cfg.merge_cli(cli.max_width, cli.spacing, cli.background);
    let config = cfg.resolve();

    let result = match cli.command {
        Command::List { dir, recursive } => cmd_list(dir, recursive),
        Command::Walk {
            dir,
            start,
            width,
            height,
            recursive,
            preload,
        } => cmd_walk(
            &config,
            WalkArgs {
                dir,
                start,
                width,
                height,
                recursive,
                preload,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn cmd_list(dir: PathBuf, recursive: bool) -> Result<()> {
    let pages = source::scan_dir(&dir, recursive)
        .with_context(|| format!("failed to scan {}", dir.display()))?;
    for (i, page) in pages.iter().enumerate() {
        println!("{i:>4}  {}", page.label());
    }
    eprintln!("{} page(s)", pages.len());
    Ok(())
}

struct WalkArgs {
    dir: PathBuf,
    start: usize,
    width: u32,
    height: u32,
    recursive: bool,
    preload: bool,
}

fn cmd_walk(config: &config::Config, args: WalkArgs) -> Result<()> {
    let walk_start = Instant::now();

    let mut pages = source::scan_dir(&args.dir, args.recursive)
        .with_context(|| format!("failed to scan {}", args.dir.display()))?;
    if pages.is_empty() {
        anyhow::bail!("no images found in {}", args.dir.display());
    }
    if args.preload {
        pages = source::preload(pages, &FsSource).context("failed to preload pages")?;
    }
    let page_count = pages.len();

    let worker = DecodeWorker::spawn(ImageDecoder::default(), FsSource, config.viewer.queue_depth)
        .context("failed to start decode worker")?;
    let mut view = View::new(
        worker,
        config.settings(),
        &config.viewer,
        args.width,
        args.height,
    );

    view.load(pages, args.start);
    loop {
        if !view.settle(SETTLE_TIMEOUT) {
            anyhow::bail!(
                "decode worker did not settle within {}s",
                SETTLE_TIMEOUT.as_secs()
            );
        }
        print_events(&mut view);
        let before = view.scroll_top();
        if before >= view.max_scroll() {
            break;
        }
        view.scroll_by(i64::from(config.viewer.scroll_step));
        if view.scroll_top() == before {
            break;
        }
    }
    print_events(&mut view);

    let stats = view.stats();
    info!(
        "cmd_walk: {} pages walked in {:.1}ms",
        page_count,
        walk_start.elapsed().as_secs_f64() * 1000.0
    );
    eprintln!(
        "walked {} page(s): content {}x{} on {}, {} decoded, {} resized, {} failed, {} evicted, {} dropped, {} deferred",
        page_count,
        view.content_width(),
        view.content_height(),
        view.background(),
        stats.decoded,
        stats.resized,
        stats.failed,
        stats.evicted,
        stats.dropped(),
        stats.deferred,
    );
    Ok(())
}

fn print_events(view: &mut View) {
    for event in view.drain_events() {
        match event {
            ViewEvent::CurrentPageChanged(i) => {
                let label = view.page(i).map(|p| p.id().label()).unwrap_or_default();
                println!("page {i:>4}  {label}");
            }
            ViewEvent::DecodeFailed { index, reason } => {
                println!("failed {index:>4}  {reason}");
            }
            ViewEvent::BookmarkRequested(i) => println!("bookmark {i}"),
            ViewEvent::Resized { width, height } => println!("resized {width}x{height}"),
        }
    }
}
