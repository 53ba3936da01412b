//! Interactive RaiPlay downloader
//!
//! Menu-driven front end over the library:
//! - `[1]` download one video
//! - `[2]` download every episode of a season (optionally starting later in the list)
//! - `[3]` list the formats of a video, then download it
//!
//! Usage: `cargo run --example interactive [config.json]`
//!
//! Set `RUST_LOG=raiplay_dl=debug` to see library logs.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use raiplay_dl::{BatchDownloader, Config, Event, SeasonRequest};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    let downloader = BatchDownloader::new(config)?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let choice = loop {
        println!("=== RaiPlay Downloader ===");
        println!("Choose an option:\n");
        println!("    [1]: One video");
        println!("    [2]: All episodes of a series");
        println!("    [3]: Test single download (with format info)");
        match prompt(&mut input, "").await?.parse::<u8>() {
            Ok(choice @ 1..=3) => break choice,
            _ => continue,
        }
    };

    match choice {
        1 => {
            let url = prompt(&mut input, "Insert RaiPlay URL").await?;
            let dir = destination(&mut input, &downloader, "Insert path to save the video").await?;
            download_single(&downloader, &url, dir).await;
        }
        2 => {
            let show_url = prompt(&mut input, "Insert RaiPlay URL of the series").await?;
            let season: usize = prompt(&mut input, "Insert season number").await?.parse()?;
            let dir = destination(&mut input, &downloader, "Insert path to save the videos").await?;
            let first = prompt(&mut input, "Insert the first episode to download (0 for all)").await?;
            let start_index = if first.is_empty() { 0 } else { first.parse()? };

            let request = SeasonRequest::new(show_url, season, start_index)?;
            let report = with_progress(&downloader, downloader.download_season(&request, &dir)).await;
            println!("\n{report}");
        }
        _ => {
            let url = prompt(&mut input, "Insert a single RaiPlay URL to test").await?;
            let dir = destination(&mut input, &downloader, "Insert path to save the test video").await?;

            println!("Testing formats available...");
            print_formats(&downloader, &url).await;
            println!("\nAttempting download with progress bar...");
            download_single(&downloader, &url, dir).await;
        }
    }

    Ok(())
}

async fn download_single(downloader: &BatchDownloader, url: &str, dir: PathBuf) {
    let result = with_progress(downloader, downloader.run_single(url, &dir)).await;
    println!("{result}");
    if !result.is_success() {
        println!("Available formats:");
        print_formats(downloader, url).await;
    }
}

async fn print_formats(downloader: &BatchDownloader, url: &str) {
    match downloader.fetcher().list_formats(url).await {
        Ok(table) => println!("{table}"),
        Err(e) => println!("Error listing formats: {e}"),
    }
}

async fn prompt(input: &mut Input, message: &str) -> std::io::Result<String> {
    if !message.is_empty() {
        println!("{message}");
    }
    match input.next_line().await? {
        Some(line) => Ok(line.trim().to_string()),
        None => Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "stdin closed",
        )),
    }
}

async fn destination(
    input: &mut Input,
    downloader: &BatchDownloader,
    message: &str,
) -> std::io::Result<PathBuf> {
    let default_dir = &downloader.config().download.download_dir;
    let answer = prompt(input, &format!("{message} [{}]", default_dir.display())).await?;
    Ok(if answer.is_empty() {
        default_dir.clone()
    } else {
        PathBuf::from(answer)
    })
}

/// Drive `operation` while rendering the downloader's events as progress bars
async fn with_progress<F: Future>(downloader: &BatchDownloader, operation: F) -> F::Output {
    let mut events = downloader.subscribe();
    let mut view = ProgressView::new();
    tokio::pin!(operation);

    loop {
        tokio::select! {
            output = &mut operation => {
                while let Ok(event) = events.try_recv() {
                    view.handle(event);
                }
                view.clear();
                return output;
            }
            event = events.recv() => match event {
                Ok(event) => view.handle(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress view lagged behind");
                }
                Err(RecvError::Closed) => return (&mut operation).await,
            }
        }
    }
}

struct ProgressView {
    multi: MultiProgress,
    overall: Option<ProgressBar>,
    tasks: HashMap<usize, ProgressBar>,
}

impl ProgressView {
    fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            overall: None,
            tasks: HashMap::new(),
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::BatchStarted { total, workers } => {
                self.multi
                    .println(format!("Starting batch download of {total} episodes on {workers} workers..."))
                    .ok();
                let bar = self.multi.add(ProgressBar::new(total as u64));
                if let Ok(style) = ProgressStyle::with_template(
                    "Overall Progress [{bar:40.green/white}] {pos}/{len} episodes",
                ) {
                    bar.set_style(style.progress_chars("━━╌"));
                }
                self.overall = Some(bar);
            }
            Event::CatalogUnavailable { reason } => {
                self.multi
                    .println(format!("Error accessing episode data: {reason}"))
                    .ok();
            }
            Event::TaskStarted { index, label, .. } => {
                let bar = self.multi.add(ProgressBar::new(0));
                if let Ok(style) = ProgressStyle::with_template(
                    "{msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} @ {bytes_per_sec}",
                ) {
                    bar.set_style(style.progress_chars("━━╌"));
                }
                bar.set_message(label);
                self.tasks.insert(index, bar);
            }
            Event::TaskProgress {
                index,
                downloaded_bytes,
                total_bytes,
            } => {
                if let Some(bar) = self.tasks.get(&index) {
                    if total_bytes > 0 {
                        bar.set_length(total_bytes);
                    }
                    bar.set_position(downloaded_bytes);
                }
            }
            Event::TaskCompleted { display_name, .. } => {
                self.multi
                    .println(format!("✓ Download completed: {display_name}"))
                    .ok();
            }
            Event::TaskFinished { index, result, .. } => {
                if let Some(bar) = self.tasks.remove(&index) {
                    bar.finish_and_clear();
                }
                self.multi.println(result.to_string()).ok();
            }
            Event::BatchProgress { completed, .. } => {
                if let Some(bar) = &self.overall {
                    bar.set_position(completed as u64);
                }
            }
            Event::BatchFinished { .. } => {
                if let Some(bar) = self.overall.take() {
                    bar.finish();
                }
            }
        }
    }

    fn clear(&mut self) {
        for (_, bar) in self.tasks.drain() {
            bar.finish_and_clear();
        }
        if let Some(bar) = self.overall.take() {
            bar.finish();
        }
    }
}
