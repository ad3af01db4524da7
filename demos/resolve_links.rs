//! Resolve share links and optionally download them
//!
//! Usage:
//!
//! ```bash
//! cargo run --example resolve_links -- https://cloud.mail.ru/public/9bFs/gVzxjU5uC
//! cargo run --example resolve_links -- --download https://cloud.mail.ru/public/9bFs/gVzxjU5uC
//! ```

use cloudmail_dl::{Config, DownloadOrchestrator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut download = false;
    let mut links = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--download" => download = true,
            _ => links.push(arg),
        }
    }

    if links.is_empty() {
        eprintln!("usage: resolve_links [--download] <public link>...");
        std::process::exit(2);
    }

    let orchestrator = DownloadOrchestrator::new(Config::default())?;

    if !download {
        for file in orchestrator.resolve_links(links).await? {
            println!("{}\t{}", file.output, file.url);
        }
        return Ok(());
    }

    let job_id = orchestrator.start_download(links, None).await?;
    println!("Started {job_id}");

    let mut progress = orchestrator.subscribe_progress(&job_id)?;
    while let Some(job) = progress.next().await {
        println!(
            "[{:>11}] {:>3}% {}/{} files  {}",
            job.phase.as_str(), job.percent, job.done_files, job.total_files, job.message
        );
        if let Some(error) = job.error {
            eprintln!("Job failed: {error}");
        }
    }

    Ok(())
}
