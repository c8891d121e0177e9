#[cfg(target_arch = "wasm32")]
fn main() {
    use leptos::*;
    use unwindify::app::App;

    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    mount_to_body(|| view! { <App/> })
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    headless::run()
}

/// Native build: the same pipeline as the dashboard, printed to stdout.
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use anyhow::{Context, Result};
    use chrono::{FixedOffset, Local, Utc};
    use clap::Parser;
    use futures::future::join_all;
    use tracing_subscriber::EnvFilter;
    use unwindify::analytics::{calculate_metrics, format_minutes, top_artists, DashboardMetrics};
    use unwindify::config::Zone;
    use unwindify::error::HistoryError;
    use unwindify::upload::{ingest, UploadReport};

    #[derive(Parser, Debug)]
    #[command(author, version, about = "Summarise Spotify extended streaming history exports", long_about = None)]
    struct Cli {
        /// Extended history JSON files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Time zone for month/hour buckets: local, utc, or seconds east of UTC
        #[arg(long, default_value = "local")]
        zone: String,

        /// Number of artists to list
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Print the metrics as JSON instead of tables
        #[arg(long)]
        json: bool,
    }

    async fn read(path: PathBuf) -> (String, Result<String, HistoryError>) {
        let name = path.display().to_string();
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| HistoryError::Read { file: name.clone(), reason: e.to_string() });
        (name, text)
    }

    fn metrics_for(report: &UploadReport, zone: Zone) -> DashboardMetrics {
        match (zone, zone.fixed_offset()) {
            (Zone::Utc, _) => calculate_metrics(&report.events, &Utc),
            (Zone::Fixed(_), Some(offset)) => calculate_metrics::<FixedOffset>(&report.events, &offset),
            _ => calculate_metrics(&report.events, &Local),
        }
    }

    pub fn run() -> Result<()> {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with_writer(std::io::stderr)
            .init();

        let cli = Cli::parse();
        let zone = Zone::parse(&cli.zone).with_context(|| format!("unrecognised zone {:?}", cli.zone))?;

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let files = runtime.block_on(join_all(cli.files.into_iter().map(read)));
        let report = ingest(files);
        let metrics = metrics_for(&report, zone);

        if cli.json {
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        } else {
            print_tables(&report, &metrics, cli.top);
        }

        for failure in &report.failures {
            eprintln!("skipped {}", failure.reason);
        }
        Ok(())
    }

    fn print_tables(report: &UploadReport, m: &DashboardMetrics, top: usize) {
        println!("--- Listening summary ---");
        println!("Total minutes played: {:.0}", m.total_minutes);
        println!("Total tracks played:  {}", m.total_plays);

        println!("\n--- Top artists ---");
        for (i, a) in top_artists(&report.events, top).iter().enumerate() {
            println!("{:>2}. {:<40} {}", i + 1, a.artist, format_minutes(a.minutes));
        }

        println!("\n--- Monthly ---");
        for (month, skips) in m.monthly.iter().zip(&m.monthly_skips) {
            println!(
                "{}  {:>10}  skipped {:>5.1}% ({}/{})",
                month.month,
                format_minutes(month.minutes),
                skips.skip_rate,
                skips.skipped,
                skips.total
            );
        }

        println!("\n--- Time of day ---");
        for h in &m.hourly {
            println!("{:<12} {}", h.label, format_minutes(h.minutes));
        }

        match &m.longest_gap {
            Some(gap) => println!(
                "\nLongest break: {} ({} -> {})",
                format_minutes(gap.minutes),
                gap.start.to_rfc3339(),
                gap.end.to_rfc3339()
            ),
            None => println!("\nLongest break: not enough plays"),
        }
    }
}
