use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use fechas_calendar::{
    ActivityExtractor, CalendarConfig, CalendarService, ExtractionPolicy, HtmlFetcher, PageSource,
    PolicyExtractor, ResponseCache, StaticPage,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fechas")]
#[command(about = "Print Universidad del Quindío academic dates", version)]
struct Cli {
    /// Read markup from a local HTML file instead of the live page
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Activities page URL (defaults to FECHAS_URL or the university page)
    #[arg(long)]
    url: Option<String>,

    /// Extraction strategy: selector, text-scan or fallback
    #[arg(short, long)]
    strategy: Option<ExtractionPolicy>,

    /// Year to filter on (defaults to the current year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Print the raw extracted records instead of the formatted reply
    #[arg(long)]
    records: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut cfg = CalendarConfig::from_env();
    if let Some(url) = cli.url {
        cfg.url = url;
    }
    if let Some(strategy) = cli.strategy {
        cfg.extraction = strategy;
    }
    let year = cli.year.unwrap_or_else(|| chrono::Local::now().year());

    let source: Arc<dyn PageSource> = match &cli.file {
        Some(path) => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Arc::new(StaticPage::labeled(html, path.display().to_string()))
        }
        None => Arc::new(HtmlFetcher::from_config(&cfg)?),
    };

    tracing::info!(source = %source.describe(), strategy = %cfg.extraction, year, "reading activities");

    if cli.records {
        let html = source.fetch().await?;
        let extractor = PolicyExtractor::new(cfg.extraction)?;
        let records = extractor.extract(&html);
        for record in &records {
            println!(
                "{}\t{}\t{}",
                record.period.as_deref().unwrap_or(fechas_calendar::NO_PERIOD),
                record.title,
                record.date_text
            );
        }
        tracing::info!(count = records.len(), "records extracted");
        return Ok(());
    }

    let service = CalendarService::with_source(&cfg, source, Arc::new(ResponseCache::new()))?;
    let reply = service.respond_for_year(year).await;
    tracing::info!(source = %reply.source, "reply ready");
    println!("{}", reply.text);
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
