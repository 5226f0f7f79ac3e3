//! Bounded producer/consumer handoff
//!
//! Run with: cargo run --bin handoff -- --capacity 2 --items 10 --consumer-delay-ms 20

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use handoff_lab::{logging, run_exchange, ExchangeConfig, ExchangeReport};

#[derive(Parser, Debug)]
#[command(name = "handoff")]
#[command(about = "Run producers and consumers over a bounded channel")]
struct Args {
    /// TOML file with exchange settings; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Maximum number of items waiting in the channel
    #[arg(long)]
    capacity: Option<usize>,

    /// Items produced by each producer
    #[arg(long)]
    items: Option<u64>,

    #[arg(long)]
    producers: Option<usize>,

    #[arg(long)]
    consumers: Option<usize>,

    #[arg(long)]
    producer_delay_ms: Option<u64>,

    #[arg(long)]
    consumer_delay_ms: Option<u64>,

    /// Random extra pause (0..=N ms) after every item
    #[arg(long)]
    jitter_ms: Option<u64>,

    /// Print the report as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn resolve(&self) -> Result<ExchangeConfig> {
        let mut config = match &self.config {
            Some(path) => ExchangeConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ExchangeConfig::default(),
        };

        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(items) = self.items {
            config.items = items;
        }
        if let Some(producers) = self.producers {
            config.producers = producers;
        }
        if let Some(consumers) = self.consumers {
            config.consumers = consumers;
        }
        if let Some(delay) = self.producer_delay_ms {
            config.producer_delay_ms = delay;
        }
        if let Some(delay) = self.consumer_delay_ms {
            config.consumer_delay_ms = delay;
        }
        if let Some(jitter) = self.jitter_ms {
            config.jitter_ms = jitter;
        }

        config.validate()?;
        Ok(config)
    }
}

fn print_summary(report: &ExchangeReport) {
    let config = &report.config;
    println!("{}", "=== Bounded Handoff ===".bold());
    println!(
        "capacity {} | {} producer(s) x {} items = {} | {} consumer(s)",
        config.capacity,
        config.producers,
        config.items,
        config.total_items(),
        config.consumers
    );
    println!();

    for producer in &report.producers {
        println!(
            "  producer {}: produced {:>5}, waited on full channel {:>5} time(s)",
            producer.id, producer.produced, producer.blocked
        );
    }
    for consumer in &report.consumers {
        println!(
            "  consumer {}: consumed {:>5}",
            consumer.summary.id, consumer.summary.consumed
        );
    }
    println!();

    let stats = &report.stats;
    println!(
        "offered {} | taken {} | blocked offers {} | blocked takes {} | high water {}/{}",
        stats.offered,
        stats.taken,
        stats.blocked_offers,
        stats.blocked_takes,
        stats.high_water,
        config.capacity
    );

    let check = |ok: bool| if ok { "ok".green() } else { "FAILED".red() };
    println!(
        "delivered {}/{}",
        report.total_delivered(),
        config.total_items()
    );
    println!("every item delivered once: {}", check(report.is_complete()));
    println!("production order kept:     {}", check(report.in_production_order()));
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let config = args.resolve()?;
    let report = run_exchange(&config).context("exchange failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}
