//! Table output for scenario reports.

use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use hazardbench_core::{CacheStats, CampaignReport, HandoffReport, JoinOutcome};

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

/// Print a lock-order campaign summary
pub fn print_campaign(report: &CampaignReport) {
    let mut table = new_table(&["Writer", "Trials", "Completed", "Deadlocked"]);
    let deadlocked = Cell::new(report.deadlocked).fg(if report.hazard_observed() {
        Color::Red
    } else {
        Color::Green
    });
    table.add_row(vec![
        Cell::new(format!("{:?}", report.writer).to_lowercase()),
        Cell::new(report.trials),
        Cell::new(report.completed),
        deadlocked,
    ]);
    println!("{table}");

    if report.hazard_observed() {
        println!(
            "{} read and {:?} formed a circular wait",
            "Hazard:".red().bold(),
            report.writer
        );
    } else {
        println!("{}", "No deadlock observed.".dimmed());
    }
}

/// Print a join outcome with the cache counters
pub fn print_outcome(scenario: &str, outcome: &JoinOutcome, stats: &CacheStats) {
    match outcome {
        JoinOutcome::Completed { elapsed } => {
            println!(
                "{} {} in {} ms",
                scenario.bold(),
                "completed".green(),
                elapsed.as_millis()
            );
        }
        JoinOutcome::TimedOut { stuck } => {
            println!(
                "{} {}: {}",
                scenario.bold(),
                "timed out".red(),
                stuck.join(", ")
            );
        }
    }

    let mut table = new_table(&["Puts", "Invalidations", "Reads", "Hit rate"]);
    table.add_row(vec![
        Cell::new(stats.puts),
        Cell::new(stats.invalidations),
        Cell::new(stats.reads),
        Cell::new(format!("{:.1}%", stats.hit_rate() * 100.0)),
    ]);
    println!("{table}");
}

/// Print a producer/consumer handoff report
pub fn print_handoff(report: &HandoffReport) {
    println!("\n{}", "Handoff Summary".green().bold());
    println!("  Enqueued:         {}", report.producer.enqueued);
    println!("  Producer retries: {}", report.producer.retries);
    println!(
        "  Processed:        {}",
        report.consumer.processed.len().to_string().green()
    );
    let residual = if report.residual.is_idle() {
        "idle".green()
    } else {
        format!(
            "{} pending, in_flight={}",
            report.residual.pending, report.residual.in_flight
        )
        .yellow()
    };
    println!("  Final queue:      {residual}");

    if report.consumer.processed.is_empty() {
        return;
    }
    let mut table = new_table(&["#", "Message"]);
    for (i, message) in report.consumer.processed.iter().enumerate() {
        table.add_row(vec![Cell::new(i), Cell::new(message)]);
    }
    println!("{table}");
}
