// FILE: crates/cli/src/commands.rs

use crate::app::AppState;
use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use log::warn;
use serde::Serialize;
use shelfsort_config::TransferMode;
use shelfsort_core::{BookUnit, ClassificationStatus, Metadata, Timestamp};
use shelfsort_library::{find_unit, Classified, FileNormalizer, NormalizeReport, ScanWarning};

/// List candidate units without classifying them
pub fn scan(state: &AppState, matches: &ArgMatches, json: bool) -> Result<()> {
    let manager = state.library_manager()?;
    let (report, cached) = manager
        .scan_downloads(matches.get_flag("refresh"))
        .context("Failed to scan downloads")?;

    if json {
        return print_json(&report);
    }

    if report.units.is_empty() {
        println!(
            "No audiobooks found in {}",
            state.config.library.downloads_root.display()
        );
    } else {
        println!(
            "\n{} Units in {}{}",
            style(report.units.len()).bold().cyan(),
            state.config.library.downloads_root.display(),
            if cached { " (cached)" } else { "" }
        );
        println!("{}", "=".repeat(80));
        for unit in &report.units {
            print_unit_summary(unit);
        }
    }

    print_warnings(&report.warnings);
    Ok(())
}

/// Classify every unit and print its status
pub fn classify(state: &AppState, matches: &ArgMatches, json: bool) -> Result<()> {
    let manager = state.library_manager()?;
    let report = manager
        .classify(matches.get_flag("refresh"))
        .context("Failed to classify downloads")?;

    let wanted = matches.get_one::<String>("status");
    let shown: Vec<&Classified> = report
        .units
        .iter()
        .filter(|c| wanted.is_none_or(|w| c.status.to_string() == *w))
        .collect();

    if json {
        return print_json(&shown);
    }

    if shown.is_empty() {
        println!("Nothing to classify.");
    } else {
        println!("\n{} Classified Units", style(shown.len()).bold().cyan());
        println!("{}", "=".repeat(80));
        for classified in &shown {
            print!("{} ", status_label(classified.status));
            print_unit_summary(&classified.unit);
            if let Some(detail) = &classified.matched {
                println!(
                    "  matches {} ({}, score {:.2}){}",
                    style(&detail.key).yellow(),
                    match detail.source {
                        shelfsort_library::MatchSource::Library => "library",
                        shelfsort_library::MatchSource::History => "history",
                    },
                    detail.score,
                    if detail.upgrade { " - better format" } else { "" }
                );
            }
        }
    }

    print_warnings(&report.warnings);
    Ok(())
}

/// Metadata typed on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataOverrides {
    pub title: Option<String>,
    pub author: Option<String>,
    pub narrator: Option<String>,
    pub series: Option<String>,
    pub series_part: Option<f32>,
    pub cover: Option<String>,
    pub asin: Option<String>,
}

impl MetadataOverrides {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let text = |id: &str| matches.get_one::<String>(id).cloned();
        Self {
            title: text("title"),
            author: text("author"),
            narrator: text("narrator"),
            series: text("series"),
            series_part: matches.get_one::<f32>("part").copied(),
            cover: text("cover"),
            asin: text("asin"),
        }
    }

    /// Overlays the flags on resolved metadata
    ///
    /// Without resolved metadata the flags must name at least a title and an
    /// author; otherwise the unit stays pending.
    pub fn apply(&self, resolved: Option<Metadata>) -> Option<Metadata> {
        let mut metadata = match resolved {
            Some(metadata) => metadata,
            None => Metadata::new(self.title.clone()?, self.author.clone()?),
        };

        if let Some(title) = &self.title {
            metadata.title = title.clone();
        }
        if let Some(author) = &self.author {
            metadata.author = author.clone();
        }
        if self.narrator.is_some() {
            metadata.narrator = self.narrator.clone();
        }
        if self.series.is_some() {
            metadata.series = self.series.clone();
        }
        if self.series_part.is_some() {
            metadata.series_part = self.series_part;
        }
        if self.cover.is_some() {
            metadata.cover = self.cover.clone();
        }
        if self.asin.is_some() {
            metadata.asin = self.asin.clone();
        }
        Some(metadata)
    }
}

/// Resolve metadata for one unit and place it into the library
pub async fn process(state: &AppState, matches: &ArgMatches, json: bool) -> Result<()> {
    let selector = matches
        .get_one::<String>("unit")
        .ok_or_else(|| anyhow::anyhow!("Unit is required"))?;

    let mut config = state.config.clone();
    if matches.get_flag("copy") {
        config.library.transfer_mode = TransferMode::Copy;
    } else if matches.get_flag("move") {
        config.library.transfer_mode = TransferMode::Move;
    }
    let delete_sources = matches.get_flag("delete-sources") || config.library.delete_sources;

    let manager = shelfsort_library::LibraryManager::new(
        config.clone(),
        state.config_manager.config_dir(),
    )
    .context("Failed to open library state")?;

    let report = manager
        .classify(matches.get_flag("refresh"))
        .context("Failed to classify downloads")?;
    let selected = find_unit(&report.units, selector)?;
    if selected.status == ClassificationStatus::Done {
        bail!(
            "'{}' was already processed; run `shelfsort history forget {}` to redo it",
            selected.unit.display_name(),
            selected.unit.fingerprint().short()
        );
    }
    let unit = selected.unit.clone();

    let overrides = MetadataOverrides::from_matches(matches);
    let resolved = if matches.get_flag("no-lookup") {
        None
    } else {
        let token = manager.cancel_token();
        let ctrl_c = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
        let outcome = manager.resolve_metadata(&unit).await;
        ctrl_c.abort();

        match outcome {
            Ok(metadata) => Some(metadata),
            Err(e) if e.is_retryable() => {
                warn!("{}", e);
                None
            }
            Err(e) => return Err(e.into()),
        }
    };

    let Some(metadata) = overrides.apply(resolved) else {
        bail!(
            "No metadata available for '{}'; pass --title and --author to enter it by hand",
            unit.display_name()
        );
    };

    if matches.get_flag("dry-run") {
        let planned = FileNormalizer::new(
            config.library.library_root.clone(),
            config.library.transfer_mode,
        )
        .planned_destination(&metadata);
        println!(
            "Would {} {} files to {}",
            config.library.transfer_mode,
            unit.file_count(),
            planned.display()
        );
        return Ok(());
    }

    let placed = manager
        .process_selection(&unit, metadata, delete_sources)
        .await
        .with_context(|| format!("Failed to process '{}'", unit.display_name()))?;

    if json {
        return print_json(&placed);
    }
    print_placement(&placed);
    Ok(())
}

/// List books found in the library root
pub fn show_index(state: &AppState, json: bool) -> Result<()> {
    let manager = state.library_manager()?;
    let index = manager.build_index().context("Failed to index library")?;

    if json {
        return print_json(&index.entries().collect::<Vec<_>>());
    }

    if index.is_empty() {
        println!(
            "No books in {}",
            state.config.library.library_root.display()
        );
        return Ok(());
    }

    println!("\n{} Books in Library", style(index.len()).bold().cyan());
    println!("{}", "=".repeat(80));
    for entry in index.entries() {
        let series = if entry.series.is_empty() {
            String::new()
        } else {
            format!(" [{}]", entry.series)
        };
        println!(
            "{} - {}{}  {}",
            style(&entry.author).bold(),
            entry.title,
            series,
            style(format_formats(entry.formats.iter())).dim()
        );
    }
    print_warnings(index.warnings());
    Ok(())
}

pub fn history_list(state: &AppState, json: bool) -> Result<()> {
    let manager = state.library_manager()?;
    let records = manager.history_records();

    if json {
        let rows: Vec<_> = records
            .iter()
            .map(|(fp, record)| serde_json::json!({ "fingerprint": fp, "record": record }))
            .collect();
        return print_json(&rows);
    }

    if records.is_empty() {
        println!("No units processed yet.");
        return Ok(());
    }

    println!("\n{} Processed Units", style(records.len()).bold().cyan());
    println!("{}", "=".repeat(80));
    for (fingerprint, record) in &records {
        println!(
            "{}  {}  {}",
            style(fingerprint.short()).dim(),
            format_timestamp(record.processed_at),
            record.library_key
        );
        println!("    -> {}", record.destination.display());
    }
    Ok(())
}

pub fn history_forget(state: &AppState, matches: &ArgMatches) -> Result<()> {
    let prefix = matches
        .get_one::<String>("fingerprint")
        .ok_or_else(|| anyhow::anyhow!("Fingerprint is required"))?;

    let manager = state.library_manager()?;
    let (fingerprint, record) = manager.forget(prefix)?;
    println!(
        "{} Forgot {} ({})",
        style("✓").green().bold(),
        fingerprint.short(),
        record.library_key
    );
    Ok(())
}

pub fn config_init(state: &AppState) -> Result<()> {
    let path = state.config_manager.config_path();
    if state.config_manager.initialize()? {
        println!("{} Wrote {}", style("✓").green().bold(), path.display());
    } else {
        println!("Config already exists at {}", path.display());
    }
    Ok(())
}

pub fn config_show(state: &AppState) -> Result<()> {
    let rendered = toml::to_string_pretty(&state.config).context("Failed to render config")?;
    println!("# {}", state.config_manager.config_path().display());
    print!("{}", rendered);
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_unit_summary(unit: &BookUnit) {
    println!(
        "{}  {}",
        style(unit.fingerprint().short()).dim(),
        style(truncate(&unit.display_name(), 60)).bold()
    );
    let mut guess = Vec::new();
    if !unit.author.is_empty() {
        guess.push(format!("by {}", unit.author));
    }
    if !unit.series.is_empty() {
        match unit.series_part {
            Some(part) => guess.push(format!("{} #{}", unit.series, part)),
            None => guess.push(unit.series.clone()),
        }
    }
    println!(
        "    {} | {} files | {}{}",
        unit.origin,
        unit.file_count(),
        format_formats(unit.formats.iter()),
        if guess.is_empty() {
            String::new()
        } else {
            format!(" | {}", guess.join(", "))
        }
    );
}

fn print_placement(report: &NormalizeReport) {
    println!(
        "{} Placed {} files at {}",
        style("✓").green().bold(),
        report.files.len(),
        report.destination.display()
    );
    if report.suffixed {
        println!(
            "  {} destination existed, used a numbered folder",
            style("!").yellow()
        );
    }
    for warning in &report.tag_warnings {
        println!("  {} {}", style("tag").yellow(), warning);
    }
    for warning in &report.warnings {
        println!("  {} {}", style("warn").yellow(), warning);
    }
    for dir in &report.removed_dirs {
        println!("  removed {}", dir.display());
    }
}

fn print_warnings(warnings: &[ScanWarning]) {
    if warnings.is_empty() {
        return;
    }
    println!("\n{} skipped:", style(warnings.len()).yellow());
    for warning in warnings {
        println!("  {}", warning);
    }
}

fn status_label(status: ClassificationStatus) -> String {
    let label = format!("{:<6}", status.to_string().to_uppercase());
    match status {
        ClassificationStatus::Untidy => style(label).cyan().to_string(),
        ClassificationStatus::Built => style(label).magenta().to_string(),
        ClassificationStatus::Match => style(label).yellow().to_string(),
        ClassificationStatus::Done => style(label).green().to_string(),
    }
}

fn format_formats<'a>(formats: impl Iterator<Item = &'a shelfsort_core::AudioFormat>) -> String {
    formats
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn format_timestamp(timestamp: Timestamp) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp.as_millis())
        .map(|t| {
            t.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| timestamp.to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
