// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dispatch_core::dashboard::Dashboard;
use dispatch_core::labels::StatusLabels;
use dispatch_core::preferences::{JsonFilePreferences, ViewPreferences};
use dispatch_core::source::{DataSource, FileDataSource, HttpDataSource};
use dispatch_core::store::{Action, ConsoleStore};
use dispatch_core::{DeliveryRequest, Snapshot, SortDirection, SortKey, SortSpec, StatusGroup};
use log::info;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Snapshot file to read instead of the live backend
    #[arg(short, long, env = "DISPATCH_SNAPSHOT", conflicts_with = "url")]
    snapshot: Option<PathBuf>,

    /// Base URL of the dispatch backend
    #[arg(short, long, env = "DISPATCH_SOURCE_URL")]
    url: Option<String>,

    /// Page whose saved preferences apply
    #[arg(short, long, env = "DISPATCH_PAGE", default_value = "map")]
    page: String,

    /// JSON object mapping raw status ids to display titles
    #[arg(long, global = true)]
    labels: Option<PathBuf>,

    /// More output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Status dashboard with counts, shares and money per group
    Dashboard {
        /// Earlier snapshot to merge under the current one
        #[arg(long)]
        previous: Option<PathBuf>,
        /// Print the dashboard tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Filtered and sorted request table
    List {
        /// Sort column (id, date, interval, route, status, cost)
        #[arg(long)]
        sort: Option<String>,
        /// Sort direction (asc or desc)
        #[arg(long)]
        direction: Option<String>,
        /// Status group to show, or "all"
        #[arg(long)]
        filter: Option<String>,
        /// Persist the effective sort and filter
        #[arg(long)]
        save: bool,
    },
    /// Fitted map frame for the current selection
    Viewport {
        #[arg(long, conflicts_with = "request")]
        worker: Option<i64>,
        #[arg(long)]
        request: Option<i64>,
    },
    /// Request autocomplete lookup
    Search {
        query: String,
        /// Restrict hits to a status group
        #[arg(long)]
        filter: Option<String>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    // A second logger only fails when one is already installed.
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn open_source(cli: &Cli) -> Result<Box<dyn DataSource>> {
    match (&cli.snapshot, &cli.url) {
        (Some(path), _) => Ok(Box::new(FileDataSource::new(path))),
        (None, Some(url)) => Ok(Box::new(
            HttpDataSource::new(url).context("Failed to build HTTP client")?,
        )),
        (None, None) => bail!("No data source. Please specify --snapshot or --url."),
    }
}

fn parse_filter(raw: &str) -> Result<Option<StatusGroup>> {
    if raw.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    Ok(Some(raw.parse()?))
}

/// Command-line options win over saved preferences; omitted ones keep them.
fn apply_list_options(
    mut prefs: ViewPreferences,
    sort: Option<&str>,
    direction: Option<&str>,
    filter: Option<&str>,
) -> Result<ViewPreferences> {
    if let Some(raw) = sort {
        let key: SortKey = raw.parse()?;
        prefs.sort = SortSpec::new(key, prefs.sort.direction);
    }
    if let Some(raw) = direction {
        prefs.sort.direction = raw.parse::<SortDirection>()?;
    }
    if let Some(raw) = filter {
        prefs.filter = parse_filter(raw)?;
    }
    Ok(prefs)
}

fn load_labels(path: Option<&PathBuf>) -> Result<StatusLabels> {
    match path {
        Some(path) => StatusLabels::load(path),
        None => Ok(StatusLabels::default()),
    }
}

fn load_store(source: &dyn DataSource, prefs: &ViewPreferences) -> Result<ConsoleStore> {
    let mut store = ConsoleStore::new(prefs);
    let ticket = store.begin_refresh();
    match source.fetch_snapshot() {
        Ok(snapshot) => {
            store.apply_snapshot(&ticket, snapshot);
            Ok(store)
        }
        Err(e) => {
            store.refresh_failed(&ticket, &e.to_string());
            Err(anyhow::Error::new(e).context("Failed to load snapshot"))
        }
    }
}

fn print_dashboard(dashboard: &Dashboard, labels: &StatusLabels) {
    println!(
        "Total: {} requests, {} money",
        dashboard.total, dashboard.total_money
    );
    for group in dashboard.groups() {
        println!(
            "{:<14} {:>5} {:>6.1}% {:>12}",
            group.key,
            group.total,
            group.share(dashboard.total),
            group.money
        );
        for sub in &group.subgroups {
            println!(
                "  {:<26} {:>5} {:>12}",
                labels.title(&sub.status),
                sub.count,
                sub.money
            );
        }
    }
    if dashboard.skipped > 0 {
        println!("Skipped {} requests with unknown status", dashboard.skipped);
    }
}

fn print_row(request: &DeliveryRequest, labels: &StatusLabels) {
    let date = request
        .date
        .map(|d| d.format("%d.%m.%Y").to_string())
        .unwrap_or_else(|| "-".to_string());
    let status = request.status.as_deref().map_or("-", |s| labels.title(s));
    println!(
        "#{:<8} {:<10} {:<13} {:>3} {:<26} {:>10}",
        request.id,
        date,
        request.first_interval().unwrap_or("-"),
        request.items.len(),
        status,
        request.cost
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = open_source(&cli)?;
    let labels = load_labels(cli.labels.as_ref())?;

    match &cli.command {
        Commands::Dashboard { previous, json } => {
            let snapshot = source.fetch_snapshot().context("Failed to load snapshot")?;
            let dashboard = match previous {
                Some(path) => {
                    let content = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read {}", path.display()))?;
                    let earlier = Snapshot::from_json(&content)?;
                    Dashboard::aggregate_merged(&snapshot.requests, &earlier.requests)
                }
                None => Dashboard::aggregate(&snapshot.requests),
            };

            if *json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                print_dashboard(&dashboard, &labels);
            }
        }
        Commands::List {
            sort,
            direction,
            filter,
            save,
        } => {
            let mut prefs_store = JsonFilePreferences::open(JsonFilePreferences::default_path())?;
            let saved = ViewPreferences::load(&prefs_store, &cli.page);
            let prefs = apply_list_options(
                saved,
                sort.as_deref(),
                direction.as_deref(),
                filter.as_deref(),
            )?;

            let store = load_store(source.as_ref(), &prefs)?;
            for request in store.visible_requests() {
                print_row(request, &labels);
            }
            println!(
                "{} of {} requests",
                store.visible_requests().len(),
                store.requests().len()
            );

            if *save {
                store
                    .preferences(prefs.selected_filters.clone())
                    .save(&mut prefs_store, &cli.page)?;
                info!("Preferences written to {}", prefs_store.path().display());
            }
        }
        Commands::Viewport { worker, request } => {
            let prefs_store = JsonFilePreferences::open(JsonFilePreferences::default_path())?;
            let prefs = ViewPreferences::load(&prefs_store, &cli.page);
            let mut store = load_store(source.as_ref(), &prefs)?;

            if let Some(id) = worker {
                store.dispatch(Action::SelectWorker(*id));
            } else if let Some(id) = request {
                store.dispatch(Action::ExternalRequest(Some(*id)));
            }

            println!("Selection: {:?}", store.selection());
            for marker in store.worker_markers() {
                println!(
                    "worker  #{:<8} {:?} (icon {})",
                    marker.id, marker.emphasis, marker.style.icon_size
                );
            }
            for marker in store.request_markers() {
                println!(
                    "request #{:<8} {:?} (icon {})",
                    marker.id, marker.emphasis, marker.style.icon_size
                );
            }

            match store.viewport() {
                Some(frame) => println!(
                    "Frame: lat {:.5}..{:.5}, lon {:.5}..{:.5}",
                    frame.min_lat, frame.max_lat, frame.min_lon, frame.max_lon
                ),
                None => println!("Frame: none (no located entities and no bounding box)"),
            }
        }
        Commands::Search { query, filter } => {
            let filter = match filter {
                Some(raw) => parse_filter(raw)?,
                None => None,
            };
            let hits = source.search_requests(query, filter)?;
            if hits.results.is_empty() {
                println!("No requests matching '{}'", query);
            }
            for hit in hits.results {
                println!("{}", hit.text);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved_descending() -> ViewPreferences {
        ViewPreferences {
            sort: SortSpec::new(SortKey::Cost, SortDirection::Desc),
            filter: Some(StatusGroup::InWork),
            selected_filters: vec!["in_work".to_string()],
        }
    }

    #[test]
    fn test_saved_descending_can_return_to_ascending() {
        let prefs = apply_list_options(saved_descending(), None, Some("asc"), None).unwrap();
        assert_eq!(prefs.sort, SortSpec::new(SortKey::Cost, SortDirection::Asc));
        assert_eq!(prefs.filter, Some(StatusGroup::InWork));
    }

    #[test]
    fn test_new_column_keeps_saved_direction() {
        let prefs =
            apply_list_options(saved_descending(), Some("date"), None, Some("all")).unwrap();
        assert_eq!(
            prefs.sort,
            SortSpec::new(SortKey::Date, SortDirection::Desc)
        );
        assert_eq!(prefs.filter, None);
        assert_eq!(prefs.selected_filters, vec!["in_work".to_string()]);
    }

    #[test]
    fn test_bad_options_are_rejected() {
        assert!(apply_list_options(saved_descending(), None, Some("sideways"), None).is_err());
        assert!(apply_list_options(saved_descending(), Some("weight"), None, None).is_err());
        assert!(apply_list_options(saved_descending(), None, None, Some("archived")).is_err());
    }
}
