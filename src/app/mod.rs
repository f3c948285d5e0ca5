mod arcs;
pub(crate) mod catalog;
mod episode;
mod grouping;
mod progress;
mod tracker;
mod tui;
pub(crate) mod watch;


use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::cli::{Cli, Command, Options};
use crate::db::Database;
use crate::paths::database_file_path;

use self::arcs::ArcTable;
use self::catalog::{CatalogOrigin, CatalogSource, JikanCatalog, OfflineCatalog};
use self::episode::{format_updated_display, truncate};
use self::tracker::Tracker;
use self::watch::{MemoryWatchStore, WatchStore};

pub fn run(cli: Cli) -> Result<()> {
    let table = load_table()?;

    if let Some(Command::Arcs) = cli.command {
        return run_arcs(&table);
    }

    let db = if cli.options.ephemeral {
        None
    } else {
        Some(open_db()?)
    };
    let memory = MemoryWatchStore::new();
    let store: &dyn WatchStore = match db.as_ref() {
        Some(db) => db,
        None => &memory,
    };

    match cli.command {
        Some(Command::Summary) => run_summary(&cli.options, store, &table, db.as_ref())?,
        Some(Command::Mark { ids }) => run_mark(store, &table, &ids, true)?,
        Some(Command::Unmark { ids }) => run_mark(store, &table, &ids, false)?,
        Some(Command::Reset) => run_reset(db.as_ref())?,
        Some(Command::Arcs) => {}
        Some(Command::Tui) | None => {
            let tracker = build_tracker(&cli.options, store, &table)?;
            tui::run_tui(tracker, store)?;
        }
    }

    Ok(())
}

fn load_table() -> Result<ArcTable> {
    let table = ArcTable::builtin().context("built-in arc table is invalid")?;
    for overlap in table.overlaps() {
        warn!(
            first = %overlap.first,
            second = %overlap.second,
            range = %overlap.range,
            "arcs share episodes; shared episodes count in both"
        );
    }
    Ok(table)
}

fn catalog_source(options: &Options) -> Box<dyn CatalogSource> {
    if options.offline {
        Box::new(OfflineCatalog)
    } else {
        Box::new(JikanCatalog::new(&options.catalog_url, options.anime_id))
    }
}

fn build_tracker(options: &Options, store: &dyn WatchStore, table: &ArcTable) -> Result<Tracker> {
    info!(offline = options.offline, url = %options.catalog_url, "building tracker");
    let mut source = catalog_source(options);
    Tracker::build(source.as_mut(), store, table).inspect_err(|err| {
        error!(error = %err, "tracker generation failed");
    })
}

fn run_summary(
    options: &Options,
    store: &dyn WatchStore,
    table: &ArcTable,
    db: Option<&Database>,
) -> Result<()> {
    let tracker = build_tracker(options, store, table)?;
    let report = tracker.report();

    if let CatalogOrigin::Fallback { reason } = tracker.origin() {
        println!("Catalog unavailable ({reason}); showing fallback episodes.\n");
    }
    if report.sagas.is_empty() {
        println!("No episodes matched any arc.");
        return Ok(());
    }

    println!("{:<44} {:>10} {:>6}", "SAGA / ARC", "WATCHED", "%");
    for saga in &report.sagas {
        println!(
            "{:<44} {:>10} {:>6}",
            truncate(&saga.name, 44),
            format!("{}/{}", saga.progress.watched, saga.progress.total),
            saga.progress.label()
        );
        for arc in &saga.arcs {
            println!(
                "  {:<42} {:>10} {:>6}",
                truncate(&arc.name, 42),
                format!("{}/{}", arc.progress.watched, arc.progress.total),
                arc.progress.label()
            );
        }
    }
    println!("\nOverall: {}", report.overall.detail());

    let unclassified = &tracker.grouping().unclassified;
    if !unclassified.is_empty() {
        println!(
            "{} episode(s) are outside every known arc and are not counted.",
            unclassified.len()
        );
    }
    if let Some(db) = db
        && let Some(updated) = db.last_updated()?
    {
        println!(
            "{} episode(s) marked watched in storage. Last change: {}",
            db.watched_count()?,
            format_updated_display(&updated)
        );
    }
    Ok(())
}

fn run_reset(db: Option<&Database>) -> Result<()> {
    let Some(db) = db else {
        println!("Nothing to reset in ephemeral mode.");
        return Ok(());
    };
    let removed = db.clear_watch_state()?;
    info!(removed, "watch state cleared");
    println!("Cleared {removed} stored episode state(s).");
    Ok(())
}

fn run_mark(store: &dyn WatchStore, table: &ArcTable, ids: &[u32], watched: bool) -> Result<()> {
    let state = if watched { "watched" } else { "unwatched" };
    for id in ids {
        let matches = table.classify(*id);
        let Some(first) = matches.first() else {
            println!("Episode {id} is not part of any arc; skipped.");
            continue;
        };
        store.set(*id, watched)?;
        println!("Episode {id} ({}, {}) marked {state}.", first.arc, first.saga);
    }
    Ok(())
}

fn run_arcs(table: &ArcTable) -> Result<()> {
    if let (Some(first), Some(last)) = (table.first_covered(), table.last_covered()) {
        println!(
            "{} sagas, {} arcs, episodes {first}-{last}\n",
            table.sagas().len(),
            table.arc_count()
        );
    }
    for saga in table.sagas() {
        println!("{}", saga.name);
        for arc in &saga.arcs {
            let ranges = arc
                .ranges
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  {:<36} {:<24} {:>4} eps",
                truncate(&arc.name, 36),
                ranges,
                arc.episode_span()
            );
        }
    }

    let gaps = table.gaps();
    if !gaps.is_empty() {
        let listed = gaps
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        println!("\nUnassigned episodes: {listed}");
    }
    for overlap in table.overlaps() {
        println!(
            "Overlap: {} and {} both claim {}",
            overlap.first, overlap.second, overlap.range
        );
    }
    if let Some(last) = table.last_covered() {
        println!("Episodes after {last} are not tracked.");
    }
    Ok(())
}

fn open_db() -> Result<Database> {
    let db_path = database_file_path()?;
    let db = Database::open(&db_path)?;
    db.migrate()?;
    Ok(db)
}
