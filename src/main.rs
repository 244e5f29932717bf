mod config;
mod events;
mod logging;
mod model;
mod remote;
mod search;
mod store;
mod ui;
mod view;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tokio::runtime::Runtime;

use config::Config;
use logging::LogTarget;
use model::{RecordId, SortKey};
use remote::http::HttpRecordService;
use remote::RecordService;
use store::RecordStore;
use ui::panes::Column;

#[derive(Parser, Debug)]
#[command(name = "orgdesk", version, about = "Browse and edit organization records")]
struct Cli {
    /// Configuration file (defaults to the user config dir)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of records as a table
    List(ListArgs),
    /// Delete a record by id
    Delete(DeleteArgs),
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Case-insensitive filter on the director name
    #[arg(long, short)]
    search: Option<String>,

    /// Sort field (id, name, username, email, phone, city, street, suite, company, director)
    #[arg(long, value_parser = parse_sort_key)]
    sort: Option<SortKey>,

    /// Sort descending (requires --sort)
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Page to print, starting at 1
    #[arg(long, short, default_value_t = 1)]
    page: usize,
}

#[derive(Args, Debug)]
struct DeleteArgs {
    id: RecordId,
}

fn parse_sort_key(value: &str) -> Result<SortKey, String> {
    SortKey::from_str(value).ok_or_else(|| {
        let known: Vec<&str> = SortKey::ALL.iter().map(|key| key.as_str()).collect();
        format!("unknown sort field `{}` (expected one of: {})", value, known.join(", "))
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let level = logging::verbosity_level(cli.verbose).unwrap_or(config.log.level.as_str());
    let target = match cli.command {
        Some(_) => LogTarget::Stderr,
        None => LogTarget::File(config.log.interactive_log_path()?),
    };
    logging::init(level, &target)?;
    for warning in &config.warnings {
        tracing::warn!("{}", warning);
    }
    if let Some(path) = &config.config_path {
        tracing::debug!(path = %path.display(), "loaded configuration");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let service = HttpRecordService::new(&config.remote)?;
    tracing::debug!(url = service.base_url(), "using remote service");
    let store = RecordStore::new(service, config.view.page_size);

    match cli.command {
        Some(Command::List(args)) => handle_list(args, store, &runtime),
        Some(Command::Delete(args)) => handle_delete(args, store, &runtime),
        None => run_interactive(store, &runtime, &config),
    }
}

fn run_interactive<S: RecordService>(store: RecordStore<S>, runtime: &Runtime, config: &Config) -> Result<()> {
    let mut app = ui::app::App::new(store, runtime, config);
    app.run()
}

fn handle_list<S: RecordService>(args: ListArgs, mut store: RecordStore<S>, runtime: &Runtime) -> Result<()> {
    runtime
        .block_on(store.load_all())
        .context("failed to load records")?;

    if let Some(query) = args.search {
        store.set_search_query(query);
    }
    if let Some(key) = args.sort {
        store.set_sort_key(key);
        if args.desc {
            store.set_sort_key(key);
        }
    }

    let total = store.state().page_count();
    check_page(args.page, total)?;
    store.set_current_page(args.page);

    let state = store.state();
    let rows = state.page_slice();
    if rows.is_empty() {
        println!("No matching records");
    } else {
        print!("{}", format_table(&rows));
    }
    println!(
        "page {} of {} ({} records)",
        state.current_page(),
        total.max(1),
        state.filtered_len()
    );
    Ok(())
}

/// An empty result still has one (empty) page to print.
fn check_page(page: usize, total: usize) -> Result<()> {
    let last = total.max(1);
    if page == 0 || page > last {
        bail!("page {} is out of range (1-{})", page, last);
    }
    Ok(())
}

fn handle_delete<S: RecordService>(args: DeleteArgs, mut store: RecordStore<S>, runtime: &Runtime) -> Result<()> {
    if let Err(err) = runtime.block_on(store.load_all()) {
        tracing::warn!(error = %err, "deleting without a local copy");
    }

    let removed = runtime
        .block_on(store.delete_record(args.id))
        .with_context(|| format!("failed to delete record #{}", args.id))?;

    if removed {
        println!("Deleted record #{}", args.id);
    } else {
        println!("Deleted record #{} (it was not in the fetched list)", args.id);
    }
    Ok(())
}

fn format_table(rows: &[&model::Record]) -> String {
    let mut header: Vec<String> = vec!["ID".to_string()];
    header.extend(Column::ALL.iter().map(|column| column.title().to_string()));

    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|record| {
            let mut cells = vec![record.id.to_string()];
            cells.extend(Column::ALL.iter().map(|column| column.cell(record)));
            cells
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|cell| cell.chars().count()).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in std::iter::once(&header).chain(body.iter()) {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
