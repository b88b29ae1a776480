//! `mdesk list` command - one page of a resource table

use console::style;
use miette::{IntoDiagnostic, Result};
use serde_json::Value;

use crate::cli::commands::utils::{block_on, expect_loaded, parse_assignment, Session};
use crate::cli::table::{ColumnDef, TableConfig, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{DynamicRecord, LoadState, ResourceScreen, RowsPerPage};

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Resource key (see `mdesk resources`)
    pub resource: String,

    /// Free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Structural filter, repeatable (e.g. --filter building_id=3)
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Sort by this column
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, short = 'r', requires = "sort")]
    pub reverse: bool,

    /// Page to show
    #[arg(long, short = 'p', default_value_t = 1)]
    pub page: u32,

    /// Rows per page (20, 50, 100, 500, 1000)
    #[arg(long)]
    pub rows: Option<RowsPerPage>,

    /// Columns to show, comma separated (default: catalog columns)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Wrap text columns at this width instead of truncating
    #[arg(long, short = 'w')]
    pub wrap: Option<usize>,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let session = Session::open(global)?;
    let descriptor = session.descriptor(&args.resource)?;
    let screen = session.screen(descriptor)?;

    apply_parameters(&screen, &args)?;
    expect_loaded(block_on(screen.mount())?)?;

    let items: Vec<DynamicRecord> = screen.store().items().to_vec();
    match global.format {
        OutputFormat::Json => {
            let rows: Vec<&serde_json::Map<String, Value>> = items.iter().map(DynamicRecord::fields).collect();
            println!("{}", serde_json::to_string_pretty(&rows).into_diagnostic()?);
            return Ok(());
        }
        OutputFormat::Yaml => {
            let rows: Vec<&serde_json::Map<String, Value>> = items.iter().map(DynamicRecord::fields).collect();
            print!("{}", serde_yml::to_string(&rows).into_diagnostic()?);
            return Ok(());
        }
        _ => {}
    }

    let all_columns: Vec<ColumnDef> = descriptor.list_columns().iter().map(ColumnDef::from).collect();
    let columns: Vec<ColumnDef> = if args.columns.is_empty() {
        all_columns
    } else {
        args.columns
            .iter()
            .map(|key| {
                all_columns.iter().find(|c| &c.key == key).cloned().unwrap_or(ColumnDef {
                    key: key.clone(),
                    header: key.to_uppercase(),
                    width: 30,
                })
            })
            .collect()
    };

    if screen.store().state() == LoadState::Empty {
        if !global.quiet {
            println!("{}", style("No data").dim());
        }
        return Ok(());
    }

    let config = match (args.wrap, global.format) {
        (_, OutputFormat::Csv | OutputFormat::Id) => TableConfig::for_pipe(),
        (Some(width), _) => TableConfig::with_wrap(width),
        (None, _) if global.quiet => TableConfig::for_pipe(),
        (None, _) => TableConfig::default(),
    };
    let rows: Vec<TableRow> = items.iter().map(|r| TableRow::from_record(r, &columns)).collect();
    let entity = descriptor.label.to_lowercase();
    TableFormatter::new(&columns, &entity)
        .with_config(config.clone())
        .output(&rows, global.format);

    if config.show_summary && matches!(global.format, OutputFormat::Auto | OutputFormat::Tsv) {
        let pagination = screen.store().pagination();
        println!(
            "{} {} page {} of {}",
            style(pagination.range_label()).cyan(),
            style("·").dim(),
            pagination.page,
            pagination.last_page()
        );
    }
    Ok(())
}

/// Set search, filters, sort and paging before the first fetch
fn apply_parameters(screen: &ResourceScreen<DynamicRecord>, args: &ListArgs) -> Result<()> {
    let store = screen.store();
    if let Some(rows) = args.rows {
        store.set_rows_per_page(rows);
    }
    if let Some(search) = &args.search {
        store.set_search(search);
    }
    for raw in &args.filters {
        let (key, value) = parse_assignment(raw)?;
        store.set_filter(&key, &value);
    }
    if let Some(sort) = &args.sort {
        store.set_sort(sort);
        if args.reverse {
            store.set_sort(sort);
        }
    }
    store.set_page(args.page);
    Ok(())
}
