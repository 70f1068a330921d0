//! orc-console - Conference console for one venue
//!
//! Loads a venue through the API (or an offline snapshot file) and prints
//! console views as JSON:
//! - `summary`: venue summary and enabled stages
//! - `papers`: one page of the paper table
//! - `reviewers` / `area-chairs`: member progress
//! - `export`: the full filtered table
//! - `message`: a bulk message draft for selected papers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use orc_common::config::{
    load_toml_config, resolve_access_token, resolve_api_url, resolve_config_path, TomlConfig,
};
use orc_common::logging::init_tracing;
use orc_common::RoleKind;
use orc_console::api::{ApiClient, ApiFixture, ApiOptions, HttpApiClient, InMemoryApi};
use orc_console::table::{ExportColumn, MessageTarget, SortColumn, SortDirection, TableView};
use orc_console::{Console, LoadOutcome, TracingNotifier};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "orc-console")]
#[command(about = "Conference console: paper, reviewer and area chair status for one venue")]
#[command(version)]
struct Args {
    /// Config file (TOML with [api], [logging] and [venue])
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// API base URL
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// API access token
    #[arg(long, global = true, value_name = "TOKEN")]
    token: Option<String>,

    /// Serve requests from a JSON fixture instead of the API
    #[arg(long, global = true, value_name = "FILE")]
    snapshot: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Venue summary and enabled stages
    Summary,

    /// One page of the paper table
    Papers {
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Sort column, e.g. `number`, `title`, `rating_avg:rating`
        #[arg(long)]
        sort: Option<String>,

        #[arg(long)]
        desc: bool,

        /// Basic search text or a structured query like `+reviewsDone<2`
        #[arg(long)]
        query: Option<String>,
    },

    /// Reviewer progress
    Reviewers,

    /// Area chair progress
    AreaChairs,

    /// Export the filtered table
    Export {
        #[arg(long)]
        query: Option<String>,

        /// Comma-separated column names; venue defaults when omitted
        #[arg(long)]
        columns: Option<String>,

        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Tab-separated text instead of JSON
        #[arg(long)]
        tsv: bool,
    },

    /// Draft a bulk message to members of selected papers
    Message {
        #[arg(long)]
        target: MessageTarget,

        /// Comma-separated paper ids; every paper matching --query when omitted
        #[arg(long, value_delimiter = ',')]
        papers: Vec<String>,

        #[arg(long)]
        query: Option<String>,

        #[arg(long, default_value = "")]
        subject: String,

        #[arg(long, default_value = "")]
        body: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_client(args: &Args, config: &TomlConfig) -> Result<Arc<dyn ApiClient>> {
    if let Some(path) = &args.snapshot {
        info!("Using offline snapshot {}", path.display());
        let fixture = ApiFixture::from_file(path)?;
        return Ok(Arc::new(InMemoryApi::new(fixture)));
    }

    let base_url = resolve_api_url(args.api_url.as_deref(), config);
    let options = ApiOptions {
        access_token: resolve_access_token(args.token.as_deref(), config),
        timeout: config.api.timeout_secs.map(Duration::from_secs),
    };
    info!(
        "API: {} ({})",
        base_url,
        if options.access_token.is_some() {
            "authenticated"
        } else {
            "anonymous"
        }
    );
    Ok(Arc::new(HttpApiClient::new(base_url, options)?))
}

fn filtered_view(config: &TomlConfig, query: Option<&str>) -> Result<TableView> {
    let mut view = TableView::new(&config.venue);
    if let Some(query) = query {
        view.set_filter(query)
            .with_context(|| format!("Invalid query '{}'", query))?;
    }
    Ok(view)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref())?;
    let config = load_toml_config(&config_path)?;

    init_tracing(&config.logging)?;

    // Build identification first, before any network delay
    info!(
        "Starting orc-console v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!("Config: {}", config_path.display());

    let client = build_client(&args, &config)?;
    let mut console = Console::new(client, config.venue.clone(), Arc::new(TracingNotifier));
    if let Some(limit) = config.api.page_limit {
        console = console.with_page_limit(limit);
    }

    match console.load().await? {
        LoadOutcome::Loaded { paper_count, .. } => info!("Loaded {} papers", paper_count),
        outcome => anyhow::bail!("Load did not complete: {:?}", outcome),
    }
    let loaded = console.require_data().await?;
    let data = &loaded.data;

    match args.command {
        Command::Summary => print_json(&data.summary)?,

        Command::Papers {
            page,
            sort,
            desc,
            query,
        } => {
            let mut view = filtered_view(&config, query.as_deref())?;
            if let Some(sort) = sort {
                let column: SortColumn = sort.parse()?;
                let direction = if desc {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                };
                view.set_sort(column, direction);
            } else if desc {
                let column = view.sort().0.clone();
                view.set_sort(column, SortDirection::Desc);
            }
            view.set_page(page);
            print_json(&view.render(&data.rows))?;
        }

        Command::Reviewers => print_json(&data.member_progress(RoleKind::Reviewers))?,

        Command::AreaChairs => {
            if config.venue.area_chairs.is_none() {
                anyhow::bail!("Venue has no area chairs configured");
            }
            print_json(&data.member_progress(RoleKind::AreaChairs))?;
        }

        Command::Export {
            query,
            columns,
            output,
            tsv,
        } => {
            let view = filtered_view(&config, query.as_deref())?;
            let columns = match columns {
                Some(names) => ExportColumn::parse_list(&names)?,
                None => ExportColumn::defaults(&config.venue),
            };
            let table = view.export(&data.rows, &columns);
            let text = if tsv {
                table.to_tsv()
            } else {
                serde_json::to_string_pretty(&table)?
            };

            match output {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("Write {} failed", path.display()))?;
                    info!("Exported {} rows to {}", table.rows.len(), path.display());
                }
                None => println!("{}", text),
            }
        }

        Command::Message {
            target,
            papers,
            query,
            subject,
            body,
        } => {
            let mut view = filtered_view(&config, query.as_deref())?;
            if papers.is_empty() {
                let visible = view.visible(&data.rows);
                view.selection.select_all(visible);
            } else {
                for id in papers {
                    view.selection.select(id);
                }
            }
            print_json(&view.message_draft(&data.rows, target, &subject, &body))?;
        }
    }

    console.close();
    Ok(())
}
