use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use flexi_logger::{Logger, LoggerHandle};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::Value;

use datalist::config::{Config, CONFIG};
use datalist::{
    compute_window, count_active_filters, paginate, sort_records, DataListError, FilterState,
    PageItem, PageSummary, SortConfig, SortDirection,
};

#[derive(Parser)]
#[command(
    name = "datalist",
    version,
    about = "Headless list-view helpers: page windows, sorting and filter counts"
)]
pub struct Cli {
    /// Config file to use instead of the one in the data directory
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the page navigation strip
    Window {
        /// Current page (clamped into range)
        #[arg(long = "page", short = 'p', default_value_t = 1)]
        page: u32,

        /// Total number of pages (conflicts with "total")
        #[arg(long = "total-pages", conflicts_with = "total", required_unless_present = "total")]
        total_pages: Option<u32>,

        /// Total number of records; pages are derived from the page size
        #[arg(long = "total")]
        total: Option<u64>,

        /// Records per page (defaults to the configured page size)
        #[arg(long = "page-size")]
        page_size: Option<u32>,
    },

    /// Sort a JSON array of records by a dotted key
    Sort {
        /// JSON file holding an array of records ("-" for stdin)
        #[arg(long = "input", short = 'i')]
        input: PathBuf,

        /// Dotted field path, e.g. "customer.email"
        #[arg(long = "key", short = 'k')]
        key: String,

        #[arg(
            long = "direction",
            value_parser = clap::builder::PossibleValuesParser::new(["asc", "desc"]),
            default_value = "asc"
        )]
        direction: String,
    },

    /// Show one page of a JSON array of records
    Page {
        /// JSON file holding an array of records ("-" for stdin)
        #[arg(long = "input", short = 'i')]
        input: PathBuf,

        #[arg(long = "page", short = 'p', default_value_t = 1)]
        page: u32,

        /// Records per page (defaults to the configured page size)
        #[arg(long = "page-size")]
        page_size: Option<u32>,

        /// Sort by this dotted key before paging
        #[arg(long = "sort-key")]
        sort_key: Option<String>,

        #[arg(
            long = "direction",
            value_parser = clap::builder::PossibleValuesParser::new(["asc", "desc"]),
            default_value = "asc",
            requires = "sort_key"
        )]
        direction: String,
    },

    /// Count the active entries in a JSON object of advanced filters
    CountFilters {
        /// JSON file holding the filter object ("-" for stdin)
        #[arg(long = "input", short = 'i')]
        input: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

impl Cli {
    pub fn handle_command_line() -> Result<(), DataListError> {
        let args = Cli::parse();

        let config = Self::load_config(args.config.as_deref())?;
        let _logger = Self::start_logger(&config)?;
        debug!("Command-line args: {:?}", std::env::args_os().collect::<Vec<_>>());

        let _ = CONFIG.set(config);

        let output = Self::run(args.command)?;
        println!("{output}");

        Ok(())
    }

    fn load_config(path: Option<&Path>) -> Result<Config, DataListError> {
        match path {
            Some(path) => Config::load_from(path),
            None => match ProjectDirs::from("", "", "datalist") {
                Some(project_dirs) => Config::load_config(&project_dirs),
                None => Config::load_from(Path::new("datalist.toml")),
            },
        }
    }

    fn start_logger(config: &Config) -> Result<LoggerHandle, DataListError> {
        let spec = format!("datalist={}", config.logging.datalist);
        let handle = Logger::try_with_env_or_str(spec)?.start()?;
        Ok(handle)
    }

    /// Execute `command` and return what should be printed.
    pub fn run(command: Command) -> Result<String, DataListError> {
        let list_config = &Config::global().list;

        match command {
            Command::Window {
                page,
                total_pages,
                total,
                page_size,
            } => {
                let total_pages = match (total_pages, total) {
                    (Some(pages), _) => pages,
                    (None, Some(total)) => datalist::total_pages(
                        total,
                        page_size.unwrap_or(list_config.default_page_size),
                    ),
                    (None, None) => 0,
                };
                Ok(Self::format_window(&compute_window(page, total_pages)))
            }
            Command::Sort {
                input,
                key,
                direction,
            } => {
                let rows: Vec<Value> = Self::read_json(&input)?;
                let config = Self::sort_config(&key, &direction)?;
                let sorted = sort_records(&rows, Some(&config));
                Ok(serde_json::to_string_pretty(&sorted)?)
            }
            Command::Page {
                input,
                page,
                page_size,
                sort_key,
                direction,
            } => {
                let rows: Vec<Value> = Self::read_json(&input)?;
                let page_size = page_size.unwrap_or(list_config.default_page_size);

                let sort = match sort_key {
                    Some(key) => Some(Self::sort_config(&key, &direction)?),
                    None => None,
                };
                let rows = sort_records(&rows, sort.as_ref());

                let summary = PageSummary::new(page, page_size, rows.len() as u64);
                let page_rows = paginate(&rows, page, page_size);
                info!("{summary}");

                Ok(format!(
                    "{}\n{}\n{}",
                    serde_json::to_string_pretty(page_rows)?,
                    summary,
                    Self::format_window(&compute_window(summary.page, summary.total_pages))
                ))
            }
            Command::CountFilters { input } => {
                let filters: FilterState = Self::read_json(&input)?;
                Ok(count_active_filters(&filters).to_string())
            }
            Command::Config => toml::to_string_pretty(Config::global())
                .map_err(|e| DataListError::Error(format!("Failed to serialize config: {e}"))),
        }
    }

    fn sort_config(key: &str, direction: &str) -> Result<SortConfig, DataListError> {
        let direction: SortDirection = direction
            .parse()
            .map_err(|_| DataListError::Error(format!("Invalid sort direction: '{direction}'")))?;
        Ok(SortConfig::new(key, direction))
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataListError> {
        let text = if path == Path::new("-") {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            fs::read_to_string(path)?
        };
        Ok(serde_json::from_str(&text)?)
    }

    fn format_window(window: &[PageItem]) -> String {
        window
            .iter()
            .map(PageItem::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
