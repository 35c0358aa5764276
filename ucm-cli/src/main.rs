//! `ucm` - terminal connection manager
//!
//! Without a subcommand, starts the interactive UI over the SSH and Docker
//! views. Subcommands cover listing, connecting, favorites, history and
//! editing the connections file from scripts.

mod logging;
mod tui;

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use ucm_core::{
    AppSettings, ConfigManager, Connection, ConnectionListController, Container,
    ContainerListController, HistoryEntry, Launcher, ProcessExecutor, Row, SortPolicy,
};

use logging::LogFormat;

/// Terminal connection manager for SSH hosts and Docker containers
#[derive(Parser)]
#[command(name = "ucm")]
#[command(author, version, about = "Terminal connection manager for SSH and Docker")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration directory (default: ~/.ucm)
    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Log filter directive, overridden by RUST_LOG
    #[arg(long, global = true, default_value = logging::DEFAULT_LEVEL)]
    pub log_level: String,

    /// Log line format
    #[arg(long, global = true, default_value = "text", value_enum)]
    pub log_format: LogFormat,

    /// Log file (default: <tmp>/ucm-<user>.log)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List connections
    #[command(about = "List configured SSH connections")]
    List {
        /// Only show connections matching this text
        #[arg(short, long)]
        filter: Option<String>,

        /// Only show favorites
        #[arg(long)]
        favorites: bool,

        /// Most recently used first
        #[arg(long)]
        recent: bool,

        /// Output format for the connection list
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Connect to a server by name
    #[command(about = "Open an SSH session to a configured connection")]
    Connect {
        /// Connection name (exact, case-insensitive or unique prefix)
        name: String,
    },

    /// Reconnect to the most recently used connection
    #[command(about = "Connect to the most recently used connection")]
    Last,

    /// Toggle a favorite
    #[command(about = "Add a connection to favorites, or remove it")]
    Favorite {
        /// Connection name
        name: String,
    },

    /// Show usage history
    #[command(about = "Show recently used connections")]
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Forget all history instead
        #[arg(long)]
        clear: bool,
    },

    /// Show usage statistics
    #[command(about = "Show usage statistics")]
    Stats,

    /// Validate the connections file
    #[command(about = "Check the connections file for invalid records")]
    Validate,

    /// List Docker containers
    #[command(about = "List local Docker containers")]
    Containers {
        /// Include stopped containers
        #[arg(short, long)]
        all: bool,

        /// Output format for the container list
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Add a new connection
    #[command(about = "Add a new connection to the configuration")]
    Add {
        /// Name for the new connection
        name: String,

        /// Host address (hostname or IP)
        address: String,

        #[command(flatten)]
        fields: ConnectionFields,
    },

    /// Edit a connection
    #[command(about = "Edit an existing connection, keeping its history and favorite")]
    Edit {
        /// Connection name
        name: String,

        /// New connection name
        #[arg(long)]
        new_name: Option<String>,

        /// New host address
        #[arg(long)]
        address: Option<String>,

        #[command(flatten)]
        fields: ConnectionFields,
    },

    /// Remove a connection
    #[command(about = "Remove a connection from the configuration")]
    Remove {
        /// Connection name
        name: String,
    },
}

/// Optional connection fields shared by `add` and `edit`
#[derive(Args, Debug, Default, Clone)]
pub struct ConnectionFields {
    /// Username for authentication
    #[arg(short, long)]
    pub user: Option<String>,

    /// Port number
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: Option<u16>,

    /// Path to SSH private key file
    #[arg(short, long)]
    pub identity_file: Option<String>,

    /// Extra ssh command-line options
    #[arg(short, long, allow_hyphen_values = true)]
    pub options: Option<String>,

    /// Category used for grouping and filtering
    #[arg(short, long)]
    pub category: Option<String>,
}

impl ConnectionFields {
    /// Copies every field that was given onto `connection`
    fn apply(self, connection: &mut Connection) {
        if let Some(user) = self.user {
            connection.user = Some(user);
        }
        if let Some(port) = self.port {
            connection.port = Some(port);
        }
        if let Some(identity_file) = self.identity_file {
            connection.identity_file = Some(identity_file);
        }
        if let Some(options) = self.options {
            connection.options = Some(options);
        }
        if let Some(category) = self.category {
            connection.category = Some(category);
        }
    }
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}

fn main() {
    let cli = Cli::parse();

    let log_file = cli.log_file.clone().unwrap_or_else(logging::default_log_file);
    let log_guard = match logging::init(&cli.log_level, cli.log_format, &log_file) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e}");
            None
        }
    };

    let result = config_manager(cli.config_dir.as_deref()).and_then(|config| match cli.command {
        None => tui::run(config),
        Some(command) => run_command(&config, command),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        // exit skips destructors; flush buffered log lines first
        drop(log_guard);
        std::process::exit(e.exit_code());
    }
}

fn run_command(config: &ConfigManager, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::List {
            filter,
            favorites,
            recent,
            format,
        } => cmd_list(config, filter.as_deref(), favorites, recent, format),
        Commands::Connect { name } => cmd_connect(config, &name),
        Commands::Last => cmd_last(config),
        Commands::Favorite { name } => cmd_favorite(config, &name),
        Commands::History { limit, clear } => cmd_history(config, limit, clear),
        Commands::Stats => cmd_stats(config),
        Commands::Validate => cmd_validate(config),
        Commands::Containers { all, format } => cmd_containers(config, all, format),
        Commands::Add {
            name,
            address,
            fields,
        } => cmd_add(config, &name, &address, fields),
        Commands::Edit {
            name,
            new_name,
            address,
            fields,
        } => cmd_edit(config, &name, new_name, address, fields),
        Commands::Remove { name } => cmd_remove(config, &name),
    }
}

fn config_manager(dir: Option<&str>) -> Result<ConfigManager, CliError> {
    match dir {
        Some(dir) => Ok(ConfigManager::from_user_path(dir)),
        None => ConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

fn load_settings(config: &ConfigManager) -> Result<AppSettings, CliError> {
    config
        .load_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))
}

/// Opens the connection list, failing if the connections file is unreadable
///
/// Invalid records are reported on stderr and skipped.
fn open_list(
    config: &ConfigManager,
    settings: &AppSettings,
) -> Result<ConnectionListController, CliError> {
    config
        .ensure_sample_connections()
        .map_err(|e| CliError::Config(format!("Failed to create sample connections: {e}")))?;

    let (list, report) =
        ConnectionListController::open(config.clone(), settings.history.max_entries);
    if let Some(e) = report.source_error {
        return Err(CliError::Config(format!("Failed to load connections: {e}")));
    }
    for error in &report.validation_errors {
        eprintln!("Warning: skipping invalid record: {error}");
    }
    Ok(list)
}

/// Finds a connection by exact name, case-insensitive name, or unique prefix
fn find_connection<'a>(
    connections: &'a [Connection],
    name: &str,
) -> Result<&'a Connection, CliError> {
    if let Some(conn) = connections.iter().find(|c| c.name == name) {
        return Ok(conn);
    }

    if let Some(conn) = connections.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
        return Ok(conn);
    }

    let prefix = name.to_lowercase();
    let matches: Vec<_> = connections
        .iter()
        .filter(|c| c.name.to_lowercase().starts_with(&prefix))
        .collect();

    match matches.len() {
        0 => Err(CliError::ConnectionNotFound(name.to_string())),
        1 => Ok(matches[0]),
        _ => {
            let names: Vec<_> = matches.iter().map(|c| c.name.as_str()).collect();
            Err(CliError::Config(format!(
                "Ambiguous connection name '{}'. Matches: {}",
                name,
                names.join(", ")
            )))
        }
    }
}

// ============================================================================
// Listing
// ============================================================================

/// List connections command handler
fn cmd_list(
    config: &ConfigManager,
    filter: Option<&str>,
    favorites: bool,
    recent: bool,
    format: OutputFormat,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let mut list = open_list(config, &settings)?;

    list.set_filter(filter.unwrap_or_default());
    list.set_favorites_only(favorites);
    if recent || settings.ui.sort_by_recent {
        list.set_sort(SortPolicy::Recent);
    }

    let rows = list.rows();
    match format {
        OutputFormat::Table => println!("{}", format_table(rows, Utc::now())),
        OutputFormat::Json => println!("{}", format_json(rows)?),
    }
    Ok(())
}

/// Format connection rows as a table string
#[must_use]
pub fn format_table(rows: &[Row], now: DateTime<Utc>) -> String {
    if rows.is_empty() {
        return "No connections found.".to_string();
    }

    let mut output = String::new();

    let name_width = rows
        .iter()
        .map(|r| r.connection.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let dest_width = rows
        .iter()
        .map(|r| r.connection.destination().len())
        .max()
        .unwrap_or(11)
        .max(11);
    let port_width = 5;
    let category_width = rows
        .iter()
        .filter_map(|r| r.connection.category.as_ref().map(String::len))
        .max()
        .unwrap_or(8)
        .max(8);

    let _ = writeln!(
        output,
        "{:<3}  {:<name_width$}  {:<dest_width$}  {:<port_width$}  {:<category_width$}  LAST USED",
        "FAV", "NAME", "DESTINATION", "PORT", "CATEGORY"
    );
    let _ = writeln!(
        output,
        "{:-<3}  {:-<name_width$}  {:-<dest_width$}  {:-<port_width$}  {:-<category_width$}  {:-<9}",
        "", "", "", "", "", ""
    );

    for row in rows {
        let conn = &row.connection;
        let last_used = row
            .history
            .as_ref()
            .map_or_else(|| "never".to_string(), |h| h.format_age(now));
        let _ = writeln!(
            output,
            "{:<3}  {:<name_width$}  {:<dest_width$}  {:<port_width$}  {:<category_width$}  {}",
            if row.favorite { "*" } else { "" },
            conn.name,
            conn.destination(),
            conn.port.map(|p| p.to_string()).unwrap_or_default(),
            conn.category.as_deref().unwrap_or(""),
            last_used
        );
    }

    output.trim_end().to_string()
}

/// Format connection rows as JSON string
///
/// # Errors
///
/// Returns `CliError::Config` if JSON serialization fails.
pub fn format_json(rows: &[Row]) -> Result<String, CliError> {
    let output: Vec<ConnectionOutput> = rows.iter().map(Into::into).collect();
    serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}")))
}

/// Connection row output for scripts
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ConnectionOutput {
    pub name: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub favorite: bool,
    pub use_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
}

impl From<&Row> for ConnectionOutput {
    fn from(row: &Row) -> Self {
        let conn = &row.connection;
        Self {
            name: conn.name.clone(),
            address: conn.address.clone(),
            user: conn.user.clone(),
            port: conn.port,
            category: conn.category.clone(),
            favorite: row.favorite,
            use_count: row.use_count(),
            last_used: row.last_used(),
        }
    }
}

// ============================================================================
// Connecting
// ============================================================================

/// Connect command handler
fn cmd_connect(config: &ConfigManager, name: &str) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let mut list = open_list(config, &settings)?;

    if list.connections().is_empty() {
        return Err(CliError::ConnectionNotFound(
            "No connections configured".to_string(),
        ));
    }
    let connection = find_connection(list.connections(), name)?.clone();
    connect(&mut list, &connection, &settings)
}

/// Quick connect command handler
fn cmd_last(config: &ConfigManager) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let mut list = open_list(config, &settings)?;

    let connection = list.most_recent().cloned().ok_or_else(|| {
        CliError::ConnectionNotFound("No recently used connection".to_string())
    })?;
    connect(&mut list, &connection, &settings)
}

fn connect(
    list: &mut ConnectionListController,
    connection: &Connection,
    settings: &AppSettings,
) -> Result<(), CliError> {
    println!(
        "Connecting to '{}' ({})...",
        connection.name,
        connection.destination()
    );

    let launcher = Launcher::new(settings.terminal.clone());
    let mut executor = ProcessExecutor::new();
    list.connect(connection, &mut executor, &launcher, Utc::now())
        .map_err(|e| CliError::ConnectionFailed(format!("{}: {e}", connection.name)))?;

    info!(name = %connection.name, "Session ended");
    Ok(())
}

// ============================================================================
// Favorites, history and statistics
// ============================================================================

/// Favorite toggle command handler
fn cmd_favorite(config: &ConfigManager, name: &str) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let mut list = open_list(config, &settings)?;

    let connection = find_connection(list.connections(), name)?.clone();
    let favorite = list
        .toggle_favorite(&connection.identity())
        .map_err(|e| CliError::Store(format!("Failed to save favorites: {e}")))?;

    if favorite {
        println!("Added '{}' to favorites", connection.name);
    } else {
        println!("Removed '{}' from favorites", connection.name);
    }
    Ok(())
}

/// History command handler
fn cmd_history(config: &ConfigManager, limit: usize, clear: bool) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let mut list = open_list(config, &settings)?;

    if clear {
        list.clear_history()
            .map_err(|e| CliError::Store(format!("Failed to clear history: {e}")))?;
        println!("History cleared");
        return Ok(());
    }

    println!("{}", format_history(&list.history().recent(limit), Utc::now()));
    Ok(())
}

/// Format history entries as a table string
#[must_use]
pub fn format_history(entries: &[&HistoryEntry], now: DateTime<Utc>) -> String {
    if entries.is_empty() {
        return "No history yet.".to_string();
    }

    let mut output = String::new();
    let name_width = entries
        .iter()
        .map(|e| e.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let address_width = entries
        .iter()
        .map(|e| e.address.len())
        .max()
        .unwrap_or(7)
        .max(7);

    let _ = writeln!(
        output,
        "{:<name_width$}  {:<address_width$}  {:>4}  LAST USED",
        "NAME", "ADDRESS", "USES"
    );
    let _ = writeln!(
        output,
        "{:-<name_width$}  {:-<address_width$}  {:-<4}  {:-<9}",
        "", "", "", ""
    );
    for entry in entries {
        let _ = writeln!(
            output,
            "{:<name_width$}  {:<address_width$}  {:>4}  {}",
            entry.name,
            entry.address,
            entry.use_count,
            entry.format_age(now)
        );
    }

    output.trim_end().to_string()
}

/// Statistics command handler
fn cmd_stats(config: &ConfigManager) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let list = open_list(config, &settings)?;
    let stats = list.stats();

    println!("Usage Statistics:");
    println!("  Configured:   {}", list.connections().len());
    println!("  Used:         {}", stats.total_connections);
    println!("  Total uses:   {}", stats.total_uses);
    println!("  Favorites:    {}", stats.favorites_count);
    if let Some(entry) = stats.most_used {
        println!("  Most used:    {} ({} uses)", entry.name, entry.use_count);
    }
    Ok(())
}

/// Validate command handler
fn cmd_validate(config: &ConfigManager) -> Result<(), CliError> {
    let path = config.connections_path();
    let report = config
        .load_connections()
        .map_err(|e| CliError::Config(e.to_string()))?;

    if report.is_clean() {
        println!(
            "{}: {} connection(s), no errors",
            path.display(),
            report.connections.len()
        );
        return Ok(());
    }

    println!("{}:", path.display());
    for error in &report.errors {
        println!("  - {error}");
    }
    Err(CliError::Config(format!(
        "{} invalid connection record(s), {} valid",
        report.errors.len(),
        report.connections.len()
    )))
}

// ============================================================================
// Containers
// ============================================================================

/// Containers command handler
fn cmd_containers(config: &ConfigManager, all: bool, format: OutputFormat) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let mut containers = ContainerListController::new(settings.docker);
    if all {
        containers.toggle_show_all();
    }
    containers
        .refresh(&mut ProcessExecutor::new())
        .map_err(|e| CliError::Docker(e.to_string()))?;

    let rows = containers.containers();
    match format {
        OutputFormat::Table => println!("{}", format_container_table(rows)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(rows)
                .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Format containers as a table string
#[must_use]
pub fn format_container_table(containers: &[Container]) -> String {
    if containers.is_empty() {
        return "No containers found.".to_string();
    }

    let mut output = String::new();
    let id_width = containers.iter().map(|c| c.id.len()).max().unwrap_or(2).max(2);
    let name_width = containers
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let image_width = containers
        .iter()
        .map(|c| c.image.len())
        .max()
        .unwrap_or(5)
        .max(5);

    let _ = writeln!(
        output,
        "{:<id_width$}  {:<name_width$}  {:<image_width$}  STATUS",
        "ID", "NAME", "IMAGE"
    );
    let _ = writeln!(
        output,
        "{:-<id_width$}  {:-<name_width$}  {:-<image_width$}  {:-<6}",
        "", "", "", ""
    );
    for c in containers {
        let _ = writeln!(
            output,
            "{:<id_width$}  {:<name_width$}  {:<image_width$}  {}",
            c.id, c.name, c.image, c.status
        );
    }

    output.trim_end().to_string()
}

// ============================================================================
// Editing
// ============================================================================

/// Add connection command handler
fn cmd_add(
    config: &ConfigManager,
    name: &str,
    address: &str,
    fields: ConnectionFields,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let mut list = open_list(config, &settings)?;

    let mut connection = Connection::new(name, address);
    fields.apply(&mut connection);
    list.add_connection(connection)
        .map_err(|e| CliError::Config(format!("Failed to add connection: {e}")))?;

    println!("Added connection '{name}'");
    Ok(())
}

/// Edit connection command handler
///
/// Goes through the tracked edit path so history and favorite records follow
/// a rename or address change.
fn cmd_edit(
    config: &ConfigManager,
    name: &str,
    new_name: Option<String>,
    address: Option<String>,
    fields: ConnectionFields,
) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let mut list = open_list(config, &settings)?;

    let identity = find_connection(list.connections(), name)?.identity();
    let ticket = list
        .begin_edit(&identity)
        .ok_or_else(|| CliError::ConnectionNotFound(name.to_string()))?;

    let mut updated = ticket.draft().clone();
    if let Some(new_name) = new_name {
        updated.name = new_name;
    }
    if let Some(address) = address {
        updated.address = address;
    }
    fields.apply(&mut updated);
    let updated_name = updated.name.clone();

    list.commit_edit(ticket, updated)
        .map_err(|e| CliError::Config(format!("Failed to update connection: {e}")))?;

    println!("Updated connection '{updated_name}'");
    Ok(())
}

/// Remove connection command handler
fn cmd_remove(config: &ConfigManager, name: &str) -> Result<(), CliError> {
    let settings = load_settings(config)?;
    let mut list = open_list(config, &settings)?;

    let connection = find_connection(list.connections(), name)?.clone();
    let removed = list
        .remove_connection(&connection.identity())
        .map_err(|e| CliError::Config(format!("Failed to save connections: {e}")))?;
    if !removed {
        return Err(CliError::ConnectionNotFound(name.to_string()));
    }

    println!("Removed connection '{}'", connection.name);
    Ok(())
}

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Success - operation completed successfully
    pub const SUCCESS: i32 = 0;
    /// General error - configuration, validation, or other non-connection errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - connection not found or ssh reported failure
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection not found
    #[error("Connection not found: {0}")]
    ConnectionNotFound(String),

    /// Connection could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// History or favorites could not be saved
    #[error("Storage error: {0}")]
    Store(String),

    /// Docker command failed
    #[error("Docker error: {0}")]
    Docker(String),

    /// Terminal could not be driven
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// Logging could not be set up
    #[error("Logging error: {0}")]
    Logging(String),
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, storage, docker, terminal)
    /// - 2: Connection failure (connection not found or failed)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed(_) | Self::ConnectionNotFound(_) => {
                exit_codes::CONNECTION_FAILURE
            }
            Self::Config(_)
            | Self::Store(_)
            | Self::Docker(_)
            | Self::Terminal(_)
            | Self::Logging(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
