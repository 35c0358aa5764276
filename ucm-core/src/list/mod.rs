//! SSH connection list
//!
//! [`ConnectionListController`] joins the loaded connections with their
//! history entries and favorite flags into [`Row`]s, applies the filter
//! buffer, the favorites-only predicate and the sort policy, and owns the
//! tracked add/edit/remove path. Rows are cached and rebuilt lazily on the
//! next read after anything they depend on changes.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{ConfigManager, LoadReport};
use crate::error::{
    ConfigError, ConfigResult, ExecResult, PersistenceWarning, StoreResult, ValidationError,
};
use crate::execute::{ssh_command, ExitStatus, Executor, Launcher};
use crate::filter::{Matcher, SearchField, Searchable, CONNECTION_FIELDS};
use crate::models::{Connection, HistoryEntry, HistoryStats, Identity};
use crate::store::{FavoriteStore, HistoryStore};

/// Row ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortPolicy {
    /// Configuration file order
    #[default]
    Insertion,
    /// Most recently used first; never-used rows keep file order at the end
    Recent,
}

/// A connection joined with its usage history and favorite flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Position in the configuration file
    pub index: usize,
    /// The connection
    pub connection: Connection,
    /// Usage history, if the connection was ever used
    pub history: Option<HistoryEntry>,
    /// Whether the connection is a favorite
    pub favorite: bool,
}

impl Row {
    /// Returns the row's identity
    #[must_use]
    pub fn identity(&self) -> Identity {
        self.connection.identity()
    }

    /// Returns when the connection was last used
    #[must_use]
    pub fn last_used(&self) -> Option<DateTime<Utc>> {
        self.history.as_ref().map(|h| h.last_used)
    }

    /// Returns how often the connection was used
    #[must_use]
    pub fn use_count(&self) -> u32 {
        self.history.as_ref().map_or(0, |h| h.use_count)
    }
}

impl Searchable for Row {
    fn field(&self, field: SearchField) -> Option<&str> {
        self.connection.field(field)
    }
}

/// Captured identity of a connection being edited
///
/// The identity is taken when the edit starts so history and favorites can
/// follow a rename when the edit is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTicket {
    original: Identity,
    draft: Connection,
}

impl EditTicket {
    /// Returns the identity the connection had when the edit started
    #[must_use]
    pub fn original(&self) -> &Identity {
        &self.original
    }

    /// Returns the connection as it was when the edit started
    #[must_use]
    pub fn draft(&self) -> &Connection {
        &self.draft
    }
}

/// Everything that went wrong while opening the list, none of it fatal
#[derive(Debug, Default)]
pub struct OpenReport {
    /// The connections file could not be read at all
    pub source_error: Option<ConfigError>,
    /// Invalid connection records
    pub validation_errors: Vec<ValidationError>,
    /// History or favorites problems
    pub warnings: Vec<PersistenceWarning>,
}

impl OpenReport {
    /// Returns a user-facing message for blocking problems, if any
    #[must_use]
    pub fn blocking_message(&self) -> Option<String> {
        if let Some(err) = &self.source_error {
            return Some(err.to_string());
        }
        if self.validation_errors.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .validation_errors
            .iter()
            .map(|e| format!("  - {e}"))
            .collect();
        Some(format!(
            "Connection configuration has {} error(s):\n{}",
            self.validation_errors.len(),
            lines.join("\n")
        ))
    }
}

/// Merges configuration, history and favorites into the SSH view rows
#[derive(Debug)]
pub struct ConnectionListController {
    config: Option<ConfigManager>,
    connections: Vec<Connection>,
    load_errors: Vec<ValidationError>,
    history: HistoryStore,
    favorites: FavoriteStore,
    sort: SortPolicy,
    favorites_only: bool,
    filter: String,
    fields: Vec<SearchField>,
    rows: Option<Vec<Row>>,
    rebuilds: u64,
}

impl ConnectionListController {
    /// Creates a controller over in-memory data
    #[must_use]
    pub fn new(
        connections: Vec<Connection>,
        history: HistoryStore,
        favorites: FavoriteStore,
    ) -> Self {
        Self {
            config: None,
            connections,
            load_errors: Vec::new(),
            history,
            favorites,
            sort: SortPolicy::default(),
            favorites_only: false,
            filter: String::new(),
            fields: CONNECTION_FIELDS.to_vec(),
            rows: None,
            rebuilds: 0,
        }
    }

    /// Opens the connections, history and favorites files
    ///
    /// Never fails: an unreadable connections file leaves the list empty and
    /// is reported in [`OpenReport::source_error`]; store problems start the
    /// store empty.
    #[must_use]
    pub fn open(config: ConfigManager, max_history: usize) -> (Self, OpenReport) {
        let mut report = OpenReport::default();

        let (history, warning) = HistoryStore::load(config.history_path(), max_history);
        report.warnings.extend(warning);
        let (favorites, warning) = FavoriteStore::load(config.favorites_path());
        report.warnings.extend(warning);

        for warning in &report.warnings {
            if warning.is_missing() {
                debug!(%warning, "Store not present");
            } else {
                warn!(%warning, "Store problem");
            }
        }

        let connections = match config.load_connections() {
            Ok(LoadReport { connections, errors }) => {
                for error in &errors {
                    warn!(%error, "Invalid connection record");
                }
                report.validation_errors = errors;
                connections
            }
            Err(e) => {
                warn!(error = %e, "Connections file unreadable, starting empty");
                report.source_error = Some(e);
                Vec::new()
            }
        };

        info!(
            connections = connections.len(),
            history = history.len(),
            favorites = favorites.len(),
            "Opened connection list"
        );

        let mut controller = Self::new(connections, history, favorites);
        controller.load_errors.clone_from(&report.validation_errors);
        controller.config = Some(config);
        (controller, report)
    }

    /// Re-reads the connections file, replacing the configuration generation
    ///
    /// History and favorites are kept. On error the current connections stay.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceUnreadable`] if the file cannot be read.
    pub fn reload(&mut self) -> ConfigResult<&[ValidationError]> {
        let Some(config) = &self.config else {
            return Ok(&self.load_errors);
        };
        let report = config.load_connections()?;
        info!(
            connections = report.connections.len(),
            invalid = report.errors.len(),
            "Reloaded connections"
        );
        self.connections = report.connections;
        self.load_errors = report.errors;
        self.invalidate();
        Ok(&self.load_errors)
    }

    fn invalidate(&mut self) {
        self.rows = None;
    }

    fn rebuild(&self) -> Vec<Row> {
        let matcher = Matcher::new(&self.filter);
        let mut rows: Vec<Row> = self
            .connections
            .iter()
            .enumerate()
            .filter(|(_, connection)| matcher.matches(*connection, &self.fields))
            .filter_map(|(index, connection)| {
                let identity = connection.identity();
                let favorite = self.favorites.is_favorite(&identity);
                if self.favorites_only && !favorite {
                    return None;
                }
                Some(Row {
                    index,
                    connection: connection.clone(),
                    history: self.history.get(&identity).cloned(),
                    favorite,
                })
            })
            .collect();

        if self.sort == SortPolicy::Recent {
            rows.sort_by(|a, b| b.last_used().cmp(&a.last_used()));
        }
        rows
    }

    // ========== Rows ==========

    /// Returns the visible rows, rebuilding them if anything changed
    pub fn rows(&mut self) -> &[Row] {
        if self.rows.is_none() {
            self.rows = Some(self.rebuild());
            self.rebuilds += 1;
            debug!(rebuilds = self.rebuilds, "Rebuilt connection rows");
        }
        self.rows.as_deref().unwrap_or_default()
    }

    /// Returns the visible row at `position`
    pub fn row(&mut self, position: usize) -> Option<&Row> {
        self.rows().get(position)
    }

    /// Returns the rows as of the last rebuild, without rebuilding
    #[must_use]
    pub fn peek_rows(&self) -> &[Row] {
        self.rows.as_deref().unwrap_or_default()
    }

    /// Returns how many times rows were rebuilt
    #[must_use]
    pub const fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Sets the filter buffer
    pub fn set_filter(&mut self, buffer: &str) {
        if self.filter != buffer {
            self.filter = buffer.to_string();
            self.invalidate();
        }
    }

    /// Returns the current filter buffer
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Sets the sort policy
    pub fn set_sort(&mut self, sort: SortPolicy) {
        if self.sort != sort {
            self.sort = sort;
            self.invalidate();
        }
    }

    /// Returns the sort policy
    #[must_use]
    pub const fn sort(&self) -> SortPolicy {
        self.sort
    }

    /// Switches between file order and most-recent-first
    pub fn toggle_sort_by_recent(&mut self) -> SortPolicy {
        let next = match self.sort {
            SortPolicy::Insertion => SortPolicy::Recent,
            SortPolicy::Recent => SortPolicy::Insertion,
        };
        self.set_sort(next);
        next
    }

    /// Shows only favorites, or everything
    pub fn set_favorites_only(&mut self, favorites_only: bool) {
        if self.favorites_only != favorites_only {
            self.favorites_only = favorites_only;
            self.invalidate();
        }
    }

    /// Flips the favorites-only predicate and returns the new value
    pub fn toggle_favorites_only(&mut self) -> bool {
        self.set_favorites_only(!self.favorites_only);
        self.favorites_only
    }

    /// Returns true if only favorites are shown
    #[must_use]
    pub const fn favorites_only(&self) -> bool {
        self.favorites_only
    }

    // ========== Favorites and History ==========

    /// Flips the favorite flag of an identity and saves the favorites
    ///
    /// The in-memory flag flips even when saving fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the favorites file cannot be written.
    pub fn toggle_favorite(&mut self, identity: &Identity) -> StoreResult<bool> {
        let favorite = self.favorites.toggle_favorite(identity);
        self.invalidate();
        info!(%identity, favorite, "Toggled favorite");
        self.favorites.save()?;
        Ok(favorite)
    }

    /// Records a successful use of a connection and saves the history
    ///
    /// # Errors
    ///
    /// Returns an error if the history file cannot be written.
    pub fn record_use(&mut self, connection: &Connection, at: DateTime<Utc>) -> StoreResult<()> {
        self.history.record_connection_use(connection, at);
        self.invalidate();
        self.history.save()
    }

    /// Empties the history and saves it
    ///
    /// # Errors
    ///
    /// Returns an error if the history file cannot be written.
    pub fn clear_history(&mut self) -> StoreResult<()> {
        self.history.clear();
        self.invalidate();
        self.history.save()
    }

    /// Returns the connection with the most recent use, if it still exists
    ///
    /// A history entry whose connection was renamed outside the edit path
    /// no longer matches anything and yields `None`.
    #[must_use]
    pub fn most_recent(&self) -> Option<&Connection> {
        let identity = self.history.most_recent()?;
        self.find(&identity)
    }

    /// Returns usage statistics
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        self.history.stats(self.favorites.len())
    }

    /// Returns the history store
    #[must_use]
    pub const fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Returns the favorites store
    #[must_use]
    pub const fn favorites(&self) -> &FavoriteStore {
        &self.favorites
    }

    // ========== Connect ==========

    /// Connects to a connection and records the use on success
    ///
    /// A failure to save the history after a successful connect is logged,
    /// not returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be built or started, or if
    /// ssh reports failure.
    pub fn connect<E: Executor + ?Sized>(
        &mut self,
        connection: &Connection,
        executor: &mut E,
        launcher: &Launcher,
        now: DateTime<Utc>,
    ) -> ExecResult<ExitStatus> {
        let spec = ssh_command(connection)?;
        let (spec, options) = launcher.prepare(&spec, &connection.name);
        info!(name = %connection.name, command = %spec, "Connecting");

        let status = executor.execute(&spec, &options)?;
        status.check(&spec.program)?;

        if let Err(e) = self.record_use(connection, now) {
            warn!(error = %e, "Failed to save history");
        }
        Ok(status)
    }

    // ========== Configuration Edits ==========

    /// Returns the loaded connections in file order
    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Returns the validation errors of the last load
    #[must_use]
    pub fn load_errors(&self) -> &[ValidationError] {
        &self.load_errors
    }

    /// Finds a connection by identity
    #[must_use]
    pub fn find(&self, identity: &Identity) -> Option<&Connection> {
        self.connections.iter().find(|c| c.identity() == *identity)
    }

    /// Finds a connection by name
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.name == name)
    }

    fn check_unique_name(&self, name: &str, except: Option<usize>) -> ConfigResult<()> {
        let clash = self
            .connections
            .iter()
            .enumerate()
            .any(|(i, c)| Some(i) != except && c.name == name);
        if clash {
            return Err(ConfigError::Validation {
                field: "name".to_string(),
                reason: format!("A connection named '{name}' already exists"),
            });
        }
        Ok(())
    }

    /// Adds a connection and saves the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the connection is invalid, its name is taken, or
    /// the configuration cannot be saved. Nothing changes on error.
    pub fn add_connection(&mut self, connection: Connection) -> ConfigResult<()> {
        ConfigManager::validate_connection(&connection)?;
        self.check_unique_name(&connection.name, None)?;

        if let Some(config) = &self.config {
            config.append_connection(&connection)?;
        }

        info!(name = %connection.name, "Added connection");
        self.connections.push(connection);
        self.invalidate();
        Ok(())
    }

    /// Starts editing a connection, capturing its current identity
    #[must_use]
    pub fn begin_edit(&self, identity: &Identity) -> Option<EditTicket> {
        self.find(identity).map(|connection| EditTicket {
            original: identity.clone(),
            draft: connection.clone(),
        })
    }

    /// Replaces the edited connection and migrates its history and favorite
    ///
    /// # Errors
    ///
    /// Returns an error if the updated connection is invalid, its new name is
    /// taken, the original no longer exists, or the configuration cannot be
    /// saved. Nothing changes on error.
    pub fn commit_edit(&mut self, ticket: EditTicket, updated: Connection) -> ConfigResult<()> {
        ConfigManager::validate_connection(&updated)?;

        let position = self
            .connections
            .iter()
            .position(|c| c.identity() == ticket.original)
            .ok_or_else(|| ConfigError::Validation {
                field: "name".to_string(),
                reason: format!("Connection '{}' no longer exists", ticket.original.name),
            })?;
        self.check_unique_name(&updated.name, Some(position))?;

        if let Some(config) = &self.config {
            config.replace_connection(&ticket.original, &updated)?;
        }

        let new_identity = updated.identity();
        self.connections[position] = updated;

        if new_identity != ticket.original {
            let moved_history = self.history.rename(&ticket.original, &new_identity);
            let moved_favorite = self.favorites.rename(&ticket.original, &new_identity);
            info!(
                from = %ticket.original,
                to = %new_identity,
                moved_history,
                moved_favorite,
                "Connection identity changed"
            );
            if moved_history {
                if let Err(e) = self.history.save() {
                    warn!(error = %e, "Failed to save history after rename");
                }
            }
            if moved_favorite {
                if let Err(e) = self.favorites.save() {
                    warn!(error = %e, "Failed to save favorites after rename");
                }
            }
        }

        self.invalidate();
        Ok(())
    }

    /// Removes a connection and saves the configuration
    ///
    /// History and favorite records are left in place. Returns false if
    /// nothing matched.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be saved.
    pub fn remove_connection(&mut self, identity: &Identity) -> ConfigResult<bool> {
        let Some(position) = self.connections.iter().position(|c| c.identity() == *identity)
        else {
            return Ok(false);
        };

        if let Some(config) = &self.config {
            config.remove_connection(identity)?;
        }

        info!(%identity, "Removed connection");
        self.connections.remove(position);
        self.invalidate();
        Ok(true)
    }
}
