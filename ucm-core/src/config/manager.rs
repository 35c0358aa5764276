//! Configuration manager for connection and settings files
//!
//! This module provides the `ConfigManager` which handles loading and
//! validating the YAML connections file, the first-run sample, and the TOML
//! application settings.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult, ValidationError};
use crate::models::{Connection, Identity};
use crate::store::write_atomic;

use super::settings::AppSettings;

/// File names for configuration files
const CONNECTIONS_FILE: &str = "ssh_connections.yml";
const HISTORY_FILE: &str = "history.yml";
const FAVORITES_FILE: &str = "favorites.yml";
const CONFIG_FILE: &str = "config.toml";

/// Default configuration directory under the home directory
const DEFAULT_DIR_NAME: &str = ".ucm";

const REQUIRED_FIELDS: [&str; 2] = ["name", "address"];
const OPTIONAL_FIELDS: [&str; 6] = [
    "user",
    "port",
    "identity",
    "identity_file",
    "options",
    "category",
];

/// Result of loading the connections file
///
/// Invalid records are excluded from `connections` but every one of them
/// contributes exactly one entry to `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Usable connections, in file order
    pub connections: Vec<Connection>,
    /// One error per invalid record
    pub errors: Vec<ValidationError>,
}

impl LoadReport {
    /// Returns true if every record was valid
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Configuration manager for UCM
///
/// Configuration is stored in `~/.ucm/` by default.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    /// Base directory for configuration files
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a new `ConfigManager` with the default configuration directory
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> ConfigResult<Self> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| ConfigError::NotFound(PathBuf::from("~")))?
            .join(DEFAULT_DIR_NAME);
        Ok(Self { config_dir })
    }

    /// Creates a new `ConfigManager` with a custom configuration directory
    #[must_use]
    pub const fn with_config_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Creates a manager from a user-supplied directory, expanding `~`
    #[must_use]
    pub fn from_user_path(dir: &str) -> Self {
        Self::with_config_dir(PathBuf::from(shellexpand::tilde(dir).into_owned()))
    }

    /// Returns the configuration directory path
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Returns the path of the connections file
    #[must_use]
    pub fn connections_path(&self) -> PathBuf {
        self.config_dir.join(CONNECTIONS_FILE)
    }

    /// Returns the path of the history file
    #[must_use]
    pub fn history_path(&self) -> PathBuf {
        self.config_dir.join(HISTORY_FILE)
    }

    /// Returns the path of the favorites file
    #[must_use]
    pub fn favorites_path(&self) -> PathBuf {
        self.config_dir.join(FAVORITES_FILE)
    }

    /// Returns the path of the settings file
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Ensures the configuration directory exists
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_config_dir(&self) -> ConfigResult<()> {
        if !self.config_dir.exists() {
            fs::create_dir_all(&self.config_dir).map_err(|e| {
                ConfigError::Write(format!(
                    "Failed to create config directory {}: {}",
                    self.config_dir.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    // ========== Connections ==========

    /// Loads and validates the connections file
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceUnreadable`] if the file is missing,
    /// cannot be read, is not valid YAML, or is not a sequence. Invalid
    /// records never produce an error here; they are reported in the
    /// returned [`LoadReport`].
    pub fn load_connections(&self) -> ConfigResult<LoadReport> {
        let path = self.connections_path();
        let content = fs::read_to_string(&path).map_err(|e| ConfigError::SourceUnreadable {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Self::parse_connections(&content, &path)
    }

    /// Parses and validates connection records from YAML text
    ///
    /// Every record is checked; all problems of one record are collected
    /// into a single [`ValidationError`] tagged with its 1-based position.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceUnreadable`] if the text is not YAML or
    /// its top level is neither empty nor a sequence.
    pub fn parse_connections(content: &str, source: &Path) -> ConfigResult<LoadReport> {
        let records = raw_records(content, source)?;

        let mut report = LoadReport::default();
        let mut seen_names: HashMap<String, usize> = HashMap::new();

        for (i, record) in records.iter().enumerate() {
            let index = i + 1;
            match validate_record(index, record, &mut seen_names) {
                Ok(connection) => report.connections.push(connection),
                Err(error) => report.errors.push(error),
            }
        }

        debug!(
            source = %source.display(),
            usable = report.connections.len(),
            invalid = report.errors.len(),
            "Parsed connections"
        );
        Ok(report)
    }

    /// Saves connections to the connections file, replacing every record
    ///
    /// The file is replaced atomically; comments in a hand-written file are
    /// not preserved. Use the record edits below to change one connection
    /// without dropping records that failed validation.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be serialized or written.
    pub fn save_connections(&self, connections: &[Connection]) -> ConfigResult<()> {
        self.ensure_config_dir()?;
        let content = serde_yaml::to_string(connections)
            .map_err(|e| ConfigError::Serialize(format!("Failed to serialize: {e}")))?;
        write_atomic(&self.connections_path(), &content)
            .map_err(|e| ConfigError::Write(e.to_string()))
    }

    // ========== Record Edits ==========

    /// Appends one connection record to the connections file
    ///
    /// Existing records are kept as they are on disk, including records
    /// that failed validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SourceUnreadable`] if the file exists but is
    /// not a YAML list, or an error if it cannot be written.
    pub fn append_connection(&self, connection: &Connection) -> ConfigResult<()> {
        self.edit_records(|records| {
            records.push(to_record(connection, None)?);
            Ok(())
        })
    }

    /// Replaces the record of `original` with `updated`
    ///
    /// Fields the application does not know are carried over from the old
    /// record. Every other record is kept as it is on disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable, no valid record has the
    /// original identity, or the file cannot be written.
    pub fn replace_connection(
        &self,
        original: &Identity,
        updated: &Connection,
    ) -> ConfigResult<()> {
        let path = self.connections_path();
        self.edit_records(|records| {
            let position =
                find_record(records, original).ok_or_else(|| missing_record(original, &path))?;
            let record = to_record(updated, records.get(position))?;
            records[position] = record;
            Ok(())
        })
    }

    /// Removes the record of `identity`, keeping every other record
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable, no valid record has the
    /// identity, or the file cannot be written.
    pub fn remove_connection(&self, identity: &Identity) -> ConfigResult<()> {
        let path = self.connections_path();
        self.edit_records(|records| {
            let position =
                find_record(records, identity).ok_or_else(|| missing_record(identity, &path))?;
            records.remove(position);
            Ok(())
        })
    }

    /// Re-reads the raw record list, applies `edit` and writes it back
    ///
    /// A missing file starts an empty list. A file that exists but cannot be
    /// parsed is never overwritten.
    fn edit_records<F>(&self, edit: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Vec<Value>) -> ConfigResult<()>,
    {
        self.ensure_config_dir()?;
        let path = self.connections_path();
        let mut records = match fs::read_to_string(&path) {
            Ok(content) => raw_records(&content, &path)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                return Err(ConfigError::SourceUnreadable {
                    path,
                    reason: e.to_string(),
                })
            }
        };

        edit(&mut records)?;

        let content = serde_yaml::to_string(&Value::Sequence(records))
            .map_err(|e| ConfigError::Serialize(format!("Failed to serialize: {e}")))?;
        write_atomic(&path, &content).map_err(|e| ConfigError::Write(e.to_string()))?;
        debug!(path = %path.display(), "Connections file updated");
        Ok(())
    }

    /// Writes a sample connections file if none exists
    ///
    /// Returns true if the sample was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn ensure_sample_connections(&self) -> ConfigResult<bool> {
        let path = self.connections_path();
        if path.exists() {
            return Ok(false);
        }

        self.ensure_config_dir()?;
        write_atomic(&path, &sample_connections(&whoami::username()))
            .map_err(|e| ConfigError::Write(e.to_string()))?;
        info!(path = %path.display(), "Created sample connections file");
        Ok(true)
    }

    // ========== Application Settings ==========

    /// Loads application settings from the configuration file
    ///
    /// Returns default settings if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_settings(&self) -> ConfigResult<AppSettings> {
        let path = self.settings_path();
        if !path.exists() {
            return Ok(AppSettings::default());
        }
        Self::load_toml_file(&path)
    }

    /// Saves application settings to the configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_settings(&self, settings: &AppSettings) -> ConfigResult<()> {
        self.ensure_config_dir()?;
        Self::save_toml_file(&self.settings_path(), settings)
    }

    // ========== Generic TOML Operations ==========

    fn load_toml_file<T>(path: &Path) -> ConfigResult<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::Deserialize(format!("Failed to read {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            ConfigError::Deserialize(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn save_toml_file<T>(path: &Path, data: &T) -> ConfigResult<()>
    where
        T: serde::Serialize,
    {
        let content = toml::to_string_pretty(data)
            .map_err(|e| ConfigError::Serialize(format!("Failed to serialize: {e}")))?;

        write_atomic(path, &content).map_err(|e| ConfigError::Write(e.to_string()))
    }

    // ========== Validation ==========

    /// Validates a single typed connection before it is added or saved
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError::Validation`] naming the first invalid field.
    pub fn validate_connection(connection: &Connection) -> ConfigResult<()> {
        if connection.name.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "name".to_string(),
                reason: "Connection name cannot be empty".to_string(),
            });
        }

        if connection.address.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "address".to_string(),
                reason: "Connection address cannot be empty".to_string(),
            });
        }

        if connection.port == Some(0) {
            return Err(ConfigError::Validation {
                field: "port".to_string(),
                reason: "Port must be between 1 and 65535".to_string(),
            });
        }

        if let Some(options) = &connection.options {
            shell_words::split(options).map_err(|e| ConfigError::Validation {
                field: "options".to_string(),
                reason: format!("Options cannot be parsed: {e}"),
            })?;
        }

        Ok(())
    }
}

/// Splits YAML text into its raw records
///
/// Empty text and an explicit null are an empty list; any other non-list
/// document is unreadable.
fn raw_records(content: &str, source: &Path) -> ConfigResult<Vec<Value>> {
    let unreadable = |reason: String| ConfigError::SourceUnreadable {
        path: source.to_path_buf(),
        reason,
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    match serde_yaml::from_str::<Value>(content).map_err(|e| unreadable(e.to_string()))? {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(records) => Ok(records),
        other => Err(unreadable(format!(
            "connections must be a list, got {}",
            value_kind(&other)
        ))),
    }
}

/// Finds the first record that is valid on its own and has `identity`
///
/// This is the record the loader accepted, since duplicate names are only
/// claimed by otherwise valid records.
fn find_record(records: &[Value], identity: &Identity) -> Option<usize> {
    records.iter().enumerate().position(|(i, record)| {
        validate_record(i + 1, record, &mut HashMap::new())
            .is_ok_and(|connection| connection.identity() == *identity)
    })
}

fn missing_record(identity: &Identity, path: &Path) -> ConfigError {
    ConfigError::Validation {
        field: "name".to_string(),
        reason: format!(
            "Connection '{}' is no longer in {}",
            identity.name,
            path.display()
        ),
    }
}

/// Serializes a connection, keeping unknown fields of the record it replaces
fn to_record(connection: &Connection, previous: Option<&Value>) -> ConfigResult<Value> {
    let mut record = serde_yaml::to_value(connection)
        .map_err(|e| ConfigError::Serialize(format!("Failed to serialize: {e}")))?;

    if let (Value::Mapping(fresh), Some(Value::Mapping(old))) = (&mut record, previous) {
        for (key, value) in old {
            let known = key
                .as_str()
                .is_some_and(|k| REQUIRED_FIELDS.contains(&k) || OPTIONAL_FIELDS.contains(&k));
            if !known {
                fresh.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(record)
}

/// Checks one raw record and converts it into a connection
fn validate_record(
    index: usize,
    record: &Value,
    seen_names: &mut HashMap<String, usize>,
) -> Result<Connection, ValidationError> {
    let Value::Mapping(map) = record else {
        return Err(ValidationError::new(
            index,
            None,
            vec![format!("record is not a mapping: {}", value_kind(record))],
        ));
    };

    let mut problems = Vec::new();

    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| field_value(map, field).is_none())
        .collect();
    if !missing.is_empty() {
        problems.push(format!("missing required field(s): {}", missing.join(", ")));
    }

    let name = required_string(map, "name", &mut problems);
    let address = required_string(map, "address", &mut problems);

    let port = match field_value(map, "port") {
        None => None,
        Some(value) => match parse_port(value) {
            Ok(port) => Some(port),
            Err(problem) => {
                problems.push(problem);
                None
            }
        },
    };

    let user = optional_string(map, "user", &mut problems);
    let identity_file = optional_string(map, "identity_file", &mut problems)
        .or_else(|| optional_string(map, "identity", &mut problems));
    let options = optional_string(map, "options", &mut problems);
    let category = optional_string(map, "category", &mut problems);

    // Only records that are otherwise usable claim their name
    if problems.is_empty() {
        if let Some(name) = &name {
            if let Some(first) = seen_names.get(name) {
                problems.push(format!(
                    "duplicate name '{name}' (first defined in connection #{first})"
                ));
            } else {
                seen_names.insert(name.clone(), index);
            }
        }
    }

    let unknown: Vec<String> = map
        .keys()
        .filter_map(Value::as_str)
        .filter(|key| !REQUIRED_FIELDS.contains(key) && !OPTIONAL_FIELDS.contains(key))
        .map(str::to_string)
        .collect();
    if !unknown.is_empty() {
        warn!(
            index,
            name = name.as_deref().unwrap_or("unnamed"),
            fields = %unknown.join(", "),
            "Unknown connection field(s) will be ignored"
        );
    }

    match (name, address) {
        (Some(name), Some(address)) if problems.is_empty() => Ok(Connection {
            name,
            address,
            user,
            port,
            identity_file,
            options,
            category,
        }),
        (name, _) => Err(ValidationError::new(index, name, problems)),
    }
}

/// Returns a field's value, treating an explicit null as absent
fn field_value<'a>(map: &'a Mapping, field: &str) -> Option<&'a Value> {
    map.get(field).filter(|v| !v.is_null())
}

/// Reads a required string field, recording type and emptiness problems
///
/// Absence is reported separately by the caller.
fn required_string(map: &Mapping, field: &str, problems: &mut Vec<String>) -> Option<String> {
    let value = field_value(map, field)?;
    match scalar_string(value) {
        Some(s) if s.trim().is_empty() => {
            problems.push(format!("'{field}' field cannot be empty"));
            None
        }
        Some(s) => Some(s),
        None => {
            problems.push(format!(
                "'{field}' must be a string, got {}",
                value_kind(value)
            ));
            None
        }
    }
}

fn optional_string(map: &Mapping, field: &str, problems: &mut Vec<String>) -> Option<String> {
    let value = field_value(map, field)?;
    let converted = scalar_string(value);
    if converted.is_none() {
        problems.push(format!(
            "'{field}' must be a string, got {}",
            value_kind(value)
        ));
    }
    converted
}

/// Converts scalar YAML values to text; `user: 1000` is a valid user
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parses a port given as an integer or a numeric string
fn parse_port(value: &Value) -> Result<u16, String> {
    let out_of_range = |raw: &dyn std::fmt::Display| {
        format!("'port' must be between 1 and 65535, got {raw}")
    };

    match value {
        Value::Number(n) => match n.as_i64() {
            Some(p) => u16::try_from(p)
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| out_of_range(&p)),
            None => Err(format!("'port' must be a number, got '{n}'")),
        },
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(p) => u16::try_from(p)
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| out_of_range(s)),
            Err(_) => Err(format!("'port' must be a number, got '{s}'")),
        },
        other => Err(format!(
            "'port' must be a number or string, got {}",
            value_kind(other)
        )),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}

fn sample_connections(user: &str) -> String {
    format!(
        "# UCM SSH connections\n\
         #\n\
         # Each entry needs a unique `name` and an `address`. Optional fields:\n\
         #   user, port, identity_file, options, category\n\
         #\n\
         # - name: web-prod\n\
         #   address: 203.0.113.10\n\
         #   user: deploy\n\
         #   port: 2222\n\
         #   identity_file: ~/.ssh/id_ed25519\n\
         #   options: -o ServerAliveInterval=30\n\
         #   category: production\n\
         \n\
         - name: localhost\n  \
           address: 127.0.0.1\n  \
           user: {user}\n  \
           category: local\n"
    )
}
