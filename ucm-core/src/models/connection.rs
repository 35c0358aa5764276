//! Connection model representing one configured SSH target.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The `(name, address)` pair correlating a connection with its history and
/// favorite records
///
/// Identity is captured when the configuration is loaded or when an edit
/// starts, so a rename made through the edit path can be traced back to the
/// old records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity {
    /// Connection name
    pub name: String,
    /// Connection address
    pub address: String,
}

impl Identity {
    /// Creates a new identity
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Parses the legacy `name:address` form used by older favorites files
    ///
    /// The split happens at the first colon, so names must not contain one.
    #[must_use]
    pub fn parse_legacy(value: &str) -> Option<Self> {
        let (name, address) = value.split_once(':')?;
        if name.is_empty() || address.is_empty() {
            return None;
        }
        Some(Self::new(name, address))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.address)
    }
}

/// A configured SSH connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Human-readable name, unique within one loaded configuration
    pub name: String,
    /// Host name or IP address to connect to
    pub address: String,
    /// Username for authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Remote port (1-65535)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Private key passed to `ssh -i`
    #[serde(default, alias = "identity", skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
    /// Extra ssh command-line options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    /// Free-form category used for grouping and filtering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Connection {
    /// Creates a new connection with only the required fields set
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            user: None,
            port: None,
            identity_file: None,
            options: None,
            category: None,
        }
    }

    /// Sets the username for this connection
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Sets the port for this connection
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the identity file for this connection
    #[must_use]
    pub fn with_identity_file(mut self, path: impl Into<String>) -> Self {
        self.identity_file = Some(path.into());
        self
    }

    /// Sets extra ssh options for this connection
    #[must_use]
    pub fn with_options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }

    /// Sets the category for this connection
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Returns the identity used to link history and favorites
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(self.name.clone(), self.address.clone())
    }

    /// Returns `user@address`, or just the address when no user is set
    #[must_use]
    pub fn destination(&self) -> String {
        self.user.as_ref().map_or_else(
            || self.address.clone(),
            |user| format!("{user}@{}", self.address),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_destination_with_and_without_user() {
        let conn = Connection::new("web", "10.0.0.1");
        assert_eq!(conn.destination(), "10.0.0.1");

        let conn = conn.with_user("deploy");
        assert_eq!(conn.destination(), "deploy@10.0.0.1");
    }

    #[test]
    fn test_identity_display_and_legacy_parse() {
        let id = Identity::new("web", "10.0.0.1");
        assert_eq!(id.to_string(), "web:10.0.0.1");
        assert_eq!(Identity::parse_legacy("web:10.0.0.1"), Some(id));
        assert_eq!(Identity::parse_legacy("no-colon"), None);
        assert_eq!(Identity::parse_legacy(":10.0.0.1"), None);
    }

    #[test]
    fn test_identity_alias_deserializes() {
        let conn: Connection =
            serde_yaml::from_str("name: a\naddress: b\nidentity: ~/.ssh/key.pem\n").unwrap();
        assert_eq!(conn.identity_file.as_deref(), Some("~/.ssh/key.pem"));
    }

    #[test]
    fn test_serialize_skips_unset_fields() {
        let yaml = serde_yaml::to_string(&Connection::new("a", "b")).unwrap();
        assert!(!yaml.contains("user"));
        assert!(!yaml.contains("port"));
    }
}
