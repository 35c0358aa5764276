//! Docker container model.

use serde::{Deserialize, Serialize};

/// A container as listed by `docker ps`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    /// Short container ID
    pub id: String,
    /// Container name
    pub name: String,
    /// Image the container runs
    pub image: String,
    /// Human-readable status (e.g., "Up 3 hours", "Exited (0) 2 days ago")
    #[serde(default)]
    pub status: String,
}

impl Container {
    /// Creates a new container record
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        image: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image: image.into(),
            status: status.into(),
        }
    }

    /// Returns true if docker reports the container as running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status.starts_with("Up")
    }
}
