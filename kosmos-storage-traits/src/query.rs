//! Query specification and result types for [`crate::WorldModelStore::query`]
//! and [`crate::WorldModelStore::get_statistics`].

use std::collections::HashMap;

use kosmos_core::EntityType;
use serde::{Deserialize, Serialize};

/// Backend-specific query body. The simple graph backend accepts a
/// WHERE-clause fragment; a production backend could accept a
/// higher-level intent description instead (spec §4.3).
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    /// Raw backend-specific filter fragment, e.g. a WHERE clause.
    pub filter: Option<String>,
}

impl QuerySpec {
    #[must_use]
    pub fn raw(filter: impl Into<String>) -> Self {
        Self {
            filter: Some(filter.into()),
        }
    }

    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }
}

/// Cross-cutting filters applied on top of a [`QuerySpec`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub project: Option<String>,
    pub entity_type: Option<EntityType>,
    pub limit: Option<usize>,
}

impl QueryOptions {
    #[must_use]
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    #[must_use]
    pub fn with_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Counts by type, relationship counts, and the set of known projects
/// (spec §4.2 `getStatistics`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statistics {
    pub entity_counts: HashMap<String, usize>,
    pub relationship_counts: HashMap<String, usize>,
    pub projects: Vec<String>,
}

impl Statistics {
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entity_counts.values().sum()
    }

    #[must_use]
    pub fn relationship_count(&self) -> usize {
        self.relationship_counts.values().sum()
    }
}

/// Export document format (spec §4.9 only defines JSON today).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
}

/// Import semantics: upsert vs. reset-then-load (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Merge,
    Replace,
}
