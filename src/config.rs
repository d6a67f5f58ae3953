//! Dashboard configuration
//!
//! The category template defines which activity categories exist, in which
//! order they are displayed, and their colors. It is built once at startup and
//! passed explicitly to every stage of the pipeline.

use crate::error::ComputeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default tolerance (hours) before a day's total is reconciled to 24h
pub const DEFAULT_RECONCILIATION_TOLERANCE_HOURS: f64 = 0.1;

/// Recommended nightly sleep used for goal progress
pub const DEFAULT_OPTIMAL_SLEEP_HOURS: f64 = 8.0;

/// Recommended daily outdoor time used for goal progress
pub const DEFAULT_OPTIMAL_OUTDOOR_MINUTES: f64 = 120.0;

/// A single activity category with its display color
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub color: String,
}

impl Category {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}

/// Position of a category inside its template.
///
/// Only obtainable by resolving a name against a [`CategoryTemplate`], so an
/// id always refers to a known category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CategoryId(usize);

impl CategoryId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered set of categories.
///
/// Every aggregate iterates categories in template order so results are
/// comparable across days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Category>", into = "Vec<Category>")]
pub struct CategoryTemplate {
    categories: Vec<Category>,
}

impl CategoryTemplate {
    /// Build a template, rejecting empty lists and duplicate names
    pub fn new(categories: Vec<Category>) -> Result<Self, ComputeError> {
        if categories.is_empty() {
            return Err(ComputeError::InvalidTemplate(
                "template must contain at least one category".to_string(),
            ));
        }

        for (i, category) in categories.iter().enumerate() {
            if category.name.trim().is_empty() {
                return Err(ComputeError::InvalidTemplate(format!(
                    "category at position {i} has an empty name"
                )));
            }
            if categories[..i].iter().any(|c| c.name == category.name) {
                return Err(ComputeError::InvalidTemplate(format!(
                    "duplicate category '{}'",
                    category.name
                )));
            }
        }

        Ok(Self { categories })
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Iterate categories in display order
    pub fn iter(&self) -> impl Iterator<Item = (CategoryId, &Category)> + '_ {
        self.categories
            .iter()
            .enumerate()
            .map(|(i, c)| (CategoryId(i), c))
    }

    /// All category ids in display order
    pub fn ids(&self) -> impl Iterator<Item = CategoryId> {
        (0..self.categories.len()).map(CategoryId)
    }

    /// `None` when `id` was resolved against a larger template
    pub fn get(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(id.0)
    }

    pub fn name(&self, id: CategoryId) -> Option<&str> {
        self.get(id).map(|c| c.name.as_str())
    }

    pub fn color(&self, id: CategoryId) -> Option<&str> {
        self.get(id).map(|c| c.color.as_str())
    }

    pub fn find(&self, name: &str) -> Option<CategoryId> {
        self.categories
            .iter()
            .position(|c| c.name == name)
            .map(CategoryId)
    }

    /// Resolve a category name, failing fast on names outside the template
    pub fn resolve(&self, name: &str) -> Result<CategoryId, ComputeError> {
        self.find(name)
            .ok_or_else(|| ComputeError::UnknownCategory(name.to_string()))
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }
}

impl Default for CategoryTemplate {
    fn default() -> Self {
        Self {
            categories: vec![
                Category::new("sleep", "#8884d8"),
                Category::new("work", "#4CAF50"),
                Category::new("leisure", "#a4de6c"),
                Category::new("coding", "#ffc658"),
                Category::new("networking", "#ff8042"),
                Category::new("exercise", "#E91E63"),
                Category::new("outdoor", "#03A9F4"),
            ],
        }
    }
}

impl TryFrom<Vec<Category>> for CategoryTemplate {
    type Error = ComputeError;

    fn try_from(categories: Vec<Category>) -> Result<Self, Self::Error> {
        Self::new(categories)
    }
}

impl From<CategoryTemplate> for Vec<Category> {
    fn from(template: CategoryTemplate) -> Self {
        template.categories
    }
}

/// Names of the categories with a dedicated role in the statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryRoles {
    /// Category summed into `sleep_hours`
    pub sleep: String,
    /// Category summed into `outdoor_minutes`
    pub outdoor: String,
    /// Category that absorbs a day's shortfall during reconciliation
    pub leisure: String,
}

impl Default for CategoryRoles {
    fn default() -> Self {
        Self {
            sleep: "sleep".to_string(),
            outdoor: "outdoor".to_string(),
            leisure: "leisure".to_string(),
        }
    }
}

/// Role names resolved against a template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRoles {
    pub sleep: CategoryId,
    pub outdoor: CategoryId,
    pub leisure: CategoryId,
}

/// Daily targets used for goal progress on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goals {
    pub optimal_sleep_hours: f64,
    pub optimal_outdoor_minutes: f64,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            optimal_sleep_hours: DEFAULT_OPTIMAL_SLEEP_HOURS,
            optimal_outdoor_minutes: DEFAULT_OPTIMAL_OUTDOOR_MINUTES,
        }
    }
}

/// Process-wide configuration, read-only once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub categories: CategoryTemplate,
    pub roles: CategoryRoles,
    pub goals: Goals,
    pub reconciliation_tolerance_hours: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            categories: CategoryTemplate::default(),
            roles: CategoryRoles::default(),
            goals: Goals::default(),
            reconciliation_tolerance_hours: DEFAULT_RECONCILIATION_TOLERANCE_HOURS,
        }
    }
}

impl DashboardConfig {
    /// Config with a custom template and default roles/goals
    pub fn with_template(categories: CategoryTemplate) -> Self {
        Self {
            categories,
            ..Self::default()
        }
    }

    /// Load and validate a config from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check that roles resolve and numeric settings are usable
    pub fn validate(&self) -> Result<(), ComputeError> {
        self.resolve_roles()?;

        if !self.reconciliation_tolerance_hours.is_finite()
            || self.reconciliation_tolerance_hours < 0.0
        {
            return Err(ComputeError::InvalidTemplate(format!(
                "reconciliation tolerance must be a non-negative number, got {}",
                self.reconciliation_tolerance_hours
            )));
        }

        if self.goals.optimal_sleep_hours <= 0.0 || self.goals.optimal_outdoor_minutes <= 0.0 {
            return Err(ComputeError::InvalidTemplate(
                "goals must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve the sleep/outdoor/leisure role names against the template
    pub fn resolve_roles(&self) -> Result<ResolvedRoles, ComputeError> {
        let resolve = |role: &str, name: &str| {
            self.categories.find(name).ok_or_else(|| {
                ComputeError::InvalidTemplate(format!(
                    "{role} role refers to '{name}', which is not in the template"
                ))
            })
        };

        Ok(ResolvedRoles {
            sleep: resolve("sleep", &self.roles.sleep)?,
            outdoor: resolve("outdoor", &self.roles.outdoor)?,
            leisure: resolve("leisure", &self.roles.leisure)?,
        })
    }
}
