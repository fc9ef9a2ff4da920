use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::AppError;

/// Closed set of ingredient categories. Stored as text in the database;
/// parsed at the API boundary so an unrecognized value fails early.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Vegetables,
    Fruits,
    MeatPoultry,
    Seafood,
    Dairy,
    GrainsCereals,
    Legumes,
    HerbsSpices,
    OilsFats,
    Condiments,
    Beverages,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Vegetables,
        Category::Fruits,
        Category::MeatPoultry,
        Category::Seafood,
        Category::Dairy,
        Category::GrainsCereals,
        Category::Legumes,
        Category::HerbsSpices,
        Category::OilsFats,
        Category::Condiments,
        Category::Beverages,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Vegetables => "vegetables",
            Category::Fruits => "fruits",
            Category::MeatPoultry => "meat_poultry",
            Category::Seafood => "seafood",
            Category::Dairy => "dairy",
            Category::GrainsCereals => "grains_cereals",
            Category::Legumes => "legumes",
            Category::HerbsSpices => "herbs_spices",
            Category::OilsFats => "oils_fats",
            Category::Condiments => "condiments",
            Category::Beverages => "beverages",
            Category::Other => "other",
        }
    }

    /// All category names, sorted, as returned by the categories endpoint.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = Self::ALL.iter().map(Category::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn parse(value: &str) -> Result<Category, AppError> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == value)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Invalid category. Must be one of: {}",
                    Self::names().join(", ")
                ))
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_category() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()).unwrap(), category);
        }
    }

    #[test]
    fn rejects_unknown_category() {
        let err = Category::parse("sweets").unwrap_err();
        assert!(err.to_string().contains("Invalid category"));
    }

    #[test]
    fn default_is_other() {
        assert_eq!(Category::default(), Category::Other);
    }

    #[test]
    fn names_are_sorted_and_complete() {
        let names = Category::names();
        assert_eq!(names.len(), 12);
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        assert!(names.contains(&"meat_poultry"));
        assert!(names.contains(&"other"));
    }
}
