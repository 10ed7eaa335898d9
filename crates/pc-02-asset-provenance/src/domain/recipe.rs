//! Ingredient multiset matching.
//!
//! A production run is valid when the names of the consumed assets, counted
//! as a multiset, equal the recipe's `(ingredient, quantity)` pairs exactly.
//! Order of the consumed assets is irrelevant.

use shared_types::Recipe;
use std::collections::BTreeMap;
use std::fmt;

/// Count of consumed assets per asset name.
pub type Tally = BTreeMap<String, u32>;

pub fn tally<'a>(names: impl IntoIterator<Item = &'a str>) -> Tally {
    let mut counts = Tally::new();
    for name in names {
        *counts.entry(name.to_string()).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeMismatch {
    /// Different number of distinct ingredient names.
    IngredientCount { expected: usize, found: usize },
    /// A consumed name is missing from the recipe or has the wrong count.
    Unmatched { name: String, count: u32 },
}

impl fmt::Display for RecipeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IngredientCount { expected, found } => write!(
                f,
                "Number of ingredients does not match recipe: expected {expected}, found {found}"
            ),
            Self::Unmatched { name, count } => write!(
                f,
                "The number of correct ingredients is not provided: {count} x {name}"
            ),
        }
    }
}

/// Checks a tally against a recipe.
pub fn match_recipe(recipe: &Recipe, consumed: &Tally) -> Result<(), RecipeMismatch> {
    let required: BTreeMap<&str, u32> = recipe
        .ingredients
        .iter()
        .map(String::as_str)
        .zip(recipe.quantities.iter().copied())
        .collect();

    if consumed.len() != required.len() || required.len() != recipe.quantities.len() {
        return Err(RecipeMismatch::IngredientCount {
            expected: recipe.ingredients.len(),
            found: consumed.len(),
        });
    }

    for (name, count) in consumed {
        if required.get(name.as_str()) != Some(count) {
            return Err(RecipeMismatch::Unmatched {
                name: name.clone(),
                count: *count,
            });
        }
    }
    Ok(())
}
