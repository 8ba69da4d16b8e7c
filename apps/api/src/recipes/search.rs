//! Local recipe search over stored recipes. Keywords are stored as one
//! comma-separated string and split here at query time.

use crate::models::recipe::RecipeDetail;
use crate::recipes::normalize::split_keywords;

const TITLE_WEIGHT: u32 = 3;
const KEYWORD_WEIGHT: u32 = 2;
const DETAIL_WEIGHT: u32 = 1;

fn query_terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

fn score(recipe: &RecipeDetail, terms: &[String]) -> u32 {
    let title = recipe.recipe.title.to_lowercase();
    let keywords = recipe
        .recipe
        .keywords
        .as_deref()
        .map(split_keywords)
        .unwrap_or_default();

    terms
        .iter()
        .map(|term| {
            let mut points = 0;
            if title.contains(term.as_str()) {
                points += TITLE_WEIGHT;
            }
            if keywords.iter().any(|k| k.contains(term.as_str())) {
                points += KEYWORD_WEIGHT;
            }
            if recipe
                .ingredients
                .iter()
                .any(|i| i.name.to_lowercase().contains(term.as_str()))
            {
                points += DETAIL_WEIGHT;
            }
            if recipe
                .recipe
                .tools
                .iter()
                .chain(recipe.recipe.methods.iter())
                .any(|t| t.eq_ignore_ascii_case(term))
            {
                points += DETAIL_WEIGHT;
            }
            points
        })
        .sum()
}

/// Returns recipes matching any term, best match first, ties by id.
pub fn search_recipes(recipes: Vec<RecipeDetail>, query: &str) -> Vec<RecipeDetail> {
    let terms = query_terms(query);
    if terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(u32, RecipeDetail)> = recipes
        .into_iter()
        .map(|r| (score(&r, &terms), r))
        .filter(|(s, _)| *s > 0)
        .collect();
    scored.sort_by(|(sa, a), (sb, b)| sb.cmp(sa).then(a.recipe.id.cmp(&b.recipe.id)));
    scored.into_iter().map(|(_, r)| r).collect()
}
