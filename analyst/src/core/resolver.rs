//! Deterministic tool selection for a task.
//!
//! Scores every catalog entry by keyword overlap with the task text and picks
//! the best match. Pure and total: always returns a value, never errors, and
//! `None` means no tool fits. Ties break lexicographically by tool name so the
//! choice is stable across runs.

use std::collections::BTreeMap;

/// Select at most one tool from the catalog for the given task text.
///
/// The catalog maps tool name to a short description. A tool scores one point
/// per task token found in its name or description; a name mentioned verbatim
/// in the task text scores extra. Zero-scoring tools are never selected.
pub fn select_tool(task_text: &str, catalog: &BTreeMap<String, String>) -> Option<String> {
    let task_tokens = tokenize(task_text);
    if task_tokens.is_empty() {
        return None;
    }

    let mut best: Option<(usize, &str)> = None;
    for (name, description) in catalog {
        let mut score = 0usize;
        let name_tokens = tokenize(name);
        let description_tokens = tokenize(description);
        for token in &task_tokens {
            if name_tokens.contains(token) {
                score += 3;
            }
            if description_tokens.contains(token) {
                score += 1;
            }
        }
        if score == 0 {
            continue;
        }
        // BTreeMap iterates in name order, so strict `>` keeps the
        // lexicographically-first winner on ties.
        match best {
            Some((best_score, _)) if score <= best_score => {}
            _ => best = Some((score, name.as_str())),
        }
    }

    best.map(|(_, name)| name.to_string())
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| t.len() > 2)
        .map(str::to_lowercase)
        .collect();
    tokens.sort();
    tokens.dedup();
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(name, desc)| (name.to_string(), desc.to_string()))
            .collect()
    }

    #[test]
    fn empty_catalog_selects_nothing() {
        assert_eq!(select_tool("normalize the counts", &BTreeMap::new()), None);
    }

    #[test]
    fn unrelated_task_selects_nothing() {
        let catalog = catalog(&[("plotter", "draw scatter plots and histograms")]);
        assert_eq!(select_tool("archive old emails", &catalog), None);
    }

    #[test]
    fn picks_tool_named_in_the_task() {
        let catalog = catalog(&[
            ("plotter", "draw scatter plots and histograms"),
            ("loader", "read csv and parquet tables"),
        ]);
        assert_eq!(
            select_tool("use the plotter to draw the clusters", &catalog),
            Some("plotter".to_string())
        );
    }

    #[test]
    fn description_overlap_wins_without_a_name_match() {
        let catalog = catalog(&[
            ("plotter", "draw scatter plots and histograms"),
            ("loader", "read csv and parquet tables"),
        ]);
        assert_eq!(
            select_tool("read the csv tables into memory", &catalog),
            Some("loader".to_string())
        );
    }

    #[test]
    fn ties_break_lexicographically() {
        let catalog = catalog(&[("beta", "normalize counts"), ("alpha", "normalize counts")]);
        assert_eq!(
            select_tool("normalize the counts", &catalog),
            Some("alpha".to_string())
        );
    }

    #[test]
    fn selection_is_total_for_weird_input() {
        let catalog = catalog(&[("loader", "read csv")]);
        assert_eq!(select_tool("", &catalog), None);
        assert_eq!(select_tool("?!", &catalog), None);
    }
}
