//! Fuzzy matching of free-text queries against record tags.
//!
//! Scoring is substring-first with a word-overlap fallback. Good enough
//! to find "gmail" in "email, gmail, personal" and to tolerate partial
//! words, without pretending to be a search engine.

use crate::models::SecretRecord;
use crate::prompt::Prompter;
use crate::store::StoreError;

/// Minimum score for a record to count as a match.
const MATCH_THRESHOLD: f64 = 0.5;

/// Scores `query` against a candidate string, 0.0 to 1.0.
pub fn score(query: &str, candidate: &str) -> f64 {
    let query = query.to_lowercase();
    let candidate = candidate.to_lowercase();

    if query.is_empty() {
        return 0.0;
    }

    if candidate.contains(&query) {
        return 1.0;
    }

    let query_words: Vec<&str> = query
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .collect();
    let candidate_words: Vec<&str> = candidate
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| !w.is_empty())
        .collect();

    if query_words.is_empty() {
        return 0.0;
    }

    let matches = query_words
        .iter()
        .filter(|qw| {
            candidate_words
                .iter()
                .any(|cw| cw.contains(*qw) || qw.contains(cw))
        })
        .count();

    matches as f64 / query_words.len() as f64
}

/// Returns records whose joined tags match `query`, best score first.
/// Ties keep the records' original order.
pub fn search<'a>(records: &'a [SecretRecord], query: &str) -> Vec<&'a SecretRecord> {
    let mut scored: Vec<(usize, f64, &SecretRecord)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (i, score(query, &r.joined_tags()), r))
        .filter(|(_, s, _)| *s >= MATCH_THRESHOLD)
        .collect();

    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });

    scored.into_iter().map(|(_, _, r)| r).collect()
}

/// Resolves a query to exactly one record.
///
/// Zero matches returns `None`. A single match is used as-is. Multiple
/// matches suspend on the prompter so the user picks one; if the chosen
/// tag string happens to describe more than one record, the first in
/// list order wins.
pub fn resolve_single(
    records: &[SecretRecord],
    query: &str,
    prompter: &dyn Prompter,
) -> Result<Option<SecretRecord>, StoreError> {
    let results = search(records, query);

    match results.len() {
        0 => Ok(None),
        1 => Ok(Some(results[0].clone())),
        _ => {
            let choices: Vec<String> = results.iter().map(|r| r.joined_tags()).collect();
            let picked = prompter
                .select("Choose from the list", &choices)
                .map_err(StoreError::Prompt)?;
            let chosen_tags = &choices[picked];

            Ok(results
                .iter()
                .find(|r| &r.joined_tags() == chosen_tags)
                .map(|r| (*r).clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::testing::{Reply, ScriptedPrompter};

    fn record(tags: &[&str]) -> SecretRecord {
        SecretRecord::new(tags.iter().map(|t| t.to_string()).collect(), "s")
    }

    #[test]
    fn test_score_exact_substring() {
        assert_eq!(score("gmail", "email, gmail, personal"), 1.0);
    }

    #[test]
    fn test_score_case_insensitive() {
        assert_eq!(score("GMail", "email, gmail"), 1.0);
    }

    #[test]
    fn test_score_word_overlap() {
        let s = score("work email", "email, personal");
        assert!(s > 0.0 && s < 1.0);
    }

    #[test]
    fn test_score_no_match() {
        assert_eq!(score("bank", "email, gmail"), 0.0);
        assert_eq!(score("", "email"), 0.0);
    }

    #[test]
    fn test_search_filters_below_threshold() {
        let records = vec![record(&["email", "gmail"]), record(&["bank", "savings"])];
        let hits = search(&records, "gmail");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, records[0].id);
    }

    #[test]
    fn test_search_empty_query_matches_nothing() {
        let records = vec![record(&["email"])];
        assert!(search(&records, "").is_empty());
    }

    #[test]
    fn test_resolve_single_zero_matches() {
        let records = vec![record(&["email"])];
        let prompter = ScriptedPrompter::new(vec![]);
        let result = resolve_single(&records, "bank", &prompter).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_resolve_single_one_match_no_prompt() {
        let records = vec![record(&["email", "gmail"]), record(&["bank"])];
        let prompter = ScriptedPrompter::new(vec![]);
        let result = resolve_single(&records, "gmail", &prompter).unwrap().unwrap();
        assert_eq!(result.id, records[0].id);
        assert!(prompter.is_exhausted());
    }

    #[test]
    fn test_resolve_single_many_matches_prompts() {
        let records = vec![record(&["work", "email"]), record(&["work", "vpn"])];
        let prompter = ScriptedPrompter::new(vec![Reply::Select(1)]);
        let result = resolve_single(&records, "work", &prompter).unwrap().unwrap();
        assert_eq!(result.id, records[1].id);
    }

    #[test]
    fn test_resolve_single_duplicate_tags_first_wins() {
        // Two records with identical tag strings: the selection string
        // matches both, the earlier one is picked deterministically.
        let a = record(&["dup"]);
        let b = record(&["dup"]);
        let records = vec![a.clone(), b];
        let prompter = ScriptedPrompter::new(vec![Reply::Select(1)]);
        let result = resolve_single(&records, "dup", &prompter).unwrap().unwrap();
        assert_eq!(result.id, a.id);
    }
}
