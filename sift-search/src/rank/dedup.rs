//! Cross-query merging of ranked result sets.
//!
//! Each ranked set is already unique by normalized URL. Merging several
//! sets keeps the highest-scored entry per URL; on equal scores the entry
//! seen first is kept.

use std::collections::HashMap;

use crate::types::RankedResult;

use super::scoring::sort_by_score;

/// Merge ranked sets, re-sort by score and keep at most `limit` entries.
pub fn merge_ranked<I>(sets: I, limit: usize) -> Vec<RankedResult>
where
    I: IntoIterator<Item = Vec<RankedResult>>,
{
    let mut merged: Vec<RankedResult> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for result in sets.into_iter().flatten() {
        match index.get(&result.url) {
            Some(&slot) => {
                if result.score > merged[slot].score {
                    merged[slot] = result;
                }
            }
            None => {
                index.insert(result.url.clone(), merged.len());
                merged.push(result);
            }
        }
    }

    sort_by_score(&mut merged);
    merged.truncate(limit);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(url: &str, title: &str, score: f64) -> RankedResult {
        RankedResult {
            title: title.into(),
            url: url.into(),
            snippet: None,
            source: None,
            score,
            domain: None,
            verified: None,
        }
    }

    #[test]
    fn unique_urls_pass_through() {
        let merged = merge_ranked(
            vec![
                vec![ranked("https://a.com/", "a", 1.0)],
                vec![ranked("https://b.com/", "b", 2.0)],
            ],
            20,
        );
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].url, "https://b.com/");
    }

    #[test]
    fn highest_score_kept_across_sets() {
        let merged = merge_ranked(
            vec![
                vec![ranked("https://a.com/", "low", 1.0)],
                vec![ranked("https://a.com/", "high", 5.0)],
            ],
            20,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "high");
    }

    #[test]
    fn ties_keep_first_seen() {
        let merged = merge_ranked(
            vec![
                vec![ranked("https://a.com/", "first", 3.0)],
                vec![ranked("https://a.com/", "second", 3.0)],
            ],
            20,
        );
        assert_eq!(merged[0].title, "first");
    }

    #[test]
    fn truncates_to_limit_after_sorting() {
        let sets: Vec<Vec<RankedResult>> = (0..30)
            .map(|i| vec![ranked(&format!("https://e.com/{i}"), "t", f64::from(i))])
            .collect();
        let merged = merge_ranked(sets, 20);
        assert_eq!(merged.len(), 20);
        assert!((merged[0].score - 29.0).abs() < f64::EPSILON);
        assert!(merged.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(merge_ranked(Vec::<Vec<RankedResult>>::new(), 20).is_empty());
    }
}
