//! Keyword relevance scoring shared by the memory and passage backends.

use lorekeep_core::memory::MemoryRecord;

/// Score `content` against `query` by keyword overlap.
///
/// Splits the query into lowercase terms (3+ chars), counts their
/// occurrences in the content, and normalizes by content length so short
/// relevant records outrank long rambling ones.
pub fn score(content: &str, query: &str) -> f32 {
    let content_lower = content.to_lowercase();
    let query_lower = query.to_lowercase();
    let terms: Vec<&str> = query_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .collect();
    if terms.is_empty() {
        return 0.0;
    }

    let hits: usize = terms
        .iter()
        .map(|t| content_lower.matches(t).count())
        .sum();
    hits as f32 / (content.len() as f32 / 100.0).max(1.0)
}

/// Rank records against a query: score, drop zero-relevance entries,
/// sort best-first, truncate to `limit`.
pub fn rank(records: &[MemoryRecord], query: &str, limit: usize) -> Vec<MemoryRecord> {
    let mut results: Vec<MemoryRecord> = records
        .iter()
        .map(|r| {
            let mut scored = r.clone();
            scored.score = score(&r.content, query);
            scored
        })
        .filter(|r| r.score > 0.0)
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(content: &str) -> MemoryRecord {
        MemoryRecord {
            id: String::new(),
            content: content.into(),
            created_at: Utc::now(),
            score: 0.0,
        }
    }

    #[test]
    fn scoring_is_case_insensitive() {
        assert!(score("Rust is great", "rust") > 0.0);
        assert!(score("rust is great", "RUST") > 0.0);
    }

    #[test]
    fn short_terms_are_ignored() {
        assert_eq!(score("an ox is at it", "an ox"), 0.0);
    }

    #[test]
    fn unrelated_content_scores_zero() {
        assert_eq!(score("completely different topic", "refund policy"), 0.0);
    }

    #[test]
    fn rank_orders_best_first() {
        let records = vec![
            record("nothing relevant here"),
            record("refund refund refund"),
            record("one refund mention in a much longer piece of text about other things"),
        ];
        let ranked = rank(&records, "refund policy", 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].content, "refund refund refund");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn rank_respects_limit() {
        let records: Vec<MemoryRecord> =
            (0..10).map(|i| record(&format!("refund note {i}"))).collect();
        let ranked = rank(&records, "refund", 3);
        assert_eq!(ranked.len(), 3);
    }
}
