// SPDX-License-Identifier: MIT OR Apache-2.0

//! Representative line selection by greedy term coverage

use std::collections::{BTreeMap, BTreeSet};

/// Pick up to `max_count` lines that together cover the most distinct terms.
///
/// Each round takes the line with the most still-uncovered terms, breaking
/// ties by line score and then by lower line number. Once nothing new can be
/// covered, remaining slots go to unselected matching lines in file order.
/// The result is always in ascending line order.
pub fn select_lines(
    scores: &BTreeMap<u64, f64>,
    terms: &BTreeMap<u64, BTreeSet<String>>,
    max_count: usize,
) -> Vec<u64> {
    let mut remaining: BTreeMap<u64, BTreeSet<&str>> = terms
        .iter()
        .map(|(&line, set)| (line, set.iter().map(String::as_str).collect()))
        .collect();
    let mut selected: BTreeSet<u64> = BTreeSet::new();

    while selected.len() < max_count {
        let best = remaining
            .iter()
            .filter(|(_, uncovered)| !uncovered.is_empty())
            .max_by(|(line_a, a), (line_b, b)| {
                a.len()
                    .cmp(&b.len())
                    .then_with(|| {
                        line_score(scores, **line_a).total_cmp(&line_score(scores, **line_b))
                    })
                    .then_with(|| line_b.cmp(line_a))
            })
            .map(|(&line, _)| line);
        let Some(line) = best else {
            break;
        };

        let covered = remaining.remove(&line).unwrap_or_default();
        for uncovered in remaining.values_mut() {
            uncovered.retain(|term| !covered.contains(term));
        }
        selected.insert(line);
    }

    for &line in terms.keys() {
        if selected.len() >= max_count {
            break;
        }
        selected.insert(line);
    }

    selected.into_iter().collect()
}

fn line_score(scores: &BTreeMap<u64, f64>, line: u64) -> f64 {
    scores.get(&line).copied().unwrap_or(0.0)
}
