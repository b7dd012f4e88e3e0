// Branching probabilities over the core-level ladder.
//
// When the energy transferred in an event is large enough to ionize several
// core levels, the mechanism has to pick one. The default policy takes the
// highest eligible level. The alternative weights the levels by
// user-supplied branching ratios: ratio[i] is the probability that the
// excitation channel opened by core level i is *not* taken, read off the
// energy-loss function as the ratio of its value just below the level's
// edge to its value just above.

/// Build the ragged cumulative-probability ladder from per-level branching
/// ratios. Row `i` covers events eligible to ionize levels `0..=i` and has
/// length `i + 1`; each row is non-decreasing.
pub(crate) fn cumulative_branching_probabilities(ratios: &[f64]) -> Vec<Vec<f64>> {
    let n = ratios.len();
    if n == 0 {
        return Vec::new();
    }
    let mut probabilities: Vec<Vec<f64>> = Vec::with_capacity(n);
    let mut cumulative: Vec<Vec<f64>> = Vec::with_capacity(n);
    probabilities.push(vec![ratios[0]]);
    cumulative.push(vec![ratios[0]]);
    for i in 1..n {
        let mut row = vec![0.0; i + 1];
        for j in 0..i {
            row[j] = probabilities[i - 1][j] * ratios[i];
        }
        row[i] = (1.0 - ratios[i - 1]) * ratios[i];
        let mut cum = vec![0.0; i + 1];
        cum[0] = row[0];
        for j in 1..=i {
            cum[j] = cum[j - 1] + row[j];
        }
        probabilities.push(row);
        cumulative.push(cum);
    }
    cumulative
}

/// Select an entry of a non-decreasing cumulative-probability vector for a
/// uniform draw `r`.
///
/// An exact hit selects that entry; otherwise the entry immediately below
/// the first value exceeding `r` is selected. `None` means the draw fell
/// below every entry, i.e. the valence channel wins.
pub(crate) fn search_cumulative(cumulative: &[f64], r: f64) -> Option<usize> {
    let idx = cumulative.partition_point(|&p| p < r);
    if idx < cumulative.len() && cumulative[idx] == r {
        return Some(idx);
    }
    if idx == 0 {
        None
    } else {
        Some(idx - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_is_triangular() {
        let ladder = cumulative_branching_probabilities(&[0.3, 0.5, 0.8]);
        assert_eq!(ladder.len(), 3);
        for (i, row) in ladder.iter().enumerate() {
            assert_eq!(row.len(), i + 1);
        }
    }

    #[test]
    fn test_rows_are_non_decreasing_and_bounded() {
        let ladder = cumulative_branching_probabilities(&[0.2, 0.6, 0.9, 0.4]);
        for row in &ladder {
            for pair in row.windows(2) {
                assert!(pair[1] >= pair[0], "row not non-decreasing: {:?}", row);
            }
            assert!(*row.last().unwrap() <= 1.0 + 1e-12);
        }
    }

    #[test]
    fn test_single_level_ladder() {
        let ladder = cumulative_branching_probabilities(&[0.25]);
        assert_eq!(ladder, vec![vec![0.25]]);
    }

    #[test]
    fn test_empty_ratios() {
        assert!(cumulative_branching_probabilities(&[]).is_empty());
    }

    #[test]
    fn test_second_row_recurrence() {
        // row1 = [r0*r1, (1 - r0)*r1], cumulated.
        let ladder = cumulative_branching_probabilities(&[0.3, 0.5]);
        let row = &ladder[1];
        assert!((row[0] - 0.15).abs() < 1e-15);
        assert!((row[1] - (0.15 + 0.35)).abs() < 1e-15);
    }

    #[test]
    fn test_search_between_entries() {
        let cum = [0.1, 0.4, 0.9];
        assert_eq!(search_cumulative(&cum, 0.2), Some(0));
        assert_eq!(search_cumulative(&cum, 0.5), Some(1));
    }

    #[test]
    fn test_search_exact_hit() {
        let cum = [0.1, 0.4, 0.9];
        assert_eq!(search_cumulative(&cum, 0.4), Some(1));
    }

    #[test]
    fn test_search_below_all_entries_is_valence() {
        let cum = [0.1, 0.4, 0.9];
        assert_eq!(search_cumulative(&cum, 0.05), None);
    }

    #[test]
    fn test_search_above_all_entries_takes_last() {
        let cum = [0.1, 0.4, 0.9];
        assert_eq!(search_cumulative(&cum, 0.95), Some(2));
    }

    #[test]
    fn test_search_zero_ratio_single_row_never_valence() {
        // A lone ratio of 0 means the core channel is always taken.
        let cum = [0.0];
        for r in [0.0, 0.3, 0.999] {
            assert_eq!(search_cumulative(&cum, r), Some(0), "r = {}", r);
        }
    }
}
