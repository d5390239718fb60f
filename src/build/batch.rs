use crate::config::Language;
use std::path::PathBuf;

/// Upper bound on sources per compiler invocation.
pub const MAX_BATCH: usize = 50;

/// Sources per invocation. Java is always 1 (`ant` builds one descriptor per
/// call). C/C++ spreads the units evenly over the workers, capped at
/// [`MAX_BATCH`] and never below 1.
pub fn batch_size(language: Language, total: usize, threads: usize) -> usize {
    match language {
        Language::Java => 1,
        Language::Cpp => {
            let even = (total as f64 / threads.max(1) as f64).round_ties_even() as usize;
            even.clamp(1, MAX_BATCH)
        }
    }
}

/// Cut `units` into consecutive batches of `size`; the last may be shorter.
pub fn plan_batches(units: &[PathBuf], size: usize) -> impl Iterator<Item = Vec<PathBuf>> + '_ {
    units.chunks(size.max(1)).map(<[PathBuf]>::to_vec)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("CWE1_{i:04}.c"))).collect()
    }

    #[test]
    fn test_batch_size_policy() {
        assert_eq!(batch_size(Language::Java, 1000, 4), 1);
        assert_eq!(batch_size(Language::Cpp, 1000, 4), 50);
        assert_eq!(batch_size(Language::Cpp, 100, 8), 12);
        assert_eq!(batch_size(Language::Cpp, 3, 8), 1);
        assert_eq!(batch_size(Language::Cpp, 0, 8), 1);
        // round half to even: 10 / 4 = 2.5 -> 2, 14 / 4 = 3.5 -> 4
        assert_eq!(batch_size(Language::Cpp, 10, 4), 2);
        assert_eq!(batch_size(Language::Cpp, 14, 4), 4);
    }

    #[test]
    fn test_batches_are_lossless_and_ordered() {
        for (n, threads) in [(1, 1), (7, 3), (100, 8), (1234, 9), (5000, 17), (49, 64)] {
            let all = units(n);
            let size = batch_size(Language::Cpp, n, threads);
            let batches: Vec<Vec<PathBuf>> = plan_batches(&all, size).collect();

            assert_eq!(batches.len(), n.div_ceil(size), "n={n} threads={threads}");
            assert!(batches.iter().all(|b| !b.is_empty() && b.len() <= size));
            let joined: Vec<PathBuf> = batches.into_iter().flatten().collect();
            assert_eq!(joined, all);
        }
    }

    #[test]
    fn test_no_batches_for_no_units() {
        assert_eq!(plan_batches(&[], 5).count(), 0);
    }
}
