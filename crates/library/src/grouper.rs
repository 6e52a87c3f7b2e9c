// FILE: crates/library/src/grouper.rs
//! Similarity grouping of loose files
//!
//! Files are visited in sorted path order. Each file joins the existing group
//! holding its most similar member when that score reaches the threshold,
//! otherwise it starts a new group. Equal best scores go to the group formed
//! first, so the result depends only on the set of paths.

use crate::extract::grouping_stem;
use std::path::{Path, PathBuf};

/// One cluster of files believed to form a single book
#[derive(Debug, Clone, PartialEq)]
pub struct FileGroup {
    /// Member paths in sorted order
    pub paths: Vec<PathBuf>,
    /// Highest pairwise similarity inside the group; 0.0 for a singleton
    pub confidence: f64,
}

/// Clusters files of one directory scope by filename resemblance
#[derive(Debug, Clone)]
pub struct SimilarityGrouper {
    threshold: f64,
}

struct Member {
    path: PathBuf,
    stem: String,
}

impl SimilarityGrouper {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Similarity of two file names in `[0.0, 1.0]`
    pub fn similarity(a: &Path, b: &Path) -> f64 {
        stem_similarity(&stem_of(a), &stem_of(b))
    }

    /// Partitions `paths` into groups, ordered by each group's first path
    pub fn group(&self, paths: &[PathBuf]) -> Vec<FileGroup> {
        let mut sorted: Vec<&PathBuf> = paths.iter().collect();
        sorted.sort();
        sorted.dedup();

        let mut groups: Vec<(Vec<Member>, f64)> = Vec::new();

        for path in sorted {
            let member = Member {
                path: path.clone(),
                stem: stem_of(path),
            };

            let mut best: Option<(usize, f64)> = None;
            for (index, (members, _)) in groups.iter().enumerate() {
                let score = members
                    .iter()
                    .map(|m| stem_similarity(&m.stem, &member.stem))
                    .fold(0.0_f64, f64::max);

                if score < self.threshold {
                    continue;
                }
                match best {
                    Some((_, best_score)) if score <= best_score => {}
                    _ => best = Some((index, score)),
                }
            }

            match best {
                Some((index, score)) => {
                    let (members, confidence) = &mut groups[index];
                    log::debug!(
                        "Grouped {} (score {:.3})",
                        member.path.display(),
                        score
                    );
                    members.push(member);
                    *confidence = confidence.max(score);
                }
                None => groups.push((vec![member], 0.0)),
            }
        }

        groups
            .into_iter()
            .map(|(members, confidence)| FileGroup {
                paths: members.into_iter().map(|m| m.path).collect(),
                confidence,
            })
            .collect()
    }
}

fn stem_of(path: &Path) -> String {
    path.file_name()
        .map(|name| grouping_stem(&name.to_string_lossy()))
        .unwrap_or_default()
}

fn stem_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|n| PathBuf::from("/dl").join(n)).collect()
    }

    #[test]
    fn test_book_and_unrelated_file() {
        let grouper = SimilarityGrouper::new(0.8);
        let groups = grouper.group(&paths(&["BookA - 01.mp3", "BookA - 02.mp3", "Unrelated.mp3"]));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].paths, paths(&["BookA - 01.mp3", "BookA - 02.mp3"]));
        assert_eq!(groups[0].confidence, 1.0);
        assert_eq!(groups[1].paths, paths(&["Unrelated.mp3"]));
        assert_eq!(groups[1].confidence, 0.0);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let grouper = SimilarityGrouper::new(0.8);
        let a = grouper.group(&paths(&["Unrelated.mp3", "BookA - 02.mp3", "BookA - 01.mp3"]));
        let b = grouper.group(&paths(&["BookA - 01.mp3", "Unrelated.mp3", "BookA - 02.mp3"]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input() {
        assert!(SimilarityGrouper::new(0.8).group(&[]).is_empty());
    }

    #[test]
    fn test_joins_the_more_similar_group() {
        // abcdefgz scores 0.875 against abcdefgh; abcdwxyz reaches at most 0.625
        let grouper = SimilarityGrouper::new(0.5);
        let groups = grouper.group(&paths(&["abcdefgh.mp3", "abcdwxyz.mp3", "abcdefgz.mp3"]));
        assert_eq!(groups.len(), 1);

        let strict = SimilarityGrouper::new(0.8);
        let groups = strict.group(&paths(&["abcdefgh.mp3", "abcdwxyz.mp3", "abcdefgz.mp3"]));
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].paths, paths(&["abcdefgh.mp3", "abcdefgz.mp3"]));
        assert_eq!(groups[1].paths, paths(&["abcdwxyz.mp3"]));
    }

    #[test]
    fn test_tie_goes_to_earliest_group() {
        // "aaaa" and "bbbb" share nothing; "aabb" scores 0.5 against both
        let grouper = SimilarityGrouper::new(0.5);
        let groups = grouper.group(&paths(&["aaaa.mp3", "bbbb.mp3", "zz/aabb.mp3"]));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].paths, paths(&["aaaa.mp3", "zz/aabb.mp3"]));
        assert_eq!(groups[1].paths, paths(&["bbbb.mp3"]));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // "abcde" vs "abcdx": one edit over five characters = 0.8
        let files = paths(&["abcde.mp3", "abcdx.mp3"]);
        let score = SimilarityGrouper::similarity(&files[0], &files[1]);
        assert!((score - 0.8).abs() < 1e-9);

        assert_eq!(SimilarityGrouper::new(0.8).group(&files).len(), 1);
        assert_eq!(SimilarityGrouper::new(0.79).group(&files).len(), 1);
        assert_eq!(SimilarityGrouper::new(0.81).group(&files).len(), 2);
    }
}
