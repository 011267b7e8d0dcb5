use parstan_types::Chunk;
use std::path::PathBuf;

/// Split `files` into `min(workers, files.len())` contiguous chunks.
///
/// Chunk sizes differ by at most one: the leading chunks hold `ceil(len / workers)` files and
/// the rest one file less, so 9 files over 4 workers give 3+2+2+2. An empty file list yields
/// no chunks, and a worker count of zero is treated as one.
pub fn partition(files: Vec<PathBuf>, workers: usize) -> Vec<Chunk> {
    if files.is_empty() {
        return Vec::new();
    }

    let chunk_count = workers.max(1).min(files.len());
    let base = files.len() / chunk_count;
    let larger = files.len() % chunk_count;

    let mut chunks = Vec::with_capacity(chunk_count);
    let mut remaining = files.into_iter();
    for index in 0..chunk_count {
        let size = if index < larger { base + 1 } else { base };
        let slice: Vec<PathBuf> = remaining.by_ref().take(size).collect();
        chunks.push(Chunk::new(index, slice));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| PathBuf::from(format!("/src/file{}.php", i)))
            .collect()
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(partition(Vec::new(), 5).is_empty());
    }

    #[test]
    fn test_fewer_files_than_workers() {
        let chunks = partition(files(3), 5);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_sizes_differ_by_at_most_one() {
        let sizes: Vec<usize> = partition(files(10), 3).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![4, 3, 3]);

        let sizes: Vec<usize> = partition(files(9), 4).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 2, 2, 2]);
    }

    #[test]
    fn test_even_split_matches_ceil_slicing() {
        let sizes: Vec<usize> = partition(files(12), 4).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 3, 3, 3]);
    }

    #[test]
    fn test_zero_workers_behaves_like_one() {
        let chunks = partition(files(4), 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 4);
    }

    #[test]
    fn test_chunk_indices_follow_submission_order() {
        let chunks = partition(files(7), 3);
        let indices: Vec<usize> = chunks.iter().map(|c| c.index()).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_partition_covers_input_in_order() {
        for file_count in 0..40 {
            for workers in 1..12 {
                let input = files(file_count);
                let chunks = partition(input.clone(), workers);

                assert_eq!(chunks.len(), workers.min(file_count));
                assert!(chunks.iter().all(|c| !c.is_empty()));

                let rejoined: Vec<PathBuf> =
                    chunks.into_iter().flat_map(|c| c.into_files()).collect();
                assert_eq!(rejoined, input, "files={} workers={}", file_count, workers);
            }
        }
    }
}
