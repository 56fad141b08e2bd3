//! Internal helper functions for parallel processing

use log::trace;

/// Ensure that at least the specified total capacity is reserved for the given vector
pub(crate) fn reserve_total<T>(vec: &mut Vec<T>, total_capacity: usize) {
    if total_capacity > vec.capacity() {
        vec.reserve(total_capacity - vec.capacity());
    }
}

/// Policy for splitting work items into parallel tasks
pub(crate) struct ParallelPolicy {
    pub min_task_size: usize,
    pub tasks_per_thread: usize,
}

impl Default for ParallelPolicy {
    fn default() -> Self {
        Self {
            min_task_size: 4,
            tasks_per_thread: 8,
        }
    }
}

/// Chunking of a number of work items for parallel processing
pub(crate) struct ChunkSize {
    pub num_chunks: usize,
    pub chunk_size: usize,
}

impl ChunkSize {
    pub(crate) fn new(parallel_policy: &ParallelPolicy, num_items: usize) -> Self {
        let num_threads = rayon::current_num_threads();

        // Chunk size for one chunk per thread
        let equal_distribution = num_items / num_threads;

        let chunk_size = if parallel_policy.min_task_size > equal_distribution {
            // Ensure that every thread gets some data
            equal_distribution
        } else {
            // Ensure that there are the desired amount of tasks/chunks per thread
            let num_tasks = parallel_policy.tasks_per_thread * num_threads;
            (num_items / num_tasks).max(parallel_policy.min_task_size)
        }
        .max(1);

        let num_chunks = num_items.div_ceil(chunk_size);

        trace!(
            "Splitting {} work items into {} chunks of up to {} items",
            num_items, num_chunks, chunk_size
        );

        Self {
            num_chunks,
            chunk_size,
        }
    }
}
