use rayon::ThreadPoolBuilder;
use tracing::info;

use crate::error::TerrainResult;

// A wrapper around Rayon's ThreadPool used for background chunk builds
pub struct ThreadPool {
    pool: rayon::ThreadPool,
    num_threads: usize,
}

impl ThreadPool {
    // If size is 0, it will use num_cpus::get() to determine the number of threads
    pub fn new(size: usize) -> TerrainResult<ThreadPool> {
        let num_threads = if size > 0 { size } else { num_cpus::get() };

        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|index| format!("chunk-builder-{}", index))
            .build()?;

        info!("Created thread pool with {} threads", num_threads);

        Ok(ThreadPool { pool, num_threads })
    }

    // Fire-and-forget; the job reports back on its own channel
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(f);
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;
    use std::time::Duration;

    #[test]
    fn executes_jobs_off_thread() {
        let pool = ThreadPool::new(2).unwrap();
        assert_eq!(pool.num_threads(), 2);

        let (tx, rx) = channel();
        for i in 0..4 {
            let tx = tx.clone();
            pool.execute(move || {
                let name = std::thread::current().name().map(str::to_owned);
                tx.send((i, name)).unwrap();
            });
        }

        let mut seen: Vec<usize> = (0..4)
            .map(|_| {
                let (i, name) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
                assert!(name.unwrap().starts_with("chunk-builder-"));
                i
            })
            .collect();
        seen.sort();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn zero_size_uses_cpu_count() {
        let pool = ThreadPool::new(0).unwrap();
        assert_eq!(pool.num_threads(), num_cpus::get());
    }
}
