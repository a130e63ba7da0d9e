//! Stress tests for secidx.
//!
//! These helpers drive a store under heavy load and concurrent access.
//! They report throughput; index consistency is checked separately with
//! [`check_membership`](crate::integration::check_membership).

use crate::fixtures::{Person, TestStore};
use secidx_core::BatchEntry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Number of distinct primary keys.
    pub key_count: usize,
    /// Number of distinct ages, and therefore of `age` index entries.
    pub age_spread: u32,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            key_count: 1_000,
            age_spread: 10,
        }
    }
}

fn person_for(i: usize, config: &StressConfig) -> Person {
    let age = 20 + (i as u32 % config.age_spread.max(1));
    Person::new(&format!("P{i}"), "Stress", age)
}

fn tally<E>(result: Result<bool, E>, successful: &AtomicUsize, failed: &AtomicUsize) {
    match result {
        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
    };
}

/// Run a sequential write stress test.
pub fn stress_sequential_writes(store: &TestStore, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = i % config.key_count;
        match store.set(key, &person_for(i, config)) {
            Ok(_) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a mixed set/delete/batch stress test.
pub fn stress_mixed_operations(store: &TestStore, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let key = i % config.key_count;

        let result = match i % 4 {
            0 => store.set(key, &person_for(i, config)),
            1 => store.delete(key),
            2 => store.set_many((0..4).map(|offset| {
                let n = i + offset;
                BatchEntry::new(n % config.key_count, person_for(n, config))
            })),
            _ => store.delete_many([key, (key + 1) % config.key_count]),
        };

        match result {
            Ok(_) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Run a concurrent write stress test.
///
/// Threads write overlapping keys and ages, so most writes contend for the
/// same index entries.
pub fn stress_concurrent_writes(store: Arc<TestStore>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads;

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let config = config.clone();

            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let n = t * ops_per_thread + i;
                    let key = n % config.key_count;
                    let result = if i % 5 == 4 {
                        store.delete(key)
                    } else {
                        store.set(key, &person_for(n, &config))
                    };
                    tally(result, &successful, &failed);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Run concurrent index lookups while one thread keeps writing.
pub fn stress_reads_during_writes(store: Arc<TestStore>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads.max(1);

    let start = Instant::now();

    let writer = {
        let store = Arc::clone(&store);
        let successful = Arc::clone(&successful);
        let failed = Arc::clone(&failed);
        let config = config.clone();
        thread::spawn(move || {
            for i in 0..ops_per_thread {
                let result = store.set(i % config.key_count, &person_for(i, &config));
                tally(result, &successful, &failed);
            }
        })
    };

    let readers: Vec<_> = (0..config.threads.saturating_sub(1))
        .map(|_| {
            let store = Arc::clone(&store);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let config = config.clone();
            thread::spawn(move || {
                for i in 0..ops_per_thread {
                    let age = 20 + (i as u32 % config.age_spread.max(1));
                    let result = store.get_by_index("age", age).map(|_| true);
                    tally(result, &successful, &failed);
                }
            })
        })
        .collect();

    writer.join().expect("Thread panicked");
    for handle in readers {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}
