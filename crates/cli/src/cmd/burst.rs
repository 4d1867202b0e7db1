//! Burst simulation
//!
//! Submits each task `bursts` times, `interval_ms` apart, then waits for the
//! debounce window to close. When the interval is shorter than the delay
//! every task should fire exactly once.

use anyhow::{Context, Result};
use lazyworker::{Scheduler, SchedulerConfig, Task};
use owo_colors::OwoColorize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

pub fn run(
    config: SchedulerConfig,
    keys: usize,
    bursts: usize,
    interval_ms: u64,
    delay_ms: u64,
) -> Result<()> {
    let scheduler = Scheduler::builder()
        .config(config)
        .build()
        .context("Failed to start scheduler")?;

    let counts: Arc<Vec<AtomicUsize>> = Arc::new((0..keys).map(|_| AtomicUsize::new(0)).collect());
    let tasks: Vec<Task> = (0..keys)
        .map(|i| {
            let counts = Arc::clone(&counts);
            Task::new(move || {
                counts[i].fetch_add(1, Ordering::SeqCst);
            })
        })
        .collect();

    let delay = Duration::from_millis(delay_ms);
    let interval = Duration::from_millis(interval_ms);
    let started = Instant::now();

    info!(keys, bursts, ?interval, ?delay, "Starting burst");
    for round in 0..bursts {
        for task in &tasks {
            scheduler.submit(task, delay)?;
        }
        if round + 1 < bursts {
            thread::sleep(interval);
        }
    }

    let deadline = Instant::now() + delay + Duration::from_secs(5);
    while scheduler.pending_count() > 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    let elapsed = started.elapsed();

    let expect_single = interval < delay;
    println!("{}", "Fire counts".bold());
    for (i, count) in counts.iter().enumerate() {
        let count = count.load(Ordering::SeqCst);
        let line = format!("  task {:>3}: {}", i, count);
        if !expect_single || count == 1 {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }

    let stats = scheduler.stats();
    println!("\n{}", "Stats".bold());
    println!("  {} = {}", "submitted".cyan(), stats.submitted);
    println!("  {} = {}", "replaced".cyan(), stats.replaced);
    println!("  {} = {}", "fired".cyan(), stats.fired);
    println!("  {} = {}", "panicked".cyan(), stats.panicked);
    println!("  {} = {:?}", "elapsed".cyan(), elapsed);

    scheduler.shutdown();
    Ok(())
}
