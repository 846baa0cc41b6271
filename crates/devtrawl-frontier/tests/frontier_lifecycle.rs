//! End-to-end frontier lifecycle tests: enqueue, pull, fail, backoff
//! release through the runner, visibility reclaim, and shutdown.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use devtrawl_core::ManualClock;
use devtrawl_frontier::{
    EnqueueError, FetchError, Frontier, FrontierConfig, FrontierDeps, Job, JobStatus, Priority,
};

fn fast_config() -> FrontierConfig {
    FrontierConfig {
        band_capacities: [16, 16, 16, 16],
        visibility_timeout: Duration::from_millis(200),
        base_backoff: Duration::from_millis(10),
        delayed_tick: Duration::from_millis(10),
        ..FrontierConfig::default()
    }
}

fn job(band: Priority, score: i64) -> Job {
    Job::new(format!("https://example.com/{band}"), band, score)
}

/// Poll `pull` until a job appears or the deadline passes.
async fn pull_within(frontier: &Frontier, deadline: Duration) -> Option<Job> {
    let start = tokio::time::Instant::now();
    loop {
        if let Some(job) = frontier.pull() {
            return Some(job);
        }
        if start.elapsed() > deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn test_failed_job_comes_back_through_the_runner() {
    let frontier = Arc::new(Frontier::new(fast_config()).expect("valid config"));
    frontier.start();

    frontier.enqueue(job(Priority::P1High, 80)).expect("room");
    let pulled = frontier.pull().expect("queued");
    frontier.fail(pulled, &FetchError::Http { status: 503 }, 80);

    // base 10ms, first retry in [15, 25) ms; the runner re-releases it.
    let retried = pull_within(&frontier, Duration::from_secs(2))
        .await
        .expect("runner released the retry");
    assert_eq!(retried.retry_count, 1);
    assert_eq!(retried.status, JobStatus::InFlight);
    frontier.complete(retried);

    frontier.shutdown();
}

#[tokio::test]
async fn test_crashed_worker_job_is_redelivered() {
    let frontier = Arc::new(Frontier::new(fast_config()).expect("valid config"));
    frontier.start();

    frontier.enqueue(job(Priority::P2Normal, 40)).expect("room");
    let first = frontier.pull().expect("queued");
    let id = first.id.clone();
    drop(first); // worker crashes without reporting

    // After the 200ms visibility timeout the sweep fails it with a
    // synthetic timeout and backoff re-releases it.
    let redelivered = pull_within(&frontier, Duration::from_secs(2))
        .await
        .expect("sweep reclaimed the job");
    assert_eq!(redelivered.id, id);
    assert_eq!(redelivered.retry_count, 1);
    frontier.complete(redelivered);

    frontier.shutdown();
}

#[tokio::test]
async fn test_shutdown_stops_enqueues_and_runner() {
    let frontier = Arc::new(Frontier::new(fast_config()).expect("valid config"));
    frontier.start();
    frontier.shutdown();

    assert!(frontier.is_closed());
    assert!(matches!(
        frontier.enqueue(job(Priority::P2Normal, 40)),
        Err(EnqueueError::Closed(_))
    ));
    // Idempotent.
    frontier.shutdown();
}

// Spec invariant: pulled jobs never exceed enqueued jobs and no job id is
// outstanding twice, across concurrent workers.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_workers_each_job_delivered_once() {
    const JOBS: usize = 500;
    const WORKERS: usize = 8;

    let config = FrontierConfig {
        band_capacities: [1024, 1024, 1024, 1024],
        ..fast_config()
    };
    let frontier = Arc::new(Frontier::new(config).expect("valid config"));
    frontier.start();

    for i in 0..JOBS {
        let band = Priority::ALL[i % 4];
        frontier
            .enqueue(Job::new(format!("https://example.com/{i}"), band, 40))
            .expect("room");
    }

    let seen = Arc::new(tokio::sync::Mutex::new(HashSet::new()));
    let mut handles = Vec::new();
    for _ in 0..WORKERS {
        let frontier = Arc::clone(&frontier);
        let seen = Arc::clone(&seen);
        handles.push(tokio::spawn(async move {
            loop {
                let Some(job) = frontier.pull() else {
                    break;
                };
                {
                    let mut seen = seen.lock().await;
                    assert!(seen.insert(job.payload.clone()), "duplicate {}", job.payload);
                }
                frontier.complete(job);
            }
        }));
    }
    for handle in handles {
        handle.await.expect("worker panicked");
    }

    let stats = frontier.stats();
    assert_eq!(seen.lock().await.len(), JOBS);
    assert_eq!(stats.dequeued, JOBS as u64);
    assert_eq!(stats.in_flight, 0);
    assert!(stats.dequeued <= stats.enqueued);

    frontier.shutdown();
}

// Spec scenario: a P1 job failing twice is re-enqueued only inside its
// backoff windows, driven by a manual clock and explicit ticks.
#[test]
fn test_backoff_windows_for_two_transient_failures() {
    let clock = Arc::new(ManualClock::new());
    let deps = FrontierDeps {
        clock: Arc::clone(&clock) as Arc<dyn devtrawl_core::ClockPort>,
        ..FrontierDeps::default()
    };
    let config = FrontierConfig {
        band_capacities: [16, 16, 16, 16],
        ..FrontierConfig::default()
    };
    let frontier = Frontier::with_deps(config, deps).expect("valid config");

    frontier
        .enqueue(Job::new("https://spec.example.com/", Priority::P1High, 80))
        .expect("room");
    let pulled = frontier.pull().expect("queued");
    frontier.fail(pulled, &FetchError::Http { status: 500 }, 80);

    // First backoff: [7.5, 12.5) s. Nothing before 7.5s...
    clock.advance(Duration::from_millis(7_400));
    frontier.tick();
    assert!(frontier.pull().is_none());
    // ...guaranteed by 12.5s.
    clock.advance(Duration::from_millis(5_200));
    frontier.tick();
    let retried = frontier.pull().expect("inside the first window");
    assert_eq!(retried.priority, Priority::P1High);
    assert_eq!(retried.score, 70);

    frontier.fail(retried, &FetchError::Http { status: 500 }, 80);

    // Second backoff: [15, 25) s.
    clock.advance(Duration::from_millis(14_900));
    frontier.tick();
    assert!(frontier.pull().is_none());
    clock.advance(Duration::from_millis(10_200));
    frontier.tick();
    let retried = frontier.pull().expect("inside the second window");
    assert_eq!(retried.priority, Priority::P1High);
    assert_eq!(retried.score, 60);
    assert_eq!(retried.retry_count, 2);
}
