//! Pipeline tests: delivery, backpressure, shutdown, failure policy, dispatcher.

use chunkpipe::pipeline::{BoundedQueue, Merge, Phase, Pipeline, RunSummary};
use chunkpipe::{DispatchOpts, serve};
use crossbeam_channel::bounded;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const WATCHDOG: Duration = Duration::from_secs(20);

/// Run `f` on a helper thread and fail the test if it does not finish within [`WATCHDOG`].
fn within_budget<R: Send + 'static>(f: impl FnOnce() -> R + Send + 'static) -> R {
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(WATCHDOG)
        .expect("pipeline did not finish within the time budget")
}

fn sum_run(capacity: usize, workers: usize, n: u64) -> RunSummary<u64> {
    Pipeline::new(capacity, workers, |x: u64| Ok(x))
        .unwrap()
        .run_to_completion(move |feeder| {
            for i in 1..=n {
                feeder.push(i).map_err(|_| anyhow::anyhow!("closed"))?;
            }
            Ok(())
        })
        .unwrap()
}

// --- delivery ---

#[test]
fn test_no_loss_or_duplication_across_tunings() {
    let n = 500_u64;
    for capacity in [1, 2, 7, 64] {
        for workers in [1, 2, 4, 8] {
            let summary = sum_run(capacity, workers, n);
            assert_eq!(summary.total, n * (n + 1) / 2, "C={capacity} N={workers}");
            assert_eq!(summary.items_produced, n as usize);
            assert_eq!(summary.items_processed, n as usize);
            assert_eq!(summary.queue.enqueued, n);
            assert_eq!(summary.queue.dequeued, n);
            assert!(summary.queue.high_water <= capacity);
            assert!(summary.queue.high_water >= 1);
        }
    }
}

#[test]
fn test_every_item_seen_exactly_once() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_w = Arc::clone(&seen);
    let summary = Pipeline::new(3, 4, move |x: u32| {
        seen_w.lock().unwrap().push(x);
        Ok(1_u64)
    })
    .unwrap()
    .run_to_completion(|feeder| {
        feeder.feed((0..300_u32).map(Ok::<_, std::io::Error>))?;
        Ok(())
    })
    .unwrap();
    assert_eq!(summary.total, 300);
    let seen = seen.lock().unwrap();
    let unique: HashSet<u32> = seen.iter().copied().collect();
    assert_eq!(seen.len(), 300);
    assert_eq!(unique.len(), 300);
}

#[test]
fn test_single_worker_sees_production_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let order_w = Arc::clone(&order);
    Pipeline::new(2, 1, move |x: u32| {
        order_w.lock().unwrap().push(x);
        Ok(())
    })
    .unwrap()
    .run_to_completion(|feeder| {
        feeder.feed((0..50_u32).map(Ok::<_, std::io::Error>))?;
        Ok(())
    })
    .unwrap();
    assert_eq!(*order.lock().unwrap(), (0..50).collect::<Vec<_>>());
}

// --- progress / shutdown ---

#[test]
fn test_capacity_one_two_workers_completes() {
    let summary = within_budget(|| sum_run(1, 2, 1000));
    assert_eq!(summary.total, 500_500);
    assert_eq!(summary.queue.high_water, 1);
    assert_eq!(summary.phase, Phase::Joined);
}

#[test]
fn test_empty_input_leaves_identity() {
    let summary = within_budget(|| {
        Pipeline::new(4, 8, |x: u64| Ok(x))
            .unwrap()
            .run_to_completion(|_feeder| Ok(()))
            .unwrap()
    });
    assert_eq!(summary.total, 0);
    assert_eq!(summary.items_produced, 0);
    assert_eq!(summary.items_processed, 0);
    assert_eq!(summary.phase, Phase::Joined);
}

#[test]
fn test_slow_workers_apply_backpressure() {
    let summary = within_budget(|| {
        Pipeline::new(2, 1, |x: u64| {
            thread::sleep(Duration::from_millis(2));
            Ok(x)
        })
        .unwrap()
        .run_to_completion(|feeder| {
            feeder.feed((0..20_u64).map(Ok::<_, std::io::Error>))?;
            Ok(())
        })
        .unwrap()
    });
    assert_eq!(summary.total, 190);
    assert!(summary.queue.backpressure_events > 0);
    assert_eq!(summary.queue.high_water, 2);
}

#[test]
fn test_pops_after_close_stay_empty() {
    let q = BoundedQueue::<u8>::new(3).unwrap();
    q.push(1).unwrap();
    q.close();
    q.close();
    assert_eq!(q.pop(), Some(1));
    for _ in 0..5 {
        assert_eq!(q.pop(), None);
    }
    assert!(q.push(2).is_err());
}

// --- failure policy ---

#[test]
fn test_skip_policy_continues_past_failures() {
    let summary = Pipeline::new(4, 3, |x: u64| {
        if x % 10 == 0 {
            anyhow::bail!("item {x} rejected");
        }
        Ok(x)
    })
    .unwrap()
    .run_to_completion(|feeder| {
        feeder.feed((1..=100_u64).map(Ok::<_, std::io::Error>))?;
        Ok(())
    })
    .unwrap();
    let expected: u64 = (1..=100).filter(|x| x % 10 != 0).sum();
    assert_eq!(summary.total, expected);
    assert_eq!(summary.items_skipped, 10);
    assert_eq!(summary.items_processed, 90);
    assert_eq!(summary.items_produced, 100);
    assert!(summary.skipped.iter().all(|m| m.contains("rejected")));
}

#[test]
fn test_panicking_item_is_skipped_not_fatal() {
    let summary = within_budget(|| {
        Pipeline::new(1, 2, |x: u64| {
            if x == 3 {
                panic!("bad item");
            }
            Ok(x)
        })
        .unwrap()
        .run_to_completion(|feeder| {
            feeder.feed((1..=5_u64).map(Ok::<_, std::io::Error>))?;
            Ok(())
        })
        .unwrap()
    });
    assert_eq!(summary.total, 12);
    assert_eq!(summary.items_skipped, 1);
    assert!(summary.skipped[0].contains("bad item"));
}

#[test]
fn test_strict_policy_aborts_run() {
    let err = within_budget(|| {
        Pipeline::new(1, 2, |x: u64| {
            if x == 5 {
                anyhow::bail!("item five is broken");
            }
            Ok(x)
        })
        .unwrap()
        .strict(true)
        .run_to_completion(|feeder| {
            feeder.feed((1..=10_000_u64).map(Ok::<_, std::io::Error>))?;
            Ok(())
        })
        .unwrap_err()
    });
    assert!(format!("{err:#}").contains("item five is broken"));
}

#[test]
fn test_producer_error_is_fatal() {
    let err = within_budget(|| {
        Pipeline::new(2, 2, |x: u64| Ok(x))
            .unwrap()
            .run_to_completion(|feeder| {
                let items = vec![
                    Ok(1_u64),
                    Ok(2),
                    Err(std::io::Error::other("read failed")),
                    Ok(3),
                ];
                feeder.feed(items)?;
                Ok(())
            })
            .unwrap_err()
    });
    assert!(format!("{err:#}").contains("read failed"));
}

#[test]
fn test_producer_panic_is_reported() {
    let result = within_budget(|| {
        Pipeline::new(2, 2, |x: u64| Ok(x))
            .unwrap()
            .run_to_completion(|feeder| {
                feeder.push(1).map_err(|_| anyhow::anyhow!("closed"))?;
                panic!("producer blew up");
            })
            .map(|s| s.total)
    });
    assert!(result.is_err());
}

#[derive(Debug, Default)]
struct ExplodingMerge;

impl Merge for ExplodingMerge {
    fn merge(&mut self, _other: Self) {
        panic!("merge blew up");
    }
}

#[test]
fn test_panicking_merge_fails_run_instead_of_hanging() {
    let result = within_budget(|| {
        Pipeline::new(1, 1, |_x: u64| Ok(ExplodingMerge))
            .unwrap()
            .run_to_completion(|feeder| {
                feeder.feed((0..10_u64).map(Ok::<_, std::io::Error>))?;
                Ok(())
            })
            .map(|s| s.items_processed)
    });
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("panicked"));
}

// --- dispatcher ---

#[test]
fn test_dispatch_handles_every_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let opts = DispatchOpts {
        workers: 3,
        capacity: 2,
        max_connections: Some(8),
        strict: false,
    };

    let server = thread::spawn(move || {
        serve(listener, &opts, |mut stream: TcpStream| {
            let mut buf = [0_u8; 64];
            let n = stream.read(&mut buf)?;
            stream.write_all(&buf[..n])?;
            Ok(())
        })
    });

    let clients: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let mut s = TcpStream::connect(addr).unwrap();
                let msg = format!("ping {i}");
                s.write_all(msg.as_bytes()).unwrap();
                let mut reply = String::new();
                s.read_to_string(&mut reply).unwrap();
                assert_eq!(reply, msg);
            })
        })
        .collect();
    for c in clients {
        c.join().unwrap();
    }

    let summary = server.join().unwrap().unwrap();
    assert_eq!(summary.total, 8);
    assert_eq!(summary.items_produced, 8);
    assert!(summary.queue.high_water <= 2);
}

#[test]
fn test_dispatch_zero_limit_returns_immediately() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let opts = DispatchOpts {
        max_connections: Some(0),
        ..Default::default()
    };
    let summary = within_budget(move || serve(listener, &opts, |_s: TcpStream| Ok(())).unwrap());
    assert_eq!(summary.total, 0);
}
