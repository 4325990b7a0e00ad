//! Bounded queue throughput and latency benchmark.
//!
//! Usage:
//!     cargo run --release --bin queue_bench
//!
//! Environment variables:
//!     PRODUCER_CPU=0  Pin producer to CPU 0 (default: 0)
//!     CONSUMER_CPU=2  Pin consumer to CPU 2 (default: 2)
//!     ITERATIONS=N    Items per run (default: 1 << 20)

use std::env;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use sluice::BoundedQueue;

const QUEUE_SIZE: usize = 1024;
const DEFAULT_ITERATIONS: usize = 1 << 20;
const MPMC_THREADS: usize = 4;

type Payload = u64;

fn env_usize(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

fn get_cpu_affinity() -> (Option<usize>, Option<usize>) {
    let producer_cpu = env_usize("PRODUCER_CPU").or(Some(0));
    let consumer_cpu = env_usize("CONSUMER_CPU").or(Some(2));
    (producer_cpu, consumer_cpu)
}

fn pin_to_cpu(cpu: Option<usize>) {
    if let Some(id) = cpu {
        core_affinity::set_for_current(core_affinity::CoreId { id });
    }
}

fn bench_throughput(iterations: usize, producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let queue = Arc::new(BoundedQueue::<Payload>::new(QUEUE_SIZE).unwrap());

    let consumer_queue = Arc::clone(&queue);
    let consumer = thread::spawn(move || {
        pin_to_cpu(consumer_cpu);
        for expected in 0..iterations as Payload {
            let value = consumer_queue.take().unwrap();
            if value != expected {
                panic!("Data corruption: expected {}, got {}", expected, value);
            }
        }
    });

    pin_to_cpu(producer_cpu);
    let start = Instant::now();

    for i in 0..iterations as Payload {
        queue.put(i).unwrap();
    }

    consumer.join().unwrap();
    let elapsed = start.elapsed();

    let ops_per_ms = iterations as u128 * 1_000_000 / elapsed.as_nanos().max(1);
    println!("1p1c: {} ops/ms", ops_per_ms);
}

fn bench_mpmc(iterations: usize) {
    let queue = Arc::new(BoundedQueue::<Payload>::new(QUEUE_SIZE).unwrap());
    let per_thread = iterations / MPMC_THREADS;

    let start = Instant::now();

    let producers: Vec<_> = (0..MPMC_THREADS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..per_thread as Payload {
                    queue.put(i).unwrap();
                }
            })
        })
        .collect();

    let consumers: Vec<_> = (0..MPMC_THREADS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                let mut sum = 0u64;
                for _ in 0..per_thread {
                    sum = sum.wrapping_add(queue.take().unwrap());
                }
                sum
            })
        })
        .collect();

    for p in producers {
        p.join().unwrap();
    }
    let total: u64 = consumers
        .into_iter()
        .map(|c| c.join().unwrap())
        .fold(0, u64::wrapping_add);
    let elapsed = start.elapsed();

    let n = per_thread as u64;
    let expected = (n * n.saturating_sub(1) / 2).wrapping_mul(MPMC_THREADS as u64);
    assert_eq!(total, expected, "items lost or duplicated");

    let ops_per_ms = (per_thread * MPMC_THREADS) as u128 * 1_000_000 / elapsed.as_nanos().max(1);
    println!("{MPMC_THREADS}p{MPMC_THREADS}c: {} ops/ms", ops_per_ms);
}

fn bench_rtt(iterations: usize, producer_cpu: Option<usize>, consumer_cpu: Option<usize>) {
    let ping = Arc::new(BoundedQueue::<Payload>::new(1).unwrap());
    let pong = Arc::new(BoundedQueue::<Payload>::new(1).unwrap());

    let responder = {
        let ping = Arc::clone(&ping);
        let pong = Arc::clone(&pong);
        thread::spawn(move || {
            pin_to_cpu(consumer_cpu);
            // Echo until the ping side closes.
            for value in ping.iter() {
                pong.put(value).unwrap();
            }
        })
    };

    pin_to_cpu(producer_cpu);
    let start = Instant::now();

    for i in 0..iterations as Payload {
        ping.put(i).unwrap();
        assert_eq!(pong.take().unwrap(), i);
    }

    let elapsed = start.elapsed();
    ping.close();
    responder.join().unwrap();

    let rtt_ns = elapsed.as_nanos() / iterations.max(1) as u128;
    println!("rtt: {} ns", rtt_ns);
}

fn main() {
    let (producer_cpu, consumer_cpu) = get_cpu_affinity();
    let iterations = env_usize("ITERATIONS").unwrap_or(DEFAULT_ITERATIONS);

    println!("sluice BoundedQueue (size={}, iters={}):", QUEUE_SIZE, iterations);
    bench_throughput(iterations, producer_cpu, consumer_cpu);
    bench_mpmc(iterations);
    bench_rtt(iterations / 16, producer_cpu, consumer_cpu);
}
