//! Producer/consumer simulation.
//!
//! Runs producers and consumers against one bounded queue and prints a report
//! when they stop. Without `--items` or `--duration` it runs until killed.
//!
//! # Usage
//!
//! ```sh
//! pc_sim --capacity 10 --produce-ms 2000 --consume-ms 3000
//! pc_sim -p 4 -n 2 --items 100 --produce-ms 5 --consume-ms 10
//! ```
//!
//! Build with `--features tracing` to see every produced and packed item.

use std::time::Duration;

use sluice::sim::{SimConfig, SimError, SimReport, Simulation};

/// Error running the simulation binary.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("{0} worker thread(s) panicked; totals are incomplete")]
    WorkersPanicked(usize),
}

/// How the run ends.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Stop {
    /// Producers stop after their quota.
    Quota,
    /// Shut down after a fixed wall-clock time.
    After(Duration),
    /// Run until the process is killed.
    Never,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("pc_sim: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), CliError> {
    let args: Vec<String> = std::env::args().collect();
    let (config, stop) = parse_args(&args)?;

    sluice::init_tracing();

    eprintln!(
        "pc_sim: capacity {}, {} producer(s), {} consumer(s)",
        config.capacity, config.producers, config.consumers
    );

    let sim = Simulation::spawn(config)?;

    let report = match stop {
        Stop::Quota => sim.join(),
        Stop::After(duration) => {
            std::thread::sleep(duration);
            eprintln!("pc_sim: time is up, shutting down");
            sim.shutdown()
        }
        Stop::Never => loop {
            // Run until killed.
            std::thread::sleep(Duration::from_secs(3600));
        },
    };

    print_report(&report);
    if !report.is_clean() {
        return Err(CliError::WorkersPanicked(report.panicked));
    }
    Ok(())
}

fn print_report(report: &SimReport) {
    let latency = report.latency_summary();
    println!("produced:  {}", report.produced);
    println!("consumed:  {}", report.consumed);
    if report.panicked > 0 {
        println!("panicked:  {}", report.panicked);
    }
    for (producer, seqs) in report.packed.iter().enumerate() {
        println!("producer {producer}: {} item(s) packed", seqs.len());
    }
    println!(
        "latency:   mean {:.3}s, std dev {:.3}s, mode {:.3}s over {} item(s)",
        latency.mean, latency.std_dev, latency.mode, latency.count
    );
}

/// Parses command line arguments into a config and stop condition.
fn parse_args(args: &[String]) -> Result<(SimConfig, Stop), CliError> {
    let mut config = SimConfig::default();
    let mut duration: Option<Duration> = None;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        match flag {
            "--capacity" | "-c" => config.capacity = value(args, &mut i, flag)?,
            "--producers" | "-p" => config.producers = value(args, &mut i, flag)?,
            "--consumers" | "-n" => config.consumers = value(args, &mut i, flag)?,
            "--items" | "-i" => config.items_per_producer = Some(value(args, &mut i, flag)?),
            "--produce-ms" => {
                config.produce_delay = Duration::from_millis(value(args, &mut i, flag)?);
            }
            "--consume-ms" => {
                config.consume_delay = Duration::from_millis(value(args, &mut i, flag)?);
            }
            "--jitter" => config.jitter = value(args, &mut i, flag)?,
            "--duration" | "-d" => {
                duration = Some(Duration::from_secs(value(args, &mut i, flag)?));
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg => return Err(CliError::Usage(format!("unknown argument: {arg}"))),
        }
        i += 1;
    }

    let stop = match (duration, config.items_per_producer) {
        (Some(d), _) => Stop::After(d),
        (None, Some(_)) => Stop::Quota,
        (None, None) => Stop::Never,
    };
    Ok((config, stop))
}

/// Consumes and parses the value following `flag`.
fn value<T: std::str::FromStr>(args: &[String], i: &mut usize, flag: &str) -> Result<T, CliError>
where
    T::Err: std::fmt::Display,
{
    *i += 1;
    let raw = args
        .get(*i)
        .ok_or_else(|| CliError::Usage(format!("missing value for {flag}")))?;
    raw.parse()
        .map_err(|e| CliError::Usage(format!("invalid value for {flag}: {raw}: {e}")))
}

fn print_usage() {
    eprintln!(
        r#"pc_sim - bounded queue producer/consumer simulation

USAGE:
    pc_sim [OPTIONS]

OPTIONS:
    -c, --capacity <N>      Queue capacity (default: 10)
    -p, --producers <N>     Producer threads (default: 1)
    -n, --consumers <N>     Consumer threads (default: 1)
    -i, --items <N>         Items per producer, then drain and exit (default: unlimited)
        --produce-ms <MS>   Time to produce one item (default: 2000)
        --consume-ms <MS>   Time to pack one item (default: 3000)
        --jitter <FRAC>     Random extra delay, as a fraction of the base (default: 0)
    -d, --duration <SECS>   Shut down after this many seconds
    -h, --help              Print this help message

EXAMPLE:
    pc_sim --capacity 10
    pc_sim -p 4 -n 2 --items 100 --produce-ms 5 --consume-ms 10
"#
    );
}
