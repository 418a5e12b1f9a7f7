//! Piping Demo Binary
//!
//! Dua thread berbagi counter lewat pipe:
//! - async: satu pipe operasi
//! - sync: pipe operasi + pipe ack
//! - locked: baseline dengan Mutex
//!
//! Setiap mode pipe dijalankan dua kali: blocking lalu non-blocking.
//!
//! Usage:
//!   cargo run --release --bin piping_demo [OPTIONS]

use piping::demo::{self, expected_total, DemoConfig, Mode, PipeKind, RunReport};
use piping::WaitStrategy;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Demo configuration
struct CliConfig {
    modes: Vec<Mode>,
    demo: DemoConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            modes: vec![Mode::Locked, Mode::Async, Mode::Sync],
            demo: DemoConfig::default(),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("piping=info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .with_timer(fmt::time::uptime()),
        )
        .with(filter)
        .init();
}

fn print_report(mode: Mode, kind: Option<PipeKind>, iterations: u64, report: &RunReport) {
    let label = match kind {
        Some(kind) => format!("{} / {}", mode, kind),
        None => mode.to_string(),
    };
    let ns_per_iter = report.elapsed.as_nanos() as f64 / iterations.max(1) as f64;

    println!("📊 {}", label);
    println!("   Counter A:   {}", report.counter);
    println!("   Expected:    {}", expected_total(iterations));
    println!(
        "   Elapsed:     {:.2} ms ({:.2} ns/iter)",
        report.elapsed.as_secs_f64() * 1000.0,
        ns_per_iter
    );
    for failure in &report.failures {
        println!("   ⚠️  {}", failure);
    }
    if report.is_complete(iterations) {
        println!("   ✅ All messages delivered\n");
    } else {
        println!("   ❌ Run incomplete\n");
    }
}

fn run_mode(mode: Mode, config: &DemoConfig) -> Result<(), demo::DemoError> {
    if mode == Mode::Locked {
        let report = demo::run(mode, PipeKind::Blocking, config)?;
        print_report(mode, None, config.iterations, &report);
        return Ok(());
    }

    let report = demo::run(mode, PipeKind::Blocking, config)?;
    print_report(mode, Some(PipeKind::Blocking), config.iterations, &report);

    println!("Now if you use a non-blocking pipe of course it fails...\n");

    let report = demo::run(mode, PipeKind::NonBlocking, config)?;
    print_report(mode, Some(PipeKind::NonBlocking), config.iterations, &report);

    Ok(())
}

fn print_help() {
    println!("Piping Demo - Allocation-Free Message Pipes\n");
    println!("Usage: piping_demo [OPTIONS]\n");
    println!("Options:");
    println!("  -m, --mode <MODE>        async | sync | locked (default: all)");
    println!("  -n, --iterations <N>     Iterations per run (default: 10000000)");
    println!("  -c, --capacity <N>       Operation pipe capacity (default: 1024)");
    println!("  -w, --wait <STRATEGY>    spin | backoff (default: spin)");
    println!("  -p, --pin <A,B>          Pin thread A and B to these cores");
    println!("  -h, --help               Show this help");
}

fn parse_pin(value: &str) -> Option<(usize, usize)> {
    let (a, b) = value.split_once(',')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}

fn parse_args() -> CliConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--mode" | "-m" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse() {
                        Ok(mode) => config.modes = vec![mode],
                        Err(e) => eprintln!("⚠️ {}", e),
                    }
                    i += 1;
                }
            }
            "--iterations" | "-n" => {
                if i + 1 < args.len() {
                    config.demo.iterations = args[i + 1].parse().unwrap_or(10_000_000);
                    i += 1;
                }
            }
            "--capacity" | "-c" => {
                if i + 1 < args.len() {
                    config.demo.capacity = args[i + 1].parse().unwrap_or(1024);
                    i += 1;
                }
            }
            "--wait" | "-w" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse::<WaitStrategy>() {
                        Ok(wait) => config.demo.wait = wait,
                        Err(e) => eprintln!("⚠️ {}", e),
                    }
                    i += 1;
                }
            }
            "--pin" | "-p" => {
                if i + 1 < args.len() {
                    config.demo.pin = parse_pin(&args[i + 1]);
                    if config.demo.pin.is_none() {
                        eprintln!("⚠️ --pin expects two core ids, e.g. 2,3");
                    }
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {}
        }
        i += 1;
    }

    config
}

fn main() {
    let config = parse_args();
    init_tracing();

    println!("🚀 Piping Demo");
    println!("==============\n");

    for mode in &config.modes {
        if let Err(e) = run_mode(*mode, &config.demo) {
            eprintln!("❌ Demo error: {}", e);
            std::process::exit(1);
        }
    }
}
