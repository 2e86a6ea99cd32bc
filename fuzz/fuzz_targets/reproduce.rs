use std::time::Instant;

use log::info;

#[path = "drive.rs"]
mod drive;

fn main() {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: reproduce <artifact-file>");
        std::process::exit(1);
    });

    let data = std::fs::read(&path).unwrap_or_else(|e| {
        eprintln!("Failed to read {path}: {e}");
        std::process::exit(1);
    });

    let iterations = std::env::var("ITERATIONS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1);

    eprintln!("=== Input: {} ({} bytes), {} iteration(s) ===", path, data.len(), iterations);

    for i in 0..iterations {
        let iter_start = Instant::now();
        drive::run(&data);
        info!(
            "iteration {}: total {:.1}ms",
            i,
            iter_start.elapsed().as_secs_f64() * 1000.0
        );
    }
}
