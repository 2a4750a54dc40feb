//! Terminal output for grassai
//!
//! All user-facing printing goes through here so one-shot and interactive
//! modes look the same. Colors are dropped automatically when stdout is
//! not a terminal (pipes, scripts).

use grassai_common::exec::ExecutionReport;
use grassai_common::grass::EnvironmentSnapshot;
use grassai_common::GrassAiError;
use owo_colors::OwoColorize;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Braille spinner frames for smooth animation
const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Spinner update interval (ms)
const SPINNER_INTERVAL_MS: u64 = 200;

const RULE: &str = "──────────────────────────────────────────────────────────────────────";

fn use_color() -> bool {
    io::stdout().is_terminal()
}

/// Spinner shown while waiting on the model
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
    start_time: Instant,
    is_tty: bool,
}

impl Spinner {
    /// Start a new spinner with message
    pub fn new(message: &str) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();
        let message = message.to_string();
        let is_tty = io::stdout().is_terminal();

        // For non-TTY output just print once without animation
        if !is_tty {
            println!("[grassai]  ... {}", message);
            return Self {
                running,
                handle: None,
                start_time: Instant::now(),
                is_tty: false,
            };
        }

        print!(
            "\r{}  {} {}",
            "[grassai]".bright_cyan(),
            SPINNER_FRAMES[0].bright_yellow(),
            message.dimmed()
        );
        let _ = io::stdout().flush();

        let handle = std::thread::spawn(move || {
            let mut frame = 0;
            while running_clone.load(Ordering::Relaxed) {
                frame = (frame + 1) % SPINNER_FRAMES.len();
                print!(
                    "\r{}  {} {}",
                    "[grassai]".bright_cyan(),
                    SPINNER_FRAMES[frame].bright_yellow(),
                    message.dimmed()
                );
                let _ = io::stdout().flush();
                std::thread::sleep(Duration::from_millis(SPINNER_INTERVAL_MS));
            }
        });

        Self {
            running,
            handle: Some(handle),
            start_time: Instant::now(),
            is_tty,
        }
    }

    /// Stop the spinner, clear its line, return elapsed time
    pub fn stop(mut self) -> Duration {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        let elapsed = self.start_time.elapsed();

        if self.is_tty {
            print!("\r{}\r", " ".repeat(80));
            let _ = io::stdout().flush();
        }

        elapsed
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

pub fn print_question(question: &str) {
    if use_color() {
        println!("{}  {}", "[you]".bright_green(), question);
    } else {
        println!("[you]  {}", question);
    }
}

/// Print the model's completion between horizontal rules.
pub fn print_response(response: &str, elapsed: Duration) {
    println!();
    if use_color() {
        println!("{}", RULE.dimmed());
        println!(
            "{}  {}",
            "[grassai]".bright_cyan(),
            format!("({:.1}s)", elapsed.as_secs_f64()).dimmed()
        );
        println!("{}", RULE.dimmed());
    } else {
        println!("{}", RULE);
        println!("[grassai]  ({:.1}s)", elapsed.as_secs_f64());
        println!("{}", RULE);
    }
    println!("{}", response.trim());
    if use_color() {
        println!("{}", RULE.dimmed());
    } else {
        println!("{}", RULE);
    }
    println!();
}

pub fn info(message: &str) {
    if use_color() {
        println!("{}  {}", "[grassai]".bright_cyan(), message);
    } else {
        println!("[grassai]  {}", message);
    }
}

pub fn warning(message: &str) {
    if use_color() {
        eprintln!("{}  {}", "[warn]".bright_yellow(), message);
    } else {
        eprintln!("[warn]  {}", message);
    }
}

pub fn print_error(error: &GrassAiError) {
    if io::stderr().is_terminal() {
        eprintln!("{}  {}", "[error]".bright_red(), error);
    } else {
        eprintln!("[error]  {}", error);
    }
}

/// Render everything the executor did.
pub fn print_execution_report(report: &ExecutionReport) {
    for (i, outcome) in report.outcomes.iter().enumerate() {
        println!();
        let header = format!("{}. {}", i + 1, outcome.command);
        if use_color() {
            println!("{}", header.bold());
        } else {
            println!("{}", header);
        }

        let status_line = format!(
            "{} (exit {}, {} ms)",
            outcome.status.as_str(),
            outcome.exit_code,
            outcome.duration_ms
        );
        if outcome.succeeded() {
            if use_color() {
                println!("   {} {}", "✓".bright_green(), status_line);
            } else {
                println!("   OK {}", status_line);
            }
        } else if use_color() {
            println!("   {} {}", "✗".bright_red(), status_line);
        } else {
            println!("   FAILED {}", status_line);
        }

        if !outcome.stdout.trim().is_empty() {
            println!("{}", outcome.stdout.trim_end());
            if outcome.stdout_truncated {
                warning("stdout truncated at 64 KiB");
            }
        }
        if !outcome.stderr.trim().is_empty() {
            eprintln!("{}", outcome.stderr.trim_end());
            if outcome.stderr_truncated {
                warning("stderr truncated at 64 KiB");
            }
        }
    }

    for line in &report.skipped {
        if use_color() {
            println!("   {} skipped: {}", "-".dimmed(), line);
        } else {
            println!("   skipped: {}", line);
        }
    }
    println!();
}

/// The -s flag: show the probed GRASS environment and exit.
pub fn print_system_info(snapshot: &EnvironmentSnapshot) {
    info("GRASS environment");
    println!(
        "  GRASS version: {}",
        snapshot.grass_version.as_deref().unwrap_or("unknown")
    );
    println!("  Database:      {}", snapshot.database);
    println!("  Location:      {}", snapshot.location);
    println!("  Mapset:        {}", snapshot.mapset);
    match &snapshot.region {
        Some(r) => println!(
            "  Region:        {} rows x {} cols ({} x {} resolution)",
            r.rows, r.cols, r.nsres, r.ewres
        ),
        None => println!("  Region:        not available"),
    }
    println!(
        "  Raster maps:   {} listed",
        snapshot.raster_maps.len()
    );
    println!(
        "  Vector maps:   {} listed",
        snapshot.vector_maps.len()
    );
    println!(
        "  GDAL tools:    {}",
        if snapshot.gdal_tools.is_empty() {
            "none".to_string()
        } else {
            snapshot.gdal_tools.join(", ")
        }
    );
}

/// Interactive-mode welcome
pub fn print_repl_welcome(model: &str) {
    println!();
    info(&format!("Interactive session using {model}"));
    info("Type 'close' (or 'quit', 'exit', 'q') to return to the GRASS shell.");
    println!();
}

pub fn print_prompt() {
    if use_color() {
        print!("{} ", "grassai>".bright_green());
    } else {
        print!("grassai> ");
    }
    let _ = io::stdout().flush();
}
