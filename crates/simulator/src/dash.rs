//! Minimal line-oriented terminal dashboard.

use obelisk_kernel::{Dashboard, Step};
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicI64, Ordering};

/// Terminal dashboard: prints log lines prefixed with the current step and
/// blocks in [`run`](Dashboard::run) until the operator presses enter (or
/// stdin reaches EOF).
#[derive(Debug, Default)]
pub struct TermDashboard {
    step: AtomicI64,
}

impl TermDashboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last step published via [`set_step`](Dashboard::set_step).
    pub fn step(&self) -> Step {
        self.step.load(Ordering::Relaxed)
    }
}

impl Dashboard for TermDashboard {
    fn log(&self, line: &str) {
        println!("[{:>8}] {line}", self.step());
    }

    fn set_step(&self, step: Step) {
        self.step.store(step, Ordering::Relaxed);
    }

    fn run(&self) {
        println!("simulation running; press enter to exit");
        let mut line = String::new();
        let _ = io::stdin().lock().read_line(&mut line);
    }
}
