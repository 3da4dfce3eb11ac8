//! Sweep statistics and process memory reporting.

use std::time::{Duration, Instant};

use knights_core::{SearchReport, Square, Status};

/// Resident set size of this process in bytes, if the platform reports it.
#[cfg(target_os = "macos")]
pub fn get_memory_usage() -> Option<u64> {
    use std::mem::MaybeUninit;

    extern "C" {
        fn mach_task_self() -> u32;
        fn task_info(task: u32, flavor: i32, info: *mut libc::c_void, count: *mut u32) -> i32;
    }

    #[repr(C)]
    struct TaskBasicInfo {
        suspend_count: i32,
        virtual_size: u64,
        resident_size: u64,
        user_time: (i32, i32),
        system_time: (i32, i32),
        policy: i32,
    }

    const TASK_BASIC_INFO_64: i32 = 5;
    const TASK_BASIC_INFO_64_COUNT: u32 = 10;

    let mut info = MaybeUninit::<TaskBasicInfo>::uninit();
    let mut count = TASK_BASIC_INFO_64_COUNT;
    // SAFETY: `info` is large enough for TASK_BASIC_INFO_64 and is only read on success.
    unsafe {
        let result = task_info(
            mach_task_self(),
            TASK_BASIC_INFO_64,
            info.as_mut_ptr() as *mut libc::c_void,
            &mut count,
        );
        (result == 0).then(|| info.assume_init().resident_size)
    }
}

#[cfg(target_os = "linux")]
pub fn get_memory_usage() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find_map(|line| line.strip_prefix("VmRSS:"))?;
    let kb: u64 = line.split_whitespace().next()?.parse().ok()?;
    Some(kb * 1024)
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
pub fn get_memory_usage() -> Option<u64> {
    None
}

/// Format bytes as human-readable string.
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Totals over a sweep of start squares.
#[derive(Debug, Default)]
pub struct SweepStats {
    pub searches: u64,
    pub found: u64,
    pub not_found: u64,
    pub timed_out: u64,

    /// Frames entered across all searches
    pub nodes: u64,
    pub backtracks: u64,

    /// Slowest single search
    pub slowest: Duration,
    pub slowest_start: Option<Square>,

    /// For rate calculation
    start_time: Option<Instant>,
}

impl SweepStats {
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Record the outcome of one search
    pub fn record(&mut self, start: Square, report: &SearchReport) {
        self.searches += 1;
        match report.status {
            Status::Found => self.found += 1,
            Status::NotFound => self.not_found += 1,
            Status::TimedOut => self.timed_out += 1,
        }
        self.nodes += report.stats.nodes;
        self.backtracks += report.stats.backtracks;
        if report.stats.elapsed >= self.slowest {
            self.slowest = report.stats.elapsed;
            self.slowest_start = Some(start);
        }
    }

    /// Get current nodes per second
    pub fn nodes_per_sec(&self) -> f64 {
        if let Some(start) = self.start_time {
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                return self.nodes as f64 / elapsed;
            }
        }
        0.0
    }

    /// Log a one-line progress report
    pub fn log_progress(&self, total: usize) {
        let elapsed_total = self.start_time.map(|s| s.elapsed().as_secs()).unwrap_or(0);
        let mem_str = get_memory_usage()
            .map(|m| format!(" mem={}", format_bytes(m)))
            .unwrap_or_default();

        log::info!(
            "[{:02}:{:02}:{:02}] searches={}/{} found={} timed_out={} not_found={} nodes={} rate={:.0}/s{}",
            elapsed_total / 3600,
            (elapsed_total % 3600) / 60,
            elapsed_total % 60,
            self.searches,
            total,
            self.found,
            self.timed_out,
            self.not_found,
            self.nodes,
            self.nodes_per_sec(),
            mem_str,
        );
    }

    /// Print final summary
    pub fn print_summary(&self) {
        println!("Searches: {}", self.searches);
        println!("  - Found: {}", self.found);
        println!("  - Not found: {}", self.not_found);
        println!("  - Timed out: {}", self.timed_out);
        println!("Nodes: {}", self.nodes);
        println!("Backtracks: {}", self.backtracks);
        if let Some(start) = self.slowest_start {
            println!("Slowest: {} ({:.3}s)", start, self.slowest.as_secs_f64());
        }

        if let Some(start) = self.start_time {
            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                println!("Average rate: {:.0} nodes/sec", self.nodes as f64 / elapsed);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knights_core::SearchStats;

    fn report(status: Status, nodes: u64, millis: u64) -> SearchReport {
        SearchReport {
            status,
            stats: SearchStats {
                nodes,
                backtracks: nodes / 2,
                max_depth: 10,
                elapsed: Duration::from_millis(millis),
            },
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
        assert_eq!(format_bytes(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_record_counts_statuses() {
        let mut stats = SweepStats::new();
        stats.record(Square(0), &report(Status::Found, 64, 1));
        stats.record(Square(27), &report(Status::TimedOut, 1_000, 50));
        stats.record(Square(1), &report(Status::Found, 80, 2));

        assert_eq!(stats.searches, 3);
        assert_eq!(stats.found, 2);
        assert_eq!(stats.timed_out, 1);
        assert_eq!(stats.not_found, 0);
        assert_eq!(stats.nodes, 1_144);
        assert_eq!(stats.backtracks, 32 + 500 + 40);
        assert_eq!(stats.slowest_start, Some(Square(27)));
        assert_eq!(stats.slowest, Duration::from_millis(50));
    }
}
