use std::fs;

use crate::pipeline::memory_monitor::MemoryMonitor;

const STATM_PATH: &str = "/proc/self/statm";
const PAGE_SIZE: u64 = 4096;

/// Reads resident set size from `/proc/self/statm`.
///
/// On platforms without procfs `usage_bytes` returns `None` and the
/// orchestrator skips its memory check.
pub struct ProcessMemoryMonitor;

impl ProcessMemoryMonitor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessMemoryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryMonitor for ProcessMemoryMonitor {
    fn usage_bytes(&self) -> Option<u64> {
        let statm = fs::read_to_string(STATM_PATH).ok()?;
        parse_resident_pages(&statm).map(|pages| pages * PAGE_SIZE)
    }

    fn reclaim(&self) {
        // Decoded buffers are dropped per batch; the allocator decides when
        // pages go back to the OS. Nothing further to release here.
        log::info!("Memory reclaim requested after feature batch");
    }
}

/// Second field of statm: resident pages.
fn parse_resident_pages(statm: &str) -> Option<u64> {
    statm.split_whitespace().nth(1)?.parse().ok()
}
