/// Reports process memory use and accepts reclaim hints.
///
/// The orchestrator checks usage after every feature batch and sends a
/// reclaim hint when it crosses the configured threshold.
pub trait MemoryMonitor: Send + Sync {
    /// Current resident memory in bytes, or `None` when it cannot be measured.
    fn usage_bytes(&self) -> Option<u64>;

    /// Ask the process to give memory back. Default: no-op.
    fn reclaim(&self) {}
}
