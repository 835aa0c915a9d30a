/// Runtime configuration options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Largest region a single ALLOCATE_* command may request.
    pub max_region_bytes: usize,
    /// Log the bytes produced by READ_DATA at info level.
    pub log_reads: bool,
}

impl RuntimeConfig {
    pub const DEFAULT_MAX_REGION_BYTES: usize = 1 << 30;
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_region_bytes: Self::DEFAULT_MAX_REGION_BYTES,
            log_reads: true,
        }
    }
}
