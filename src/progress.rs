/// Observer for long-running per-file work. All methods default to no-ops.
pub trait Progress {
    fn begin(&mut self, _total: usize) {}
    fn step(&mut self, _label: &str) {}
    fn finish(&mut self) {}
}

/// Reports nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {}
