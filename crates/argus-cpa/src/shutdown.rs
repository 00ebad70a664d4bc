use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between a driver and the algorithm.
///
/// The algorithm polls it at the top of every iteration and before every
/// transfer; requesting shutdown never interrupts an operator mid-call.
#[derive(Debug, Clone, Default)]
pub struct ShutdownNotifier {
    requested: Arc<AtomicBool>,
}

impl ShutdownNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_shutdown(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let notifier = ShutdownNotifier::new();
        let driver = notifier.clone();
        assert!(!notifier.is_shutdown_requested());
        driver.request_shutdown();
        assert!(notifier.is_shutdown_requested());
    }
}
