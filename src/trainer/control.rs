use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flags of a training session.
///
/// Cloning shares the flags, so a status sink, a signal handler or a test can
/// stop or pause a running session. The handler reads them once per epoch.
#[derive(Clone, Debug)]
pub struct TrainingControl {
    training: Arc<AtomicBool>,
    save: Arc<AtomicBool>,
}

impl TrainingControl {
    pub fn new() -> Self {
        TrainingControl {
            training: Arc::new(AtomicBool::new(false)),
            save: Arc::new(AtomicBool::new(true)),
        }
    }

    pub(crate) fn start(&self) {
        self.save.store(true, Ordering::SeqCst);
        self.training.store(true, Ordering::SeqCst);
    }

    /// End the session after the current epoch without a final checkpoint.
    pub fn stop(&self) {
        self.save.store(false, Ordering::SeqCst);
        self.training.store(false, Ordering::SeqCst);
    }

    /// End the session after the current epoch and keep a final checkpoint.
    pub fn pause(&self) {
        self.save.store(true, Ordering::SeqCst);
        self.training.store(false, Ordering::SeqCst);
    }

    pub fn is_training(&self) -> bool {
        self.training.load(Ordering::SeqCst)
    }

    pub fn should_save(&self) -> bool {
        self.save.load(Ordering::SeqCst)
    }
}

impl Default for TrainingControl {
    fn default() -> Self {
        Self::new()
    }
}
