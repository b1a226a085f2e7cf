//! Transient status banner: `hidden -> shown -> hidden`.
//!
//! Each `show` replaces the message and re-arms a single-shot dismiss timer.
//! There is no queue; the last notification wins.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use crate::models::notification::{NotificationCategory, NotificationState};
use crate::scheduler::TaskHandle;

pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

/// State shared with the dismiss timer. The timer only holds this half, so
/// dropping the banner itself releases the timer handle and aborts it.
struct Shared {
    state: watch::Sender<NotificationState>,
    generation: AtomicU64,
    auto_dismissals: AtomicU64,
}

impl Shared {
    fn expire(&self, generation: u64) {
        // A newer show or dismiss owns the banner now.
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        let hidden = self.state.send_if_modified(|s| {
            let was_visible = s.visible;
            s.visible = false;
            was_visible
        });
        if hidden {
            self.auto_dismissals.fetch_add(1, Ordering::SeqCst);
            debug!(generation, "Notification auto-dismissed");
        }
    }
}

struct Inner {
    duration: Duration,
    shared: Arc<Shared>,
    timer: Mutex<Option<TaskHandle>>,
}

#[derive(Clone)]
pub struct NotificationBanner {
    inner: Arc<Inner>,
}

impl NotificationBanner {
    pub fn new(duration: Duration) -> Self {
        let (state, _) = watch::channel(NotificationState::default());
        Self {
            inner: Arc::new(Inner {
                duration,
                shared: Arc::new(Shared {
                    state,
                    generation: AtomicU64::new(0),
                    auto_dismissals: AtomicU64::new(0),
                }),
                timer: Mutex::new(None),
            }),
        }
    }

    pub fn duration(&self) -> Duration {
        self.inner.duration
    }

    /// Shows `message`, cancelling any pending dismiss and restarting the timer.
    /// Must be called from within a tokio runtime.
    pub fn show(&self, message: impl Into<String>, category: NotificationCategory) {
        let shared = &self.inner.shared;
        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        shared
            .state
            .send_replace(NotificationState::shown(message, category));

        let timer_shared = Arc::clone(shared);
        let timer = TaskHandle::after(self.inner.duration, async move {
            timer_shared.expire(generation);
        });

        debug!(
            generation,
            %category,
            duration_ms = self.inner.duration.as_millis() as u64,
            "Notification shown"
        );
        // The replaced handle is dropped here, which aborts it.
        let _previous = self.lock_timer().replace(timer);
    }

    /// Hides immediately and cancels the pending timer.
    pub fn dismiss(&self) {
        let shared = &self.inner.shared;
        shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(mut timer) = self.lock_timer().take() {
            timer.cancel();
        }
        shared.state.send_if_modified(|s| {
            let was_visible = s.visible;
            s.visible = false;
            was_visible
        });
    }

    pub fn state(&self) -> NotificationState {
        self.inner.shared.state.borrow().clone()
    }

    pub fn is_visible(&self) -> bool {
        self.inner.shared.state.borrow().visible
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationState> {
        self.inner.shared.state.subscribe()
    }

    /// Number of times the timer, not a caller, hid the banner.
    pub fn auto_dismissals(&self) -> u64 {
        self.inner.shared.auto_dismissals.load(Ordering::SeqCst)
    }

    fn lock_timer(&self) -> std::sync::MutexGuard<'_, Option<TaskHandle>> {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NotificationBanner {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION)
    }
}
