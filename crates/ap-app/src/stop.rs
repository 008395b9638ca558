use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Instant;

use ap_core::error::PlayerError;

/// Cause de l'arrêt d'une session de lecture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// The stream ended and every buffered frame was shown.
    SourceExhausted,
    /// Enter, q, Esc or Ctrl-C.
    UserRequested,
    /// Rasterizer, surface or input failure.
    Failed(PlayerError),
}

struct Inner {
    reason: OnceLock<StopReason>,
    /// Dropped on the first trip: every `watch` receiver then reports disconnection.
    trigger: Mutex<Option<flume::Sender<()>>>,
    watch: flume::Receiver<()>,
}

/// Signal d'arrêt partagé, déclenché une seule fois.
///
/// Producteur, consommateur et thread d'écoute en gardent chacun un clone.
/// `trip` est idempotent : seul le premier appel fixe la raison.
///
/// # Example
/// ```ignore
/// let stop = StopSignal::new();
/// assert!(stop.trip(StopReason::UserRequested));
/// assert!(!stop.trip(StopReason::SourceExhausted));
/// assert_eq!(stop.reason(), Some(StopReason::UserRequested));
/// ```
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<Inner>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = flume::bounded(0);
        Self {
            inner: Arc::new(Inner {
                reason: OnceLock::new(),
                trigger: Mutex::new(Some(tx)),
                watch: rx,
            }),
        }
    }

    /// Déclenche le signal. Retourne `true` si cet appel l'a déclenché.
    pub fn trip(&self, reason: StopReason) -> bool {
        let first = self.inner.reason.set(reason).is_ok();
        if first {
            log::debug!("arrêt : {:?}", self.inner.reason.get());
            self.inner
                .trigger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
        }
        first
    }

    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.inner.reason.get().is_some()
    }

    #[must_use]
    pub fn reason(&self) -> Option<StopReason> {
        self.inner.reason.get().cloned()
    }

    /// Receiver that becomes disconnected once the signal trips.
    ///
    /// Meant for `flume::Selector`, so a blocked channel operation also wakes on stop.
    pub(crate) fn watch(&self) -> &flume::Receiver<()> {
        &self.inner.watch
    }

    /// Attend jusqu'à `deadline` ou jusqu'au déclenchement.
    ///
    /// Retourne `true` si le signal est déclenché.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        if self.is_tripped() {
            return true;
        }
        // Nothing is ever sent: a return means timeout or disconnection.
        let _ = self.inner.watch.recv_deadline(deadline);
        self.is_tripped()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn trip_is_idempotent() {
        let stop = StopSignal::new();
        assert!(!stop.is_tripped());
        assert!(stop.trip(StopReason::UserRequested));
        assert!(!stop.trip(StopReason::SourceExhausted));
        assert!(!stop.trip(StopReason::Failed(PlayerError::DecodeCorrupt("x".into()))));
        assert_eq!(stop.reason(), Some(StopReason::UserRequested));
    }

    #[test]
    fn wait_times_out_when_untripped() {
        let stop = StopSignal::new();
        let start = Instant::now();
        assert!(!stop.wait_until(Instant::now() + Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn waiter_wakes_on_trip() {
        let stop = StopSignal::new();
        let remote = stop.clone();
        let waiter = thread::spawn(move || {
            let start = Instant::now();
            let tripped = remote.wait_until(start + Duration::from_secs(10));
            (tripped, start.elapsed())
        });
        thread::sleep(Duration::from_millis(20));
        stop.trip(StopReason::SourceExhausted);
        let (tripped, waited) = waiter.join().unwrap();
        assert!(tripped);
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn concurrent_trips_set_one_reason() {
        let stop = StopSignal::new();
        let winners: usize = (0..8)
            .map(|i| {
                let s = stop.clone();
                thread::spawn(move || {
                    let reason = if i % 2 == 0 {
                        StopReason::UserRequested
                    } else {
                        StopReason::SourceExhausted
                    };
                    usize::from(s.trip(reason))
                })
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap())
            .sum();
        assert_eq!(winners, 1);
        assert!(stop.is_tripped());
    }
}
