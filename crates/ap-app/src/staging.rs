// Tampon borné producteur → consommateur.
//
// Le canal flume fournit la contre-pression (envoi bloquant quand plein).
// Le seuil de préchargement est une porte à un coup : le producteur l'ouvre
// après `watermark` envois réussis, ou la ferme en se terminant.

use ap_core::frame::Bitmap;

use crate::stop::StopSignal;

/// Résultat d'un envoi côté producteur.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Push {
    Accepted,
    /// Stop signal tripped while waiting for room.
    Stopped,
    /// Consumer side is gone.
    Closed,
}

/// Résultat d'une lecture côté consommateur.
#[derive(Debug)]
pub enum Pull {
    Frame(Bitmap),
    /// Producer finished and the buffer is empty.
    Closed,
    Stopped,
}

/// Crée un tampon de capacité `capacity`, seuil de préchargement = capacité.
///
/// Une capacité nulle est ramenée à 1.
#[must_use]
pub fn staging_buffer(capacity: usize) -> (FrameSender, FrameReceiver) {
    let capacity = capacity.max(1);
    let (tx, rx) = flume::bounded(capacity);
    let (gate_tx, gate_rx) = flume::bounded(1);
    (
        FrameSender {
            tx,
            gate: Some(gate_tx),
            watermark: capacity,
            pushed: 0,
        },
        FrameReceiver { rx, gate: gate_rx },
    )
}

/// Côté producteur. Le drop ferme le tampon et la porte de préchargement.
pub struct FrameSender {
    tx: flume::Sender<Bitmap>,
    gate: Option<flume::Sender<()>>,
    watermark: usize,
    pushed: usize,
}

impl FrameSender {
    /// Envoie un bitmap, en bloquant tant que le tampon est plein.
    pub fn push(&mut self, bitmap: Bitmap, stop: &StopSignal) -> Push {
        if stop.is_tripped() {
            return Push::Stopped;
        }
        let outcome = flume::Selector::new()
            .send(&self.tx, bitmap, |res| match res {
                Ok(()) => Push::Accepted,
                Err(_) => Push::Closed,
            })
            .recv(stop.watch(), |_| Push::Stopped)
            .wait();

        if outcome == Push::Accepted {
            self.pushed += 1;
            if self.pushed >= self.watermark {
                if let Some(gate) = self.gate.take() {
                    log::debug!("préchargement atteint : {} frames", self.pushed);
                    let _ = gate.send(());
                }
            }
        }
        outcome
    }

    /// Nombre total de bitmaps acceptés.
    #[must_use]
    pub fn pushed(&self) -> usize {
        self.pushed
    }
}

/// Côté consommateur.
pub struct FrameReceiver {
    rx: flume::Receiver<Bitmap>,
    gate: flume::Receiver<()>,
}

impl FrameReceiver {
    /// Bloque jusqu'au seuil de préchargement ou la fin du producteur.
    ///
    /// Retourne `false` si le signal d'arrêt est déclenché avant.
    pub fn wait_primed(&self, stop: &StopSignal) -> bool {
        if stop.is_tripped() {
            return false;
        }
        flume::Selector::new()
            .recv(&self.gate, |_| true)
            .recv(stop.watch(), |_| false)
            .wait()
            && !stop.is_tripped()
    }

    /// Retire le prochain bitmap, en attendant brièvement si le tampon est vide.
    pub fn pull(&self, stop: &StopSignal) -> Pull {
        if stop.is_tripped() {
            return Pull::Stopped;
        }
        flume::Selector::new()
            .recv(&self.rx, |res| match res {
                Ok(bitmap) => Pull::Frame(bitmap),
                Err(_) => Pull::Closed,
            })
            .recv(stop.watch(), |_| Pull::Stopped)
            .wait()
    }

    /// Bitmaps actuellement en attente.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stop::StopReason;
    use std::thread;
    use std::time::{Duration, Instant};

    fn bmp(v: u8) -> Bitmap {
        Bitmap::filled(1, 1, (v, v, v))
    }

    fn value(pull: Pull) -> u8 {
        match pull {
            Pull::Frame(b) => b.pixel(0, 0).0,
            other => panic!("frame attendue, obtenu {other:?}"),
        }
    }

    #[test]
    fn primed_at_capacity_then_fifo_then_closed() {
        let stop = StopSignal::new();
        let (mut tx, rx) = staging_buffer(3);
        for v in 1..=3 {
            assert_eq!(tx.push(bmp(v), &stop), Push::Accepted);
        }
        assert!(rx.wait_primed(&stop));
        assert_eq!(rx.len(), 3);
        drop(tx);
        assert_eq!(value(rx.pull(&stop)), 1);
        assert_eq!(value(rx.pull(&stop)), 2);
        assert_eq!(value(rx.pull(&stop)), 3);
        assert!(matches!(rx.pull(&stop), Pull::Closed));
    }

    #[test]
    fn early_exhaustion_ends_priming() {
        let stop = StopSignal::new();
        let (mut tx, rx) = staging_buffer(50);
        tx.push(bmp(7), &stop);
        drop(tx);
        assert!(rx.wait_primed(&stop));
        assert_eq!(value(rx.pull(&stop)), 7);
        assert!(matches!(rx.pull(&stop), Pull::Closed));
    }

    #[test]
    fn empty_producer_ends_priming() {
        let stop = StopSignal::new();
        let (tx, rx) = staging_buffer(4);
        drop(tx);
        assert!(rx.wait_primed(&stop));
        assert!(matches!(rx.pull(&stop), Pull::Closed));
    }

    #[test]
    fn full_buffer_push_wakes_on_stop() {
        let stop = StopSignal::new();
        let (mut tx, rx) = staging_buffer(1);
        assert_eq!(tx.push(bmp(0), &stop), Push::Accepted);

        let remote = stop.clone();
        let producer = thread::spawn(move || {
            let start = Instant::now();
            let outcome = tx.push(bmp(1), &remote);
            (outcome, start.elapsed())
        });
        thread::sleep(Duration::from_millis(30));
        stop.trip(StopReason::UserRequested);
        let (outcome, waited) = producer.join().unwrap();
        assert_eq!(outcome, Push::Stopped);
        assert!(waited < Duration::from_secs(5));
        drop(rx);
    }

    #[test]
    fn priming_wakes_on_stop() {
        let stop = StopSignal::new();
        let (_tx, rx) = staging_buffer(8);
        let remote = stop.clone();
        let waiter = thread::spawn(move || rx.wait_primed(&remote));
        thread::sleep(Duration::from_millis(20));
        stop.trip(StopReason::UserRequested);
        assert!(!waiter.join().unwrap());
    }

    #[test]
    fn push_after_consumer_dropped_is_closed() {
        let stop = StopSignal::new();
        let (mut tx, rx) = staging_buffer(2);
        drop(rx);
        assert_eq!(tx.push(bmp(0), &stop), Push::Closed);
        assert_eq!(tx.pushed(), 0);
    }
}
