use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwapOption;

use crate::curve::Curve;

/// FIFO borné des dernières courbes, plus la dernière courbe seule pour
/// les lecteurs basse latence.
///
/// Écrit uniquement par la boucle d'acquisition ; lu par des consommateurs
/// arbitraires (UI, streaming) qui reçoivent des copies, jamais des
/// références vivantes. `latest()` ne prend aucun verrou.
///
/// # Example
/// ```
/// use pt_core::store::CurveStore;
/// use pt_core::curve::Curve;
///
/// let store = CurveStore::new(100);
/// store.push(Curve::new(0.0, vec![1.0; 25], 3.0));
/// assert_eq!(store.len(), 1);
/// assert!(store.latest().is_some());
/// ```
pub struct CurveStore {
    buffer: Mutex<VecDeque<Arc<Curve>>>,
    latest: ArcSwapOption<Curve>,
    capacity: usize,
}

impl CurveStore {
    /// Create a store holding at most `capacity` curves.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            latest: ArcSwapOption::empty(),
            capacity: capacity.max(1),
        }
    }

    /// Append a curve, evicting the oldest when at capacity.
    pub fn push(&self, curve: Curve) {
        let curve = Arc::new(curve);
        let mut buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(Arc::clone(&curve));
        drop(buffer);
        self.latest.store(Some(curve));
    }

    /// The most recent curve, without touching the FIFO lock.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<Curve>> {
        self.latest.load_full()
    }

    /// Copy-out of the whole buffer, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Curve>> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Drop every stored curve and the latest reference.
    pub fn clear(&self) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.latest.store(None);
    }

    /// Number of curves currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// `true` when no curve is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of buffered curves.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
