use std::sync::Mutex;

use crate::binding::ValueBinding;
use crate::store::NumericStore;

const LOW_THRESH_KEY: &str = "low_thresh";
const HI_THRESH_KEY: &str = "hi_thresh";

// Operating range of the DS18B20.
const DEFAULT_LOW_THRESH: f64 = -55.0;
const DEFAULT_HI_THRESH: f64 = 125.0;

/// The kind of alarm signaled by an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmKind {
    /// No alarm, or a condition that was already signaled.
    None,
    /// The measurement dropped to or below the low threshold.
    Low,
    /// The measurement rose to or above the high threshold.
    High,
}

#[derive(Debug)]
struct AlarmInner<S> {
    low_threshold: f64,
    high_threshold: f64,
    last_alarm: AlarmKind,
    store: S,
}

/// Edge-triggered threshold evaluator with persisted thresholds.
///
/// A sustained out-of-range condition signals once, on the transition into the
/// triggering region; the edge state re-arms when the measurement moves into a
/// different region or the thresholds change. Thresholds load from the
/// injected store at construction and persist on every update. No ordering
/// between the low and high thresholds is enforced.
///
/// All operations on one instance are mutually exclusive; the evaluator also
/// serves as the thresholds binding exposed to the presentation layer.
#[derive(Debug)]
pub struct Alarm<S> {
    inner: Mutex<AlarmInner<S>>,
}

impl<S: NumericStore> Alarm<S> {
    /// Creates an evaluator backed by `store`, loading persisted thresholds or
    /// falling back to the sensor's operating bounds.
    pub fn new(store: S) -> Self {
        let low_threshold = load_or_default(&store, LOW_THRESH_KEY, DEFAULT_LOW_THRESH);
        let high_threshold = load_or_default(&store, HI_THRESH_KEY, DEFAULT_HI_THRESH);
        Self {
            inner: Mutex::new(AlarmInner {
                low_threshold,
                high_threshold,
                last_alarm: AlarmKind::None,
                store,
            }),
        }
    }

    /// Returns the current `(low, high)` thresholds.
    pub fn thresholds(&self) -> (f64, f64) {
        let inner = self.inner.lock().unwrap();
        (inner.low_threshold, inner.high_threshold)
    }

    /// Replaces both thresholds, persists them and re-arms the edge state.
    ///
    /// A persistence failure is logged and does not abort the in-memory
    /// update. Re-arming means a fresh crossing alarms even if the thresholds
    /// are unchanged.
    pub fn set_thresholds(&self, low: f64, high: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.low_threshold = low;
        inner.high_threshold = high;
        persist(&mut inner.store, LOW_THRESH_KEY, low);
        persist(&mut inner.store, HI_THRESH_KEY, high);
        inner.last_alarm = AlarmKind::None;
    }

    /// Classifies a measurement against the thresholds.
    ///
    /// Returns [`AlarmKind::Low`] or [`AlarmKind::High`] only on the
    /// transition into that region; repeats of the recorded edge state and
    /// in-range measurements return [`AlarmKind::None`].
    pub fn evaluate(&self, measurement: f64) -> AlarmKind {
        let mut inner = self.inner.lock().unwrap();
        let new_alarm = if measurement <= inner.low_threshold {
            AlarmKind::Low
        } else if measurement >= inner.high_threshold {
            AlarmKind::High
        } else {
            AlarmKind::None
        };

        if new_alarm == inner.last_alarm {
            return AlarmKind::None;
        }
        // Record in-range readings too, so leaving a triggering region re-arms
        // the edge for the next crossing into it.
        inner.last_alarm = new_alarm;
        if new_alarm == AlarmKind::None {
            return AlarmKind::None;
        }
        new_alarm
    }
}

impl<S: NumericStore> ValueBinding<(f64, f64)> for Alarm<S> {
    fn get_value(&self) -> (f64, f64) {
        self.thresholds()
    }

    fn set_value(&self, (low, high): (f64, f64)) {
        self.set_thresholds(low, high);
    }
}

fn load_or_default<S: NumericStore>(store: &S, key: &str, default: f64) -> f64 {
    match store.get_numeric(key) {
        Some(bits) => f64::from_bits(bits),
        None => {
            log::info!("no stored value for {key}, using default {default}");
            default
        }
    }
}

fn persist<S: NumericStore>(store: &mut S, key: &str, value: f64) {
    if let Err(err) = store.set_numeric(key, value.to_bits()) {
        log::error!("failed to persist {key}: {err}");
    }
}
