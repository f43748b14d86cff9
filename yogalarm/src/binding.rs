use std::sync::Mutex;

/// Read/write access to one value shared across thread boundaries.
///
/// Last write wins; readers always see the most recent completed write, never
/// a torn one. There is no history and no versioning.
pub trait ValueBinding<T> {
    /// Returns a copy of the current value.
    fn get_value(&self) -> T;
    /// Replaces the current value.
    fn set_value(&self, value: T);
}

/// A mutex-guarded slot holding a single value.
#[derive(Debug)]
pub struct SharedSlot<T> {
    current: Mutex<T>,
}

impl<T> SharedSlot<T> {
    /// Creates a slot holding `initial`.
    pub fn new(initial: T) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }
}

impl<T: Clone> ValueBinding<T> for SharedSlot<T> {
    fn get_value(&self) -> T {
        self.current.lock().unwrap().clone()
    }

    fn set_value(&self, value: T) {
        *self.current.lock().unwrap() = value;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::{SharedSlot, ValueBinding};

    #[test]
    fn last_write_wins() {
        let slot = SharedSlot::new(0.0_f64);
        slot.set_value(21.5);
        slot.set_value(22.0);
        assert_eq!(slot.get_value(), 22.0);
    }

    #[test]
    fn value_crosses_threads() {
        let slot = Arc::new(SharedSlot::new(None::<f64>));
        let writer = Arc::clone(&slot);
        thread::spawn(move || writer.set_value(Some(36.6)))
            .join()
            .unwrap();
        assert_eq!(slot.get_value(), Some(36.6));
    }
}
