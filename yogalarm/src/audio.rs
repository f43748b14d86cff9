use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

// Bound on the idle wait so the worker stays responsive to shutdown even if a
// wakeup is missed.
const IDLE_RECHECK: Duration = Duration::from_secs(5);

const TONE_DUTY_PERCENT: u8 = 50;

/// One tone or rest in a playback sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Beep {
    /// How long the segment plays.
    pub duration: Duration,
    /// Tone frequency; zero or negative means silence.
    pub frequency_hz: i32,
}

impl Beep {
    /// A tone segment.
    pub const fn tone(duration: Duration, frequency_hz: i32) -> Self {
        Self {
            duration,
            frequency_hz,
        }
    }

    /// A rest segment of the given duration.
    pub const fn rest(duration: Duration) -> Self {
        Self {
            duration,
            frequency_hz: -1,
        }
    }

    /// Whether this segment is a rest.
    pub fn is_silence(&self) -> bool {
        self.frequency_hz <= 0
    }
}

/// Square-wave generator behind the tone scheduler.
///
/// Failures of the output are unrecoverable for the process; implementations
/// may panic or log, the scheduler does not retry.
pub trait ToneOutput {
    /// Starts the output at the given frequency.
    fn enable(&mut self, frequency_hz: u32);
    /// Sets the output level as a duty-cycle percentage.
    fn set_level(&mut self, duty_percent: u8);
    /// Silences the output.
    fn disable(&mut self);
}

struct PlayerState {
    pending: VecDeque<Beep>,
    running: bool,
}

/// Background tone scheduler.
///
/// A dedicated worker thread consumes the queue in FIFO order and plays one
/// segment at a time, sleeping for the segment duration, so playback never
/// blocks the callers of [`play_tune`](TonePlayer::play_tune).
///
/// Dropping the player requests shutdown, wakes the worker and joins it.
/// Segments still queued at that point are discarded without being played.
pub struct TonePlayer {
    state: Arc<(Mutex<PlayerState>, Condvar)>,
    worker: Option<JoinHandle<()>>,
}

impl TonePlayer {
    /// Starts the worker thread; the tone output moves into it.
    pub fn new<T: ToneOutput + Send + 'static>(output: T) -> Self {
        let state = Arc::new((
            Mutex::new(PlayerState {
                pending: VecDeque::new(),
                running: true,
            }),
            Condvar::new(),
        ));
        let worker_state = Arc::clone(&state);
        let worker = thread::spawn(move || worker_loop(&worker_state, output));
        Self {
            state,
            worker: Some(worker),
        }
    }

    /// Appends the segments to the queue atomically and wakes the worker.
    ///
    /// Segments play in enqueue order, also across separate calls.
    pub fn play_tune(&self, beeps: &[Beep]) {
        let (lock, wakeup) = &*self.state;
        {
            let mut state = lock.lock().unwrap();
            state.pending.extend(beeps.iter().copied());
        }
        wakeup.notify_all();
    }
}

impl Drop for TonePlayer {
    fn drop(&mut self) {
        {
            let (lock, _) = &*self.state;
            lock.lock().unwrap().running = false;
        }
        self.state.1.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop<T: ToneOutput>(shared: &(Mutex<PlayerState>, Condvar), mut output: T) {
    let (lock, wakeup) = shared;
    loop {
        let next_beep = {
            let mut state = lock.lock().unwrap();
            loop {
                if !state.running {
                    return;
                }
                if let Some(beep) = state.pending.pop_front() {
                    break beep;
                }
                state = wakeup.wait_timeout(state, IDLE_RECHECK).unwrap().0;
            }
        };
        play(&mut output, &next_beep);
    }
}

fn play<T: ToneOutput>(output: &mut T, beep: &Beep) {
    if beep.is_silence() {
        thread::sleep(beep.duration);
    } else {
        output.enable(beep.frequency_hz as u32);
        output.set_level(TONE_DUTY_PERCENT);
        thread::sleep(beep.duration);
        output.disable();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use super::{Beep, ToneOutput, TonePlayer};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Enabled(u32),
        Level(u8),
        Disabled,
    }

    #[derive(Default, Clone)]
    struct RecordingOutput {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl RecordingOutput {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl ToneOutput for RecordingOutput {
        fn enable(&mut self, frequency_hz: u32) {
            self.events.lock().unwrap().push(Event::Enabled(frequency_hz));
        }

        fn set_level(&mut self, duty_percent: u8) {
            self.events.lock().unwrap().push(Event::Level(duty_percent));
        }

        fn disable(&mut self) {
            self.events.lock().unwrap().push(Event::Disabled);
        }
    }

    fn wait_for_events(output: &RecordingOutput, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while output.events().len() < count {
            assert!(Instant::now() < deadline, "playback did not finish in time");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn plays_segments_in_enqueue_order() {
        let output = RecordingOutput::default();
        let player = TonePlayer::new(output.clone());
        let started = Instant::now();

        // Two separate calls still play strictly in order.
        player.play_tune(&[
            Beep::tone(Duration::from_millis(30), 440),
            Beep::rest(Duration::from_millis(30)),
        ]);
        player.play_tune(&[Beep::tone(Duration::from_millis(30), 523)]);

        wait_for_events(&output, 6);
        assert_eq!(
            output.events(),
            vec![
                Event::Enabled(440),
                Event::Level(50),
                Event::Disabled,
                Event::Enabled(523),
                Event::Level(50),
                Event::Disabled,
            ]
        );
        assert!(started.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn rest_segments_do_not_touch_the_output() {
        let output = RecordingOutput::default();
        let player = TonePlayer::new(output.clone());
        player.play_tune(&[
            Beep::rest(Duration::from_millis(10)),
            Beep::tone(Duration::from_millis(10), 392),
        ]);
        wait_for_events(&output, 3);
        assert_eq!(
            output.events(),
            vec![Event::Enabled(392), Event::Level(50), Event::Disabled]
        );
    }

    #[test]
    fn shutdown_with_idle_worker_is_prompt() {
        let output = RecordingOutput::default();
        let player = TonePlayer::new(output.clone());
        let started = Instant::now();
        drop(player);
        // Well under the 5 s idle recheck: the shutdown wakeup is observed.
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn shutdown_discards_queued_segments() {
        let output = RecordingOutput::default();
        let player = TonePlayer::new(output.clone());
        player.play_tune(&[Beep::tone(Duration::from_millis(20), 440)]);
        wait_for_events(&output, 3);
        // Queued after the last played segment, dropped at shutdown.
        player.play_tune(&[Beep::rest(Duration::from_millis(50))]);
        drop(player);
        assert_eq!(output.events().len(), 3);
    }
}
