use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use ds18b20::Ds18b20;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::{CdevPin, Delay};
use onewire_gpio::BitbangBus;
use onewire_hal::OneWireError;
use yogalarm::alarm::{Alarm, AlarmKind};
use yogalarm::audio::{Beep, ToneOutput, TonePlayer};
use yogalarm::binding::{SharedSlot, ValueBinding};
use yogalarm::store::FileStore;

/// Temperature alarm: samples a DS18B20 on a 1-Wire GPIO line and beeps when
/// the reading crosses the persisted thresholds.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// GPIO character device the sensor line belongs to
    #[arg(short, long, default_value = "/dev/gpiochip0")]
    chip: String,

    /// GPIO line number of the 1-Wire data pin
    #[arg(short, long, default_value_t = 12)]
    line: u32,

    /// Threshold storage file
    #[arg(short, long, default_value = "thresholds.toml")]
    store: String,

    /// Delay between alarm evaluations, in milliseconds
    #[arg(long, default_value_t = 250)]
    interval_ms: u64,
}

/// Stand-in for a PWM buzzer: reports tone changes on the log.
struct ConsoleTone;

impl ToneOutput for ConsoleTone {
    fn enable(&mut self, frequency_hz: u32) {
        log::info!("tone on at {frequency_hz} Hz");
    }

    fn set_level(&mut self, duty_percent: u8) {
        log::debug!("tone duty {duty_percent}%");
    }

    fn disable(&mut self) {
        log::info!("tone off");
    }
}

fn alert_tune(frequency_hz: i32) -> Vec<Beep> {
    let beat = Duration::from_secs(2);
    vec![
        Beep::tone(beat, frequency_hz),
        Beep::rest(beat),
        Beep::tone(beat, frequency_hz),
        Beep::rest(beat),
        Beep::tone(beat, frequency_hz),
    ]
}

fn main() {
    // Initialize the logger
    env_logger::init();
    // Parse command line arguments
    let args = Args::parse();

    // Request the sensor line open-drain: the bus holds it low and otherwise
    // leaves it to the pull-up.
    let mut chip = Chip::new(&args.chip).expect("Failed to open GPIO chip");
    let handle = chip
        .get_line(args.line)
        .expect("Failed to get GPIO line")
        .request(
            LineRequestFlags::OPEN_DRAIN | LineRequestFlags::OUTPUT,
            1,
            "onewire",
        )
        .expect("Failed to request GPIO line");
    let pin = CdevPin::new(handle).expect("Failed to wrap GPIO line");
    let bus = BitbangBus::new(pin, Delay).expect("Failed to release the 1-Wire line");
    let sensor = Ds18b20::new();

    let temperature = Arc::new(SharedSlot::new(None::<f64>));
    let store = FileStore::open(&args.store).expect("Failed to open threshold store");
    let alarm = Alarm::new(store);
    let player = TonePlayer::new(ConsoleTone);

    // Dedicated sampling thread: bus I/O busy-waits and the conversion poll
    // blocks, so nothing latency-sensitive shares this thread.
    let readings = Arc::clone(&temperature);
    thread::spawn(move || {
        let mut bus = bus;
        let mut sensor = sensor;
        let mut delay = Delay;
        loop {
            match sensor.read_temperature(&mut bus, &mut delay) {
                Ok(reading) => readings.set_value(Some(reading.to_num::<f64>())),
                // No new reading: keep the last published value and retry.
                Err(OneWireError::NoDevicePresent) => {
                    log::warn!("no sensor answered the bus reset")
                }
                Err(OneWireError::Timeout) => log::warn!("sensor stopped responding mid-read"),
                Err(err) => log::warn!("temperature read failed: {err:?}"),
            }
        }
    });

    loop {
        if let Some(current) = temperature.get_value() {
            match alarm.evaluate(current) {
                AlarmKind::High => {
                    log::warn!("high temperature alarm at {current:.2} C");
                    player.play_tune(&alert_tune(440));
                }
                AlarmKind::Low => {
                    log::warn!("low temperature alarm at {current:.2} C");
                    player.play_tune(&alert_tune(392));
                }
                AlarmKind::None => {}
            }
        }
        thread::sleep(Duration::from_millis(args.interval_ms));
    }
}
