// Simulated 1-Wire bus with a single DS18B20-like sensor.
//
// The pin and the delay share one virtual clock: delays advance it, pin
// operations are instantaneous. The sensor decodes master time slots from the
// edges it observes and answers by pulling the line low for a window of time,
// which is what the master sees when it samples.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

use crate::rom::DeviceAddress;

const NS_PER_US: u64 = 1_000;

// Low pulses at least this long are reset pulses.
const RESET_MIN_NS: u64 = 480 * NS_PER_US;
// Low pulses shorter than this are written ones.
const WRITE_ONE_MAX_NS: u64 = 15 * NS_PER_US;
// Presence pulse: starts 15us after the reset pulse ends and lasts 120us.
const PRESENCE_DELAY_NS: u64 = 15 * NS_PER_US;
const PRESENCE_NS: u64 = 120 * NS_PER_US;
// A transmitted zero keeps the line low for 30us from the falling edge.
const ZERO_HOLD_NS: u64 = 30 * NS_PER_US;

// DS18B20 power-on scratchpad: 85 degrees Celsius.
const POWER_ON_SCRATCHPAD: [u8; 9] = [0x50, 0x05, 0x4B, 0x46, 0x7F, 0xFF, 0x0C, 0x10, 0x1C];

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Event {
    Fall(u64),
    Release(u64),
    Sample(u64, bool),
}

#[derive(Default)]
struct ByteIn {
    value: u8,
    count: u8,
}

impl ByteIn {
    fn push(&mut self, bit: bool) -> Option<u8> {
        if bit {
            self.value |= 1 << self.count;
        }
        self.count += 1;
        (self.count == 8).then_some(self.value)
    }
}

enum SensorState {
    Idle,
    Rom(ByteIn),
    MatchRom(ByteIn, Vec<u8>),
    Function(ByteIn),
    Transmit(Vec<u8>, usize),
    Converting(Option<u64>),
    Listen(ByteIn),
}

pub(crate) struct Sensor {
    address: DeviceAddress,
    scratchpad: [u8; 9],
    conversion_ns: Option<u64>,
    state: SensorState,
    low_from_ns: u64,
    low_until_ns: u64,
    received: Vec<u8>,
    conversion_started_ns: Option<u64>,
    conversions: u32,
}

impl Sensor {
    pub(crate) fn new(address: DeviceAddress) -> Self {
        Self {
            address,
            scratchpad: POWER_ON_SCRATCHPAD,
            conversion_ns: Some(10_000 * NS_PER_US),
            state: SensorState::Idle,
            low_from_ns: 0,
            low_until_ns: 0,
            received: Vec::new(),
            conversion_started_ns: None,
            conversions: 0,
        }
    }

    pub(crate) fn temperature(mut self, lsb: u8, msb: u8) -> Self {
        self.scratchpad[0] = lsb;
        self.scratchpad[1] = msb;
        self
    }

    pub(crate) fn conversion_time_us(mut self, us: Option<u64>) -> Self {
        self.conversion_ns = us.map(|us| us * NS_PER_US);
        self
    }

    fn listening(mut self) -> Self {
        self.state = SensorState::Listen(ByteIn::default());
        self
    }

    fn pulls_low(&self, now: u64) -> bool {
        self.low_from_ns <= now && now < self.low_until_ns
    }

    fn hold_low(&mut self, from: u64, duration: u64) {
        self.low_from_ns = from;
        self.low_until_ns = from + duration;
    }

    fn on_reset(&mut self, now: u64) {
        self.hold_low(now + PRESENCE_DELAY_NS, PRESENCE_NS);
        self.state = SensorState::Rom(ByteIn::default());
    }

    fn on_fall(&mut self, now: u64) {
        let bit = match &mut self.state {
            SensorState::Transmit(bytes, index) => {
                let bit = bytes
                    .get(*index / 8)
                    .map_or(true, |byte| (byte >> (*index % 8)) & 1 == 1);
                *index += 1;
                bit
            }
            SensorState::Converting(done) => done.is_some_and(|done| now >= done),
            _ => return,
        };
        if !bit {
            self.hold_low(now, ZERO_HOLD_NS);
        }
    }

    fn on_slot_release(&mut self, now: u64, low_ns: u64) {
        let bit = low_ns < WRITE_ONE_MAX_NS;
        let next = match &mut self.state {
            SensorState::Rom(byte) => match byte.push(bit) {
                Some(0xCC) => SensorState::Function(ByteIn::default()),
                Some(0x55) => SensorState::MatchRom(ByteIn::default(), Vec::new()),
                Some(0x33) => SensorState::Transmit(self.address.as_bytes().to_vec(), 0),
                Some(_) => SensorState::Idle,
                None => return,
            },
            SensorState::MatchRom(byte, matched) => match byte.push(bit) {
                Some(value) => {
                    matched.push(value);
                    if matched.len() < 8 {
                        SensorState::MatchRom(ByteIn::default(), core::mem::take(matched))
                    } else if matched.as_slice() == self.address.as_bytes() {
                        SensorState::Function(ByteIn::default())
                    } else {
                        SensorState::Idle
                    }
                }
                None => return,
            },
            SensorState::Function(byte) => match byte.push(bit) {
                Some(0x44) => {
                    self.conversion_started_ns = Some(now);
                    self.conversions += 1;
                    SensorState::Converting(self.conversion_ns.map(|ns| now + ns))
                }
                Some(0xBE) => SensorState::Transmit(self.scratchpad.to_vec(), 0),
                Some(_) => SensorState::Idle,
                None => return,
            },
            SensorState::Listen(byte) => match byte.push(bit) {
                Some(value) => {
                    self.received.push(value);
                    SensorState::Listen(ByteIn::default())
                }
                None => return,
            },
            _ => return,
        };
        self.state = next;
    }
}

struct BusState {
    now_ns: u64,
    master_low: bool,
    last_fall_ns: u64,
    sensor: Option<Sensor>,
    events: Vec<Event>,
}

impl BusState {
    fn level(&self) -> bool {
        let now = self.now_ns;
        !self.master_low && !self.sensor.as_ref().is_some_and(|s| s.pulls_low(now))
    }

    fn fall(&mut self) {
        if self.master_low {
            return;
        }
        self.master_low = true;
        self.last_fall_ns = self.now_ns;
        self.events.push(Event::Fall(self.now_ns));
        let now = self.now_ns;
        if let Some(sensor) = self.sensor.as_mut() {
            sensor.on_fall(now);
        }
    }

    fn release(&mut self) {
        if !self.master_low {
            return;
        }
        self.master_low = false;
        self.events.push(Event::Release(self.now_ns));
        let now = self.now_ns;
        let low_ns = now - self.last_fall_ns;
        if let Some(sensor) = self.sensor.as_mut() {
            if low_ns >= RESET_MIN_NS {
                sensor.on_reset(now);
            } else {
                sensor.on_slot_release(now, low_ns);
            }
        }
    }
}

/// Handle on the simulated bus used by tests to build pins and inspect state.
pub(crate) struct SimulatedBus {
    state: Rc<RefCell<BusState>>,
}

impl SimulatedBus {
    fn build(sensor: Option<Sensor>) -> Self {
        Self {
            state: Rc::new(RefCell::new(BusState {
                now_ns: 0,
                master_low: false,
                last_fall_ns: 0,
                sensor,
                events: Vec::new(),
            })),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::build(None)
    }

    pub(crate) fn with_sensor(sensor: Sensor) -> Self {
        Self::build(Some(sensor))
    }

    pub(crate) fn listener() -> Self {
        Self::build(Some(Sensor::new(DeviceAddress::new([0; 8])).listening()))
    }

    pub(crate) fn pin(&self) -> SimPin {
        SimPin {
            state: Rc::clone(&self.state),
        }
    }

    pub(crate) fn delay(&self) -> SimDelay {
        SimDelay {
            state: Rc::clone(&self.state),
        }
    }

    pub(crate) fn now_us(&self) -> u64 {
        self.state.borrow().now_ns / NS_PER_US
    }

    pub(crate) fn last_fall_us(&self) -> u64 {
        self.state.borrow().last_fall_ns / NS_PER_US
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.state.borrow().events.clone()
    }

    pub(crate) fn clear_events(&self) {
        self.state.borrow_mut().events.clear();
    }

    pub(crate) fn received(&self) -> Vec<u8> {
        self.sensor(|sensor| sensor.received.clone())
    }

    pub(crate) fn transmit(&self, bytes: &[u8]) {
        self.sensor_mut(|sensor| sensor.state = SensorState::Transmit(bytes.to_vec(), 0));
    }

    pub(crate) fn conversion_started_us(&self) -> Option<u64> {
        self.sensor(|sensor| sensor.conversion_started_ns.map(|ns| ns / NS_PER_US))
    }

    pub(crate) fn conversions(&self) -> u32 {
        self.sensor(|sensor| sensor.conversions)
    }

    fn sensor<T>(&self, f: impl FnOnce(&Sensor) -> T) -> T {
        let state = self.state.borrow();
        f(state.sensor.as_ref().expect("no sensor on the simulated bus"))
    }

    fn sensor_mut(&self, f: impl FnOnce(&mut Sensor)) {
        let mut state = self.state.borrow_mut();
        f(state.sensor.as_mut().expect("no sensor on the simulated bus"));
    }
}

pub(crate) struct SimPin {
    state: Rc<RefCell<BusState>>,
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().fall();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.state.borrow_mut().release();
        Ok(())
    }
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut state = self.state.borrow_mut();
        let level = state.level();
        let now = state.now_ns;
        state.events.push(Event::Sample(now, level));
        Ok(level)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|level| !level)
    }
}

pub(crate) struct SimDelay {
    state: Rc<RefCell<BusState>>,
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.state.borrow_mut().now_ns += u64::from(ns);
    }
}
