#![allow(dead_code)]

use anyhow::{bail, Result};
use embedded_hal::delay::DelayNs;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Once;
use watering_station::actuator::{Indicator, Pump, Valve};
use watering_station::channel::{Station, WateringChannel};
use watering_station::config::ChannelConfig;
use watering_station::sensor::{MoistureSensor, TankLevelSensor};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    MoistureRead(usize),
    TankRead,
    ValveOpen(usize),
    ValveClose(usize),
    PumpStart,
    PumpStop,
    Led(bool),
}

type Hook = Box<dyn FnMut(u64)>;

/// Simulierte Zeit in ms plus Protokoll aller Hardware-Zugriffe
#[derive(Clone, Default)]
pub struct Bench {
    now_ms: Rc<Cell<u64>>,
    events: Rc<RefCell<Vec<(u64, Event)>>>,
    after_delay: Rc<RefCell<Option<Hook>>>,
}

impl Bench {
    pub fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn record(&self, event: Event) {
        self.events.borrow_mut().push((self.now_ms.get(), event));
    }

    pub fn events(&self) -> Vec<(u64, Event)> {
        self.events.borrow().clone()
    }

    pub fn kinds(&self) -> Vec<Event> {
        self.events.borrow().iter().map(|(_, e)| *e).collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    pub fn time_of(&self, event: Event) -> Option<u64> {
        self.events.borrow().iter().find(|(_, e)| *e == event).map(|(t, _)| *t)
    }

    pub fn delay(&self) -> FakeDelay {
        FakeDelay(self.clone())
    }

    /// Läuft nach jeder Wartezeit mit der neuen Zeit, z.B. um den Tank
    /// während einer Bewässerung leerlaufen zu lassen
    pub fn after_delay(&self, hook: impl FnMut(u64) + 'static) {
        *self.after_delay.borrow_mut() = Some(Box::new(hook));
    }

    fn advance(&self, ms: u64) {
        let now = self.now_ms.get() + ms;
        self.now_ms.set(now);
        if let Some(hook) = self.after_delay.borrow_mut().as_mut() {
            hook(now);
        }
    }
}

pub struct FakeDelay(Bench);

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(u64::from(ns) / 1_000_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.advance(u64::from(ms));
    }
}

/// Sensor mit von außen einstellbarem Wert; `None` = Lesefehler
pub struct FakeMoisture {
    id: usize,
    value: Rc<Cell<Option<u8>>>,
    bench: Bench,
}

impl MoistureSensor for FakeMoisture {
    fn read_percent(&mut self) -> Result<u8> {
        self.bench.record(Event::MoistureRead(self.id));
        match self.value.get() {
            Some(v) => Ok(v),
            None => bail!("adc timeout"),
        }
    }
}

pub struct FakeTank {
    empty: Rc<Cell<bool>>,
    /// So viele der nächsten Lesungen schlagen fehl
    failures: Rc<Cell<u32>>,
    bench: Bench,
}

impl TankLevelSensor for FakeTank {
    fn is_empty(&mut self) -> Result<bool> {
        self.bench.record(Event::TankRead);
        let failures = self.failures.get();
        if failures > 0 {
            self.failures.set(failures - 1);
            bail!("tank pin read failed");
        }
        Ok(self.empty.get())
    }
}

pub struct RecValve {
    id: usize,
    open: bool,
    bench: Bench,
}

impl Valve for RecValve {
    fn open(&mut self) -> Result<()> {
        self.bench.record(Event::ValveOpen(self.id));
        self.open = true;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.bench.record(Event::ValveClose(self.id));
        self.open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

pub struct RecPump {
    running: bool,
    bench: Bench,
}

impl Pump for RecPump {
    fn start(&mut self) -> Result<()> {
        self.bench.record(Event::PumpStart);
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.bench.record(Event::PumpStop);
        self.running = false;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

pub struct RecLed {
    on: Rc<Cell<bool>>,
    bench: Bench,
}

impl Indicator for RecLed {
    fn set(&mut self, on: bool) -> Result<()> {
        self.bench.record(Event::Led(on));
        self.on.set(on);
        Ok(())
    }

    fn is_on(&self) -> bool {
        self.on.get()
    }
}

/// Stellschrauben der Testumgebung
pub struct Rig {
    pub bench: Bench,
    pub tank_empty: Rc<Cell<bool>>,
    pub tank_failures: Rc<Cell<u32>>,
    pub led: Rc<Cell<bool>>,
    pub moisture: Vec<Rc<Cell<Option<u8>>>>,
}

impl Rig {
    pub fn new() -> Self {
        Self {
            bench: Bench::default(),
            tank_empty: Rc::default(),
            tank_failures: Rc::default(),
            led: Rc::default(),
            moisture: Vec::new(),
        }
    }

    pub fn station(&self) -> Station {
        Station {
            pump: Box::new(RecPump { running: false, bench: self.bench.clone() }),
            tank: Box::new(FakeTank {
                empty: self.tank_empty.clone(),
                failures: self.tank_failures.clone(),
                bench: self.bench.clone(),
            }),
            empty_led: Box::new(RecLed { on: self.led.clone(), bench: self.bench.clone() }),
        }
    }

    /// Neuer Kanal mit Startwert `moisture`
    pub fn channel(&mut self, moisture: u8, config: ChannelConfig) -> WateringChannel {
        let id = self.moisture.len();
        let value = Rc::new(Cell::new(Some(moisture)));
        self.moisture.push(value.clone());
        WateringChannel::new(
            id,
            Box::new(RecValve { id, open: false, bench: self.bench.clone() }),
            Box::new(FakeMoisture { id, value, bench: self.bench.clone() }),
            config,
        )
        .unwrap()
    }
}

/// Öffnungsintervalle [open, close) je Ventil aus dem Protokoll
pub fn valve_intervals(events: &[(u64, Event)]) -> Vec<(usize, u64, u64)> {
    let mut out = Vec::new();
    for (i, (t_open, e)) in events.iter().enumerate() {
        if let Event::ValveOpen(id) = e {
            let close = events[i..]
                .iter()
                .find(|(_, e)| *e == Event::ValveClose(*id))
                .map(|(t, _)| *t)
                .expect("valve never closed");
            out.push((*id, *t_open, close));
        }
    }
    out
}

thread_local! {
    static LOG_LINES: RefCell<Vec<(log::Level, String)>> = RefCell::new(Vec::new());
}

/// Sammelt Log-Zeilen pro Test-Thread
struct Capture;

impl log::Log for Capture {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        LOG_LINES.with(|l| l.borrow_mut().push((record.level(), record.args().to_string())));
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture;

/// Logger einmalig installieren und die Zeilen des aktuellen Threads leeren
pub fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&CAPTURE).expect("logger already set");
        log::set_max_level(log::LevelFilter::Trace);
    });
    LOG_LINES.with(|l| l.borrow_mut().clear());
}

pub fn logged() -> Vec<(log::Level, String)> {
    LOG_LINES.with(|l| l.borrow().clone())
}
