use crate::actuator::{Indicator, Pump, Valve};
use crate::config::ChannelConfig;
use crate::sensor::{MoistureSensor, TankLevelSensor};
use anyhow::{Context, Result};
use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

/// Gemeinsam genutzte Hardware: eine Pumpe, ein Tank-Sensor, eine Leer-LED.
///
/// Gehört dem Controller und wird pro Entscheidung als `&mut` an genau
/// einen Kanal verliehen, d.h. die Pumpe hat nie zwei Besitzer gleichzeitig.
pub struct Station {
    pub pump: Box<dyn Pump>,
    pub tank: Box<dyn TankLevelSensor>,
    pub empty_led: Box<dyn Indicator>,
}

/// Ergebnis einer Kanal-Entscheidung
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Feuchte >= Schwelle, nichts zu tun
    Sufficient,
    /// Ventil + Pumpe liefen für die volle Dauer
    Watered,
    /// Tank leer, keine Aktion, LED an
    TankEmpty,
}

pub struct WateringChannel {
    id: usize,
    valve: Box<dyn Valve>,
    sensor: Box<dyn MoistureSensor>,
    min_moisture: u8,
    watering_secs: u32,
}

impl WateringChannel {
    pub fn new(
        id: usize,
        valve: Box<dyn Valve>,
        sensor: Box<dyn MoistureSensor>,
        config: ChannelConfig,
    ) -> Result<Self> {
        config
            .validate()
            .with_context(|| format!("channel[{id}]: invalid configuration"))?;
        Ok(Self {
            id,
            valve,
            sensor,
            min_moisture: config.min_moisture,
            watering_secs: config.watering_secs,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn min_moisture(&self) -> u8 {
        self.min_moisture
    }

    pub fn watering_secs(&self) -> u32 {
        self.watering_secs
    }

    pub fn valve_is_open(&self) -> bool {
        self.valve.is_open()
    }

    pub fn read_moisture(&mut self) -> Result<u8> {
        self.sensor
            .read_percent()
            .with_context(|| format!("channel[{}]: moisture read failed", self.id))
    }

    /// Feuchte messen, dann wie [`Self::water_if_needed`].
    pub fn check_and_water<D: DelayNs>(&mut self, station: &mut Station, delay: &mut D) -> Result<Outcome> {
        let moisture = self.read_moisture()?;
        self.water_if_needed(moisture, station, delay)
    }

    /// Entscheidung mit einem bereits gemessenen Feuchtewert.
    ///
    /// Blockiert während der Bewässerung für die volle Laufzeit; ein leerer
    /// Tank oder erreichte Feuchte brechen eine laufende Bewässerung nicht ab.
    pub fn water_if_needed<D: DelayNs>(
        &mut self,
        moisture: u8,
        station: &mut Station,
        delay: &mut D,
    ) -> Result<Outcome> {
        let empty = station.tank.is_empty().context("tank level read failed")?;
        // LED-Fehler nur loggen, die Entscheidung läuft weiter
        if let Err(e) = station.empty_led.set(empty) {
            warn!("channel[{}]: empty indicator: {e:#}", self.id);
        }
        if empty {
            debug!("channel[{}]: tank empty, skipped", self.id);
            return Ok(Outcome::TankEmpty);
        }

        if moisture >= self.min_moisture {
            return Ok(Outcome::Sufficient);
        }

        self.run_session(station.pump.as_mut(), delay)?;
        Ok(Outcome::Watered)
    }

    fn run_session<D: DelayNs>(&mut self, pump: &mut dyn Pump, delay: &mut D) -> Result<()> {
        info!("channel[{}]: watering for {}s", self.id, self.watering_secs);

        // Einschalten
        let started = self
            .valve
            .open()
            .context("valve open failed")
            .and_then(|()| pump.start().context("pump start failed"));
        if let Err(e) = started {
            self.shut_off(pump);
            return Err(e.context(format!("channel[{}]: watering aborted", self.id)));
        }

        // feste Laufzeit
        delay.delay_ms(self.watering_secs * 1000);

        // Pumpe zuerst, dann Ventil
        let stopped = pump.stop().context("pump stop failed");
        let closed = self.valve.close().context("valve close failed");
        stopped?;
        closed?;

        info!("channel[{}]: watering done", self.id);
        Ok(())
    }

    /// Sicher ausschalten, Fehler werden nur geloggt
    fn shut_off(&mut self, pump: &mut dyn Pump) {
        if let Err(e) = pump.stop() {
            error!("channel[{}]: pump stop failed: {e:?}", self.id);
        }
        if let Err(e) = self.valve.close() {
            error!("channel[{}]: valve close failed: {e:?}", self.id);
        }
    }
}
