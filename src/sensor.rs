use crate::config::SensorConfig;
use anyhow::{anyhow, Result};
use embedded_hal::digital::InputPin;

/// Bodenfeuchte eines Kanals in Prozent (0..=100).
///
/// Der Wert wird direkt mit der Kanal-Schwelle verglichen:
/// kleiner als die Schwelle heißt "braucht Wasser".
pub trait MoistureSensor {
    fn read_percent(&mut self) -> Result<u8>;
}

/// Füllstand des gemeinsamen Wassertanks.
pub trait TankLevelSensor {
    fn is_empty(&mut self) -> Result<bool>;
}

/// Liefert einzelne Rohwerte eines Analog-Kanals.
pub trait RawSampler {
    fn sample(&mut self) -> Result<u16>;
}

/// Mittelt `samples` Rohwerte und skaliert linear auf Prozent.
pub struct AdcMoistureSensor<S> {
    sampler: S,
    config: SensorConfig,
}

impl<S: RawSampler> AdcMoistureSensor<S> {
    pub fn new(sampler: S, config: SensorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { sampler, config })
    }

    /// Mittelwert über alle Samples (ganzzahlig, ohne Nachkommastellen)
    pub fn read_average(&mut self) -> Result<u32> {
        let mut acc: u64 = 0;
        for _ in 0..self.config.samples {
            acc += u64::from(self.sampler.sample()?);
        }
        Ok((acc / u64::from(self.config.samples)) as u32)
    }
}

impl<S: RawSampler> MoistureSensor for AdcMoistureSensor<S> {
    fn read_percent(&mut self) -> Result<u8> {
        let avg = self.read_average()?;
        Ok(to_percent(avg, self.config.full_scale))
    }
}

/// `avg * 100 / full_scale`; Werte über Vollausschlag werden auf 100 begrenzt.
pub fn to_percent(avg: u32, full_scale: u32) -> u8 {
    if avg > full_scale {
        log::warn!("sensor: raw average {avg} above full scale {full_scale}, clamping");
        return 100;
    }
    (u64::from(avg) * 100 / u64::from(full_scale)) as u8
}

/// Tank-Schwimmer an einem Eingang mit Pull-up: HIGH = leer.
pub struct GpioTankSensor<P> {
    pin: P,
}

impl<P: InputPin> GpioTankSensor<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P: InputPin> TankLevelSensor for GpioTankSensor<P> {
    fn is_empty(&mut self) -> Result<bool> {
        self.pin.is_high().map_err(|e| anyhow!("tank level pin: {e:?}"))
    }
}
