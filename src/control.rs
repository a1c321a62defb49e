use crate::channel::{Outcome, Station, WateringChannel};
use anyhow::{ensure, Result};
use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};
use std::fmt::Write;

/// Zustand eines Kanals nach einem Durchlauf
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelReport {
    pub id: usize,
    /// `None` wenn der Sensor nicht gelesen werden konnte
    pub moisture: Option<u8>,
    /// `None` wenn der Kanal wegen eines Fehlers übersprungen wurde
    pub outcome: Option<Outcome>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub channels: Vec<ChannelReport>,
}

impl TickReport {
    pub fn watered(&self) -> impl Iterator<Item = usize> + '_ {
        self.channels
            .iter()
            .filter(|c| c.outcome == Some(Outcome::Watered))
            .map(|c| c.id)
    }
}

/// Die Steuerschleife: alle Kanäle der Reihe nach, dann Pause.
///
/// Kanäle werden nie parallel bedient; eine laufende Bewässerung hält die
/// ganze Schleife an, spätere Kanäle kommen im selben Durchlauf danach dran.
pub struct Controller<D> {
    channels: Vec<WateringChannel>,
    station: Station,
    interval_secs: u32,
    delay: D,
}

impl<D: DelayNs> Controller<D> {
    pub fn new(channels: Vec<WateringChannel>, station: Station, interval_secs: u32, delay: D) -> Result<Self> {
        ensure!(!channels.is_empty(), "at least one watering channel is required");
        ensure!(interval_secs > 0, "check interval must be positive");
        ensure!(interval_secs <= u32::MAX / 1000, "check interval {interval_secs}s is too long");
        Ok(Self { channels, station, interval_secs, delay })
    }

    pub fn channels(&self) -> &[WateringChannel] {
        &self.channels
    }

    pub fn station(&self) -> &Station {
        &self.station
    }

    /// Ein Durchlauf über alle Kanäle (ohne die Pause danach).
    pub fn tick(&mut self) -> TickReport {
        // 1) jeden Sensor genau einmal lesen
        let readings: Vec<Option<u8>> = self
            .channels
            .iter_mut()
            .map(|ch| match ch.read_moisture() {
                Ok(m) => Some(m),
                Err(e) => {
                    error!("{e:#}");
                    None
                }
            })
            .collect();

        let mut line = String::new();
        for (ch, m) in self.channels.iter().zip(&readings) {
            let _ = match m {
                Some(m) => write!(line, "channel[{}]: {}, ", ch.id(), m),
                None => write!(line, "channel[{}]: -, ", ch.id()),
            };
        }
        info!("control: moisture {line}");

        // 2) Entscheidung mit denselben Werten, strikt nacheinander
        let mut report = TickReport::default();
        for (ch, moisture) in self.channels.iter_mut().zip(readings) {
            let outcome = match moisture {
                Some(m) => match ch.water_if_needed(m, &mut self.station, &mut self.delay) {
                    Ok(o) => Some(o),
                    Err(e) => {
                        error!("channel[{}]: {e:#}", ch.id());
                        None
                    }
                },
                None => None,
            };
            report.channels.push(ChannelReport { id: ch.id(), moisture, outcome });
        }

        // einmal pro Durchlauf, nicht pro Kanal
        let skipped = report.channels.iter().filter(|c| c.outcome == Some(Outcome::TankEmpty)).count();
        if skipped > 0 {
            warn!("tank: Tank is empty! {skipped} channel(s) not watered");
        }

        debug!("control: tick done {:?}", report);
        report
    }

    pub fn run_forever(&mut self) -> ! {
        info!(
            "control: {} channels, check every {}s",
            self.channels.len(),
            self.interval_secs
        );
        loop {
            self.tick();
            self.delay.delay_ms(self.interval_secs * 1000);
        }
    }
}
