use anyhow::{anyhow, Result};
use embedded_hal::digital::OutputPin;

/// Ventil eines Kanals
pub trait Valve {
    fn open(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
    fn is_open(&self) -> bool;
}

/// Die gemeinsame Pumpe
pub trait Pump {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn is_running(&self) -> bool;
}

/// Anzeige "Tank leer"
pub trait Indicator {
    fn set(&mut self, on: bool) -> Result<()>;
    fn is_on(&self) -> bool;
}

#[inline]
fn set_with_polarity<P: OutputPin>(pin: &mut P, on: bool, active_low: bool) -> Result<()> {
    let res = if on != active_low { pin.set_high() } else { pin.set_low() };
    res.map_err(|e| anyhow!("output pin: {e:?}"))
}

/// Digitaler Ausgang mit Polarität; merkt sich den zuletzt gesetzten Zustand.
pub struct Switch<P> {
    pin: P,
    active_low: bool,
    on: bool,
}

impl<P: OutputPin> Switch<P> {
    /// Initial AUS anhand der Polarität
    pub fn new(pin: P, active_low: bool) -> Result<Self> {
        let mut switch = Self { pin, active_low, on: false };
        switch.set(false)?;
        Ok(switch)
    }

    pub fn set(&mut self, on: bool) -> Result<()> {
        set_with_polarity(&mut self.pin, on, self.active_low)?;
        self.on = on;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

pub struct GpioValve<P>(Switch<P>);

impl<P: OutputPin> GpioValve<P> {
    pub fn new(pin: P, active_low: bool) -> Result<Self> {
        Ok(Self(Switch::new(pin, active_low)?))
    }
}

impl<P: OutputPin> Valve for GpioValve<P> {
    fn open(&mut self) -> Result<()> {
        self.0.set(true)
    }

    fn close(&mut self) -> Result<()> {
        self.0.set(false)
    }

    fn is_open(&self) -> bool {
        self.0.is_on()
    }
}

pub struct GpioPump<P>(Switch<P>);

impl<P: OutputPin> GpioPump<P> {
    pub fn new(pin: P, active_low: bool) -> Result<Self> {
        Ok(Self(Switch::new(pin, active_low)?))
    }
}

impl<P: OutputPin> Pump for GpioPump<P> {
    fn start(&mut self) -> Result<()> {
        self.0.set(true)
    }

    fn stop(&mut self) -> Result<()> {
        self.0.set(false)
    }

    fn is_running(&self) -> bool {
        self.0.is_on()
    }
}

impl<P: OutputPin> Indicator for Switch<P> {
    fn set(&mut self, on: bool) -> Result<()> {
        Switch::set(self, on)
    }

    fn is_on(&self) -> bool {
        Switch::is_on(self)
    }
}
