use crate::actuator::{GpioPump, GpioValve, Switch};
use crate::channel::{Station, WateringChannel};
use crate::config::{Attenuation, ChannelSetup, HardwareConfig, SensorConfig};
use crate::sensor::{AdcMoistureSensor, GpioTankSensor, MoistureSensor, RawSampler};
use anyhow::{anyhow, bail, Context, Result};
use esp_idf_hal::adc::attenuation::{DB_11, DB_2_5, DB_6, NONE};
use esp_idf_hal::adc::oneshot::config::AdcChannelConfig;
use esp_idf_hal::adc::oneshot::{AdcChannelDriver, AdcDriver};
use esp_idf_hal::adc::ADC1;
use esp_idf_hal::gpio::{ADCPin, AnyIOPin, Gpio32, Gpio33, Gpio34, Gpio35, Gpio36, Gpio39, IOPin, PinDriver, Pins, Pull};
use esp_idf_sys::adc_atten_t;
use std::sync::Arc;

type SharedAdc = Arc<AdcDriver<'static, ADC1>>;

/// Rohwerte eines ADC1-Kanals (ohne Kalibrierung)
pub struct AdcSampler<T: ADCPin<Adc = ADC1>> {
    channel: AdcChannelDriver<'static, T, SharedAdc>,
}

impl<T: ADCPin<Adc = ADC1>> RawSampler for AdcSampler<T> {
    fn sample(&mut self) -> Result<u16> {
        Ok(self.channel.read_raw()?)
    }
}

fn atten(a: Attenuation) -> adc_atten_t {
    match a {
        Attenuation::Db0 => NONE,
        Attenuation::Db2_5 => DB_2_5,
        Attenuation::Db6 => DB_6,
        Attenuation::Db11 => DB_11,
    }
}

fn moisture_sensor<T>(adc: &SharedAdc, pin: T, sensor: SensorConfig) -> Result<Box<dyn MoistureSensor>>
where
    T: ADCPin<Adc = ADC1> + 'static,
{
    let config = AdcChannelConfig {
        attenuation: atten(sensor.attenuation),
        ..Default::default()
    };
    let channel = AdcChannelDriver::new(adc.clone(), pin, &config)?;
    Ok(Box::new(AdcMoistureSensor::new(AdcSampler { channel }, sensor)?))
}

/// Noch nicht vergebene Pins, abrufbar über die GPIO-Nummer aus `config.rs`
struct PinPool {
    io: Vec<(u8, AnyIOPin)>,
    gpio32: Option<Gpio32>,
    gpio33: Option<Gpio33>,
    gpio34: Option<Gpio34>,
    gpio35: Option<Gpio35>,
    gpio36: Option<Gpio36>,
    gpio39: Option<Gpio39>,
}

impl PinPool {
    // gleiche Nummern wie config::IO_GPIOS / config::ADC1_GPIOS
    fn new(pins: Pins) -> Self {
        let io = vec![
            (4, pins.gpio4.downgrade()),
            (5, pins.gpio5.downgrade()),
            (12, pins.gpio12.downgrade()),
            (13, pins.gpio13.downgrade()),
            (14, pins.gpio14.downgrade()),
            (15, pins.gpio15.downgrade()),
            (16, pins.gpio16.downgrade()),
            (17, pins.gpio17.downgrade()),
            (18, pins.gpio18.downgrade()),
            (19, pins.gpio19.downgrade()),
            (21, pins.gpio21.downgrade()),
            (22, pins.gpio22.downgrade()),
            (23, pins.gpio23.downgrade()),
            (25, pins.gpio25.downgrade()),
            (26, pins.gpio26.downgrade()),
            (27, pins.gpio27.downgrade()),
        ];
        Self {
            io,
            gpio32: Some(pins.gpio32),
            gpio33: Some(pins.gpio33),
            gpio34: Some(pins.gpio34),
            gpio35: Some(pins.gpio35),
            gpio36: Some(pins.gpio36),
            gpio39: Some(pins.gpio39),
        }
    }

    fn io(&mut self, gpio: u8) -> Result<AnyIOPin> {
        let idx = self
            .io
            .iter()
            .position(|(n, _)| *n == gpio)
            .ok_or_else(|| anyhow!("GPIO{gpio} is not a free I/O pin"))?;
        Ok(self.io.swap_remove(idx).1)
    }

    fn moisture_sensor(&mut self, adc: &SharedAdc, gpio: u8, sensor: SensorConfig) -> Result<Box<dyn MoistureSensor>> {
        let taken = || anyhow!("GPIO{gpio} is already in use");
        match gpio {
            32 => moisture_sensor(adc, self.gpio32.take().ok_or_else(taken)?, sensor),
            33 => moisture_sensor(adc, self.gpio33.take().ok_or_else(taken)?, sensor),
            34 => moisture_sensor(adc, self.gpio34.take().ok_or_else(taken)?, sensor),
            35 => moisture_sensor(adc, self.gpio35.take().ok_or_else(taken)?, sensor),
            36 => moisture_sensor(adc, self.gpio36.take().ok_or_else(taken)?, sensor),
            39 => moisture_sensor(adc, self.gpio39.take().ok_or_else(taken)?, sensor),
            _ => bail!("GPIO{gpio} is not an ADC1 input"),
        }
    }
}

/// Setzt alle Ausgänge auf AUS und baut Station + Kanäle (in Bedien-Reihenfolge).
/// Pin-Belegung und ADC-Dämpfung kommen aus `hw` und `channels`.
pub fn init_hw(
    pins: Pins,
    adc1: ADC1,
    hw: &HardwareConfig,
    channels: &[ChannelSetup],
) -> Result<(Station, Vec<WateringChannel>)> {
    hw.validate_wiring(channels).context("hw: invalid wiring")?;
    let mut pool = PinPool::new(pins);

    // gemeinsame Hardware
    let pump = GpioPump::new(PinDriver::output(pool.io(hw.pump_gpio)?)?, hw.pump_active_low).context("pump")?;
    let mut tank = PinDriver::input(pool.io(hw.tank_gpio)?)?;
    tank.set_pull(Pull::Up)?;
    let empty_led =
        Switch::new(PinDriver::output(pool.io(hw.empty_led_gpio)?)?, hw.empty_led_active_low).context("empty led")?;

    let station = Station {
        pump: Box::new(pump),
        tank: Box::new(GpioTankSensor::new(tank)),
        empty_led: Box::new(empty_led),
    };

    // ADC1, 12 Bit
    let adc: SharedAdc = Arc::new(AdcDriver::new(adc1)?);

    let mut out = Vec::with_capacity(channels.len());
    for (id, setup) in channels.iter().enumerate() {
        let valve = GpioValve::new(PinDriver::output(pool.io(setup.valve_gpio)?)?, hw.valve_active_low)
            .with_context(|| format!("channel[{id}]: valve"))?;
        let sensor = pool
            .moisture_sensor(&adc, setup.moisture_gpio, hw.sensor)
            .with_context(|| format!("channel[{id}]: moisture sensor"))?;
        out.push(WateringChannel::new(id, Box::new(valve), sensor, setup.config)?);
    }

    log::info!("hw: {} channels initialized", out.len());
    Ok((station, out))
}
