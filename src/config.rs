use anyhow::{ensure, Result};

/*** Hardware ***/
// Ventile, Pumpe und LED hängen über nicht invertierende Treiber am GPIO:
// Pegel 1 = AN. Bei einer Low-aktiven Stufe hier auf true stellen.
pub const VALVE_ACTIVE_LOW: bool = false;
pub const PUMP_ACTIVE_LOW: bool = false;
pub const EMPTY_LED_ACTIVE_LOW: bool = false;

pub const PUMP_GPIO: u8 = 14;
// Eingang mit Pull-up, HIGH = leer
pub const TANK_GPIO: u8 = 13;
pub const EMPTY_LED_GPIO: u8 = 23;

// Frei vergebbare Ein-/Ausgänge (ohne Flash-Pins und reine Eingänge 34..39)
pub const IO_GPIOS: [u8; 16] = [4, 5, 12, 13, 14, 15, 16, 17, 18, 19, 21, 22, 23, 25, 26, 27];
// ADC1: GPIO32..35 = CH4..CH7, GPIO36 = CH0, GPIO39 = CH3
pub const ADC1_GPIOS: [u8; 6] = [32, 33, 34, 35, 36, 39];

/*** Sensor ***/
pub const MOISTURE_SAMPLES: u32 = 64;
// 12 Bit
pub const ADC_FULL_SCALE: u32 = 4095;
// 0..~3.1 V
pub const ADC_ATTENUATION: Attenuation = Attenuation::Db11;

/*** Automatik ***/
pub const CHECK_INTERVAL_SECS: u32 = 1;

// Obergrenze pro Bewässerung, damit die Laufzeit in ms sicher in u32 passt
pub const MAX_WATERING_SECS: u32 = 3600;

// Ventil-GPIO, Feuchte-GPIO (ADC1), Schwelle %, Dauer s
pub const CHANNELS: [ChannelSetup; 3] = [
    ChannelSetup::new(25, 33, ChannelConfig::new(50, 5)),
    ChannelSetup::new(26, 34, ChannelConfig::new(50, 5)),
    ChannelSetup::new(27, 35, ChannelConfig::new(50, 5)),
];

pub const HARDWARE: HardwareConfig = HardwareConfig {
    sensor: SensorConfig {
        samples: MOISTURE_SAMPLES,
        full_scale: ADC_FULL_SCALE,
        attenuation: ADC_ATTENUATION,
    },
    pump_gpio: PUMP_GPIO,
    tank_gpio: TANK_GPIO,
    empty_led_gpio: EMPTY_LED_GPIO,
    valve_active_low: VALVE_ACTIVE_LOW,
    pump_active_low: PUMP_ACTIVE_LOW,
    empty_led_active_low: EMPTY_LED_ACTIVE_LOW,
};

/// Eingangsdämpfung des ADC, bestimmt den Messbereich
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attenuation {
    Db0,
    Db2_5,
    Db6,
    Db11,
}

/// Umrechnung Rohwert → Prozent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorConfig {
    /// Anzahl Rohwerte, die pro Messung gemittelt werden
    pub samples: u32,
    /// Rohwert, der 100 % entspricht
    pub full_scale: u32,
    pub attenuation: Attenuation,
}

impl SensorConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.samples > 0, "sample count must be positive");
        ensure!(self.full_scale > 0, "ADC full scale must be positive");
        Ok(())
    }
}

/// Einstellungen eines Bewässerungskanals, fest zur Build-Zeit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Unterhalb dieser Feuchte (%) wird gegossen
    pub min_moisture: u8,
    /// Ventil + Pumpe bleiben so lange an (Sekunden)
    pub watering_secs: u32,
}

impl ChannelConfig {
    pub const fn new(min_moisture: u8, watering_secs: u32) -> Self {
        Self { min_moisture, watering_secs }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.min_moisture <= 100,
            "moisture threshold {} is outside 0..=100",
            self.min_moisture
        );
        ensure!(self.watering_secs > 0, "watering duration must be positive");
        ensure!(
            self.watering_secs <= MAX_WATERING_SECS,
            "watering duration {}s exceeds {}s",
            self.watering_secs,
            MAX_WATERING_SECS
        );
        Ok(())
    }
}

/// Verdrahtung eines Kanals plus seine Regel-Parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSetup {
    pub valve_gpio: u8,
    /// Muss ein ADC1-Eingang sein, siehe `ADC1_GPIOS`
    pub moisture_gpio: u8,
    pub config: ChannelConfig,
}

impl ChannelSetup {
    pub const fn new(valve_gpio: u8, moisture_gpio: u8, config: ChannelConfig) -> Self {
        Self { valve_gpio, moisture_gpio, config }
    }
}

/// Alles, was `hw::init_hw` zum Aufsetzen der Peripherie braucht.
/// Wird einmal beim Start zusammengestellt (keine globalen Pin-Masken).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HardwareConfig {
    pub sensor: SensorConfig,
    pub pump_gpio: u8,
    pub tank_gpio: u8,
    pub empty_led_gpio: u8,
    pub valve_active_low: bool,
    pub pump_active_low: bool,
    pub empty_led_active_low: bool,
}

impl HardwareConfig {
    /// Prüft, dass jeder Pin existiert, zur Funktion passt und nur einmal vergeben ist.
    pub fn validate_wiring(&self, channels: &[ChannelSetup]) -> Result<()> {
        self.sensor.validate()?;

        let mut used = Vec::new();
        claim(&mut used, self.pump_gpio, &IO_GPIOS, "pump")?;
        claim(&mut used, self.tank_gpio, &IO_GPIOS, "tank sensor")?;
        claim(&mut used, self.empty_led_gpio, &IO_GPIOS, "empty led")?;
        for (id, ch) in channels.iter().enumerate() {
            claim(&mut used, ch.valve_gpio, &IO_GPIOS, &format!("channel[{id}] valve"))?;
            claim(&mut used, ch.moisture_gpio, &ADC1_GPIOS, &format!("channel[{id}] moisture"))?;
        }
        Ok(())
    }
}

fn claim(used: &mut Vec<u8>, gpio: u8, allowed: &[u8], what: &str) -> Result<()> {
    ensure!(allowed.contains(&gpio), "{what}: GPIO{gpio} cannot be used for this function");
    ensure!(!used.contains(&gpio), "{what}: GPIO{gpio} is already assigned");
    used.push(gpio);
    Ok(())
}
