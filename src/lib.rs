//! Bewässerungsstation: mehrere Kanäle (Ventil + Feuchtesensor) teilen sich
//! eine Pumpe und einen Tank-Sensor.
//!
//! Die Logik (Sensor/Aktor-Traits, Kanal-Entscheidung, Steuerschleife) ist
//! hardwareunabhängig und läuft auch auf dem Host. Alles ESP-IDF-spezifische
//! steckt in [`hw`] und wird nur für `target_os = "espidf"` gebaut.

pub mod actuator;
pub mod channel;
pub mod config;
pub mod control;
pub mod sensor;

#[cfg(target_os = "espidf")]
pub mod hw;
