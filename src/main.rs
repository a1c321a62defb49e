#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp_idf_svc::log::EspLogger;
    use std::thread;
    use std::time::Duration;

    esp_idf_sys::link_patches();
    EspLogger::initialize_default();

    let _handle = thread::Builder::new()
        .name("app".into())
        .stack_size(16 * 1024)
        .spawn(|| {
            if let Err(e) = app() {
                log::error!("app() failed: {e:?}");
            }
        })?;

    loop { thread::sleep(Duration::from_secs(60)); }
}

#[cfg(target_os = "espidf")]
fn app() -> anyhow::Result<()> {
    use esp_idf_hal::delay::FreeRtos;
    use esp_idf_hal::peripherals::Peripherals;
    use watering_station::{config, control::Controller, hw};

    let peripherals = Peripherals::take()?;

    // HW
    let (station, channels) = hw::init_hw(peripherals.pins, peripherals.adc1, &config::HARDWARE, &config::CHANNELS)?;

    // Steuerschleife, kehrt nie zurück
    let mut controller = Controller::new(channels, station, config::CHECK_INTERVAL_SECS, FreeRtos)?;
    controller.run_forever()
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("watering-station firmware must be built for an ESP-IDF target (see .cargo/config.toml)")
}
