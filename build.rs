use embuild::{build::CfgArgs, espidf};

fn main() -> anyhow::Result<()> {
    // Nur für das ESP-IDF-Target; auf dem Host laufen lediglich die Tests
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        CfgArgs::output_propagated("ESP_IDF")?;
        espidf::sysenv::output();
    }

    println!("cargo:rerun-if-changed=sdkconfig.defaults");
    Ok(())
}
