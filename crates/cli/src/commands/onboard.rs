//! `lorekeep onboard` — Write a default config file.

use lorekeep_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let path = dir.join("config.toml");

    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&path, AppConfig::default_toml())?;

    println!("Wrote default config to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  1. Set LOREKEEP_API_KEY or OPENAI_API_KEY");
    println!(
        "  2. (Optional) add knowledge passages to {}",
        dir.join("knowledge").join("passages.jsonl").display()
    );
    println!("  3. Run `lorekeep chat`");

    Ok(())
}
