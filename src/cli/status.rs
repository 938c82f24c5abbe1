use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();

    println!("Data dir:     {}", settings.data_dir);
    println!(
        "Card number:  {}",
        if settings.card_number.is_empty() { "(not set)" } else { &settings.card_number }
    );
    Ok(())
}
