use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>, card_number: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(card) = card_number {
        settings.card_number = card;
    }

    let path = save_settings(&settings)?;
    println!("Saved settings to {}", path.display());
    Ok(())
}
