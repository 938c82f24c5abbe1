use std::path::Path;

use colored::Colorize;

use crate::converter::{convert_file, ConvertOptions};
use crate::error::Result;
use crate::settings::{load_settings, resolve_input};

pub fn run(input: &str, output: &str, source: &str, card_number: Option<String>) -> Result<()> {
    let settings = load_settings();
    let card_number = card_number.or_else(|| {
        Some(settings.card_number.clone()).filter(|c| !c.is_empty())
    });
    let options = ConvertOptions { card_number };

    let in_path = resolve_input(input, &settings);
    let report = convert_file(&in_path, Path::new(output), source, &options)?;

    println!(
        "{} {} entries from {} written to {}",
        "Converted".green().bold(),
        report.entries,
        report.format.name(),
        report.output.display()
    );
    Ok(())
}
