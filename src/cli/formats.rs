use comfy_table::{Cell, Table};

use crate::converter::ALL_FORMATS;
use crate::error::Result;

pub fn run() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Key", "Name", "Card Number"]);
    for format in ALL_FORMATS {
        table.add_row(vec![
            Cell::new(format.key()),
            Cell::new(format.name()),
            Cell::new(if format.needs_card_number() { "yes" } else { "" }),
        ]);
    }
    println!("Formats\n{table}");
    Ok(())
}
