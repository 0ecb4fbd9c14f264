use std::fs;

use ameise_tools::sheet::to_a1;
use anyhow::Result;

fn main() -> Result<()> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book.get_active_sheet_mut();

    sheet.get_cell_mut("A1").set_value_string("Est. Proj. Duration (months)");
    sheet.add_merge_cells("A1:B1");
    sheet.get_cell_mut("A2").set_value_string("Est. Avg. Developers");
    sheet.get_cell_mut("A3").set_value_string("Est. PersonMonths");

    sheet.get_cell_mut("A5").set_value_string("Effort Distribution");
    for (col, label) in ["Types of Effort", "%", "PM", "months", "days"].iter().enumerate() {
        sheet
            .get_cell_mut(to_a1(col as u32 + 1, 6).as_str())
            .set_value_string(*label);
    }

    sheet.get_cell_mut("A17").set_value_string("Cost Estimation");
    let people = ["Axel", "Bernd", "Christine", "Diana", "Richard", "Stefanie", "Thomas"];
    for (i, name) in people.iter().enumerate() {
        sheet
            .get_cell_mut(to_a1(1, 19 + i as u32).as_str())
            .set_value_string(*name);
    }
    sheet.get_cell_mut("A27").set_value_string("Total Project Costs");

    // Week grid: header row 30, week 1 in column C.
    sheet.get_cell_mut("A30").set_value_string("Week");
    for week in 1..=40u32 {
        sheet
            .get_cell_mut(to_a1(week + 2, 30).as_str())
            .set_value_number(week);
    }
    for (i, name) in people.iter().enumerate() {
        sheet
            .get_cell_mut(to_a1(1, 31 + i as u32).as_str())
            .set_value_string(*name);
    }

    fs::create_dir_all("template")?;
    umya_spreadsheet::writer::xlsx::write(&book, "template/AMEISE-planning-template-v1.95-ip.xlsx")?;

    let weeks: Vec<String> = (1..=40).map(|w| format!("W{w}")).collect();
    let csv = format!(
        "Person,{}\nAxel,CD,CD,R+MN\nRichard,SP,SP,RSP\n",
        weeks.join(",")
    );
    fs::create_dir_all("data")?;
    fs::write("data/AMEISE-Schedule-v2-grid.csv", csv)?;

    println!("Wrote template/AMEISE-planning-template-v1.95-ip.xlsx and data/AMEISE-Schedule-v2-grid.csv");
    Ok(())
}
