use crate::cli::OutputFormat;
use crate::patient::Patient;
use colored::Colorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => print_as_table(value),
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(_) => println!("{value}"),
    }
}

fn print_as_table(value: &Value) {
    let Ok(patient) = serde_json::from_value::<Patient>(value.clone()) else {
        print_json(value);
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (field, content) in patient_rows(&patient) {
        builder.push_record([field.to_string(), content]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
}

fn patient_rows(patient: &Patient) -> Vec<(&'static str, String)> {
    let or_dash = |v: Option<&str>| v.unwrap_or("-").to_string();
    vec![
        ("ID", or_dash(patient.id.as_deref())),
        ("Name", {
            let name = patient.display_name();
            if name.is_empty() { "-".to_string() } else { name }
        }),
        ("BirthDate", or_dash(patient.birth_date.as_deref())),
        ("Gender", or_dash(patient.gender.map(|g| g.code()))),
    ]
}
