use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::{CreatePatientArgs, OutputFormat};
use crate::client::FhirClient;
use crate::output::{print_success, print_value};
use crate::patient::{Gender, Patient, parse_birth_date};

fn build_patient(args: &CreatePatientArgs) -> Result<Patient> {
    let birth_date = parse_birth_date(&args.birth_date)?;
    Patient::new(&args.family, &args.given, birth_date, args.gender)
}

pub async fn create(
    client: &FhirClient,
    args: &CreatePatientArgs,
    format: OutputFormat,
) -> Result<()> {
    let patient = build_patient(args)?;
    let body = serde_json::to_value(&patient).context("Failed to encode patient")?;
    let created = client.create("Patient", &body).await?;
    let id = created.id.as_deref().unwrap_or("?");
    print_success(&format!("Created {}/{}", "Patient".cyan(), id.cyan()));
    if !created.resource.is_null() {
        print_value(&created.resource, format);
    }
    Ok(())
}

pub async fn read(client: &FhirClient, id: &str, format: OutputFormat) -> Result<()> {
    let resource = client.read("Patient", id).await?;
    print_value(&resource, format);
    Ok(())
}

/// Create the default patient, then read it back and print what the
/// server stored.
pub async fn demo(client: &FhirClient) -> Result<()> {
    let args = CreatePatientArgs {
        family: "Doe".to_string(),
        given: "John".to_string(),
        birth_date: "1990-01-15".to_string(),
        gender: Gender::Male,
    };
    let patient = build_patient(&args)?;
    println!("Creating patient: {}", patient.display_name());

    let body = serde_json::to_value(&patient).context("Failed to encode patient")?;
    let created = client
        .create("Patient", &body)
        .await
        .context("Error creating patient")?;

    if created.is_created() {
        println!("Patient created successfully!");
    } else {
        println!("Patient creation may have failed or was updated");
    }
    let id = created
        .id
        .context("Server response carried no patient id")?;
    println!("Patient ID: {id}");

    let resource = client.read("Patient", &id).await?;
    let stored: Patient =
        serde_json::from_value(resource).context("Server returned an invalid Patient")?;

    println!("Retrieved patient: {}", stored.display_name());
    println!(
        "Patient birth date: {}",
        stored.birth_date.as_deref().unwrap_or("-")
    );
    println!(
        "Patient gender: {}",
        stored.gender.map(|g| g.code()).unwrap_or("-")
    );
    Ok(())
}
