use clap::{Parser, Subcommand, ValueEnum};

use crate::patient::Gender;

#[derive(Parser)]
#[command(name = "cqlbridge")]
#[command(about = "Create and read Patient resources on a FHIR server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// FHIR base URL
    #[arg(
        short,
        long,
        global = true,
        env = "CQLBRIDGE_URL",
        default_value = "http://localhost:8080/fhir"
    )]
    pub server: String,

    /// Basic auth username
    #[arg(short, long, global = true, env = "CQLBRIDGE_USERNAME", default_value = "basic")]
    pub username: String,

    /// Basic auth password
    #[arg(long, global = true, env = "CQLBRIDGE_PASSWORD", default_value = "secret")]
    pub password: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a Patient resource
    CreatePatient(CreatePatientArgs),
    /// Read a Patient resource by id
    ReadPatient(ReadPatientArgs),
    /// Create John Doe and read him back
    Demo,
}

#[derive(clap::Args)]
pub struct CreatePatientArgs {
    /// Family name
    #[arg(long, default_value = "Doe")]
    pub family: String,
    /// Given name
    #[arg(long, default_value = "John")]
    pub given: String,
    /// Birth date (YYYY-MM-DD)
    #[arg(long, default_value = "1990-01-15")]
    pub birth_date: String,
    /// Administrative gender
    #[arg(long, value_enum, default_value = "male")]
    pub gender: Gender,
}

#[derive(clap::Args)]
pub struct ReadPatientArgs {
    /// Patient id
    pub id: String,
}
