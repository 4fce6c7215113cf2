use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use clickhouse_schema::config::{self, Config};
use clickhouse_schema::utils::init_logging;
use clickhouse_schema::{ClickHouseClient, DesiredTable, SchemaClient, VerifyOutcome};

#[derive(Parser)]
#[command(name = "clickhouse_schema", version, about = "Manage ClickHouse tables from declarations")]
struct Cli {
    /// Configuration file with connection settings and declared tables
    #[arg(short, long, default_value = "clickhouse_schema.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the CREATE TABLE statement for a declared table
    Ddl { id: String },
    /// Create a declared table
    Create { id: String },
    /// Compare a declared table with the live one
    Verify { id: String },
    /// Verify every declared table
    Check,
    /// Drop a declared table
    Destroy { id: String },
    /// Print a declaration for an existing table
    Import { id: String },
}

#[derive(Serialize)]
struct Declarations {
    tables: Vec<DesiredTable>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::read_from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    // Validation logs warnings; it must run after init_logging
    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config, cli.command).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config, command: Command) -> anyhow::Result<ExitCode> {
    match command {
        Command::Ddl { id } => {
            let client = SchemaClient::new(config.clone(), ClickHouseClient::new(&config.clickhouse)?);
            println!("{}", client.create_sql(&id)?);
        }
        Command::Create { id } => {
            let client = connect(config).await?;
            let created = client.create(&id).await.context("Error creating table")?;
            println!("created {}", created.id);
        }
        Command::Verify { id } => match connect(config).await?.verify(&id).await? {
            VerifyOutcome::InSync(_) => println!("{} is in sync", id),
            VerifyOutcome::Gone => println!("{} does not exist", id),
        },
        Command::Check => {
            let client = connect(config).await?;
            let mut failed = false;
            for (id, outcome) in client.check_all().await {
                match outcome {
                    Ok(VerifyOutcome::InSync(_)) => println!("{} is in sync", id),
                    Ok(VerifyOutcome::Gone) => println!("{} does not exist", id),
                    Err(e) => {
                        failed = true;
                        println!("{}: {}", id, e);
                    }
                }
            }
            if failed {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Destroy { id } => {
            connect(config)
                .await?
                .destroy(&id)
                .await
                .context("Error dropping table")?;
            println!("dropped {}", id);
        }
        Command::Import { id } => {
            let imported = connect(config).await?.import(&id).await?;
            let declarations = Declarations {
                tables: vec![imported.table],
            };
            print!("{}", toml::to_string_pretty(&declarations)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn connect(config: Config) -> anyhow::Result<SchemaClient<ClickHouseClient>> {
    let connection = ClickHouseClient::connect(&config.clickhouse)
        .await
        .with_context(|| {
            format!(
                "Unable to connect to ClickHouse at {}:{}",
                config.clickhouse.host, config.clickhouse.port
            )
        })?;
    Ok(SchemaClient::new(config, connection))
}
