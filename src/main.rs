//! prepstmt - prepare a command once and execute it with text parameters.

mod cli;

use cli::{Cli, OutputFormat};
use prepstmt::config::Config;
use prepstmt::db::MockBackend;
use prepstmt::error::{exec_code, PrepError, Result};
use prepstmt::{logging, ResultHolder, Session, Statement};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();

    if cli.log_file {
        logging::init_file_logging();
    } else {
        logging::init_stderr_logging();
    }

    match run(&cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(i32::from(code)),
        Err(e) => {
            error!("{}: {}", e.category(), e);
            std::process::exit(1);
        }
    }
}

/// Prepares and executes the command, returning the exec code.
async fn run(cli: &Cli) -> Result<u8> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let mut session_config = config.session.clone();
    session_config.strict_placeholders |= cli.strict_placeholders;

    let mut session = if cli.mock_db {
        info!("Using mock backend");
        Session::with_config(Box::new(MockBackend::new()), session_config)
    } else {
        let connection = cli.resolve_connection(&config)?.ok_or_else(|| {
            PrepError::config("No database connection configured. Use --help for usage information.")
        })?;
        Session::connect(&connection, session_config).await?
    };

    let id = match session.prepare_statement(&cli.sql).await {
        Ok(id) => id,
        Err(e) => {
            session.cleanup().await;
            return Err(e);
        }
    };

    let mut holder = ResultHolder::new();
    let outcome = session.exec(id, cli.params.as_slice(), &mut holder).await;
    let code = exec_code(&outcome);

    let statement = session.statement(id);
    match &outcome {
        Ok(()) => {
            info!("{}", holder);
            print_result(cli.output, statement, code, &holder, None);
        }
        Err(e) => {
            error!("{}: {}", e.category(), e);
            print_result(cli.output, statement, code, &holder, Some(e));
        }
    }

    session.cleanup().await;
    Ok(code)
}

fn print_result(
    format: OutputFormat,
    statement: Option<&Statement>,
    code: u8,
    holder: &ResultHolder,
    error: Option<&PrepError>,
) {
    match format {
        OutputFormat::Text => {
            if !holder.is_valid() {
                return;
            }
            if !holder.columns().is_empty() {
                println!("{}", holder.columns().join("\t"));
            }
            for row in holder.rows() {
                let cells: Vec<&str> = row
                    .iter()
                    .map(|cell| cell.as_deref().unwrap_or("NULL"))
                    .collect();
                println!("{}", cells.join("\t"));
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "statement": statement,
                "code": code,
                "status": holder.status().map(|s| s.as_str()),
                "columns": holder.columns(),
                "rows": holder.rows(),
                "error": error.map(|e| e.to_string()),
            });
            println!("{output}");
        }
    }
}
