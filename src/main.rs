use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use txflow::application::controller::{FlowServices, TransactionFlowController};
use txflow::application::driver::drive;
use txflow::application::verification::VerificationGateway;
use txflow::config::EngineConfig;
use txflow::domain::ports::PrimaryWallet;
use txflow::domain::transaction::LookupProvider;
use txflow::infrastructure::in_memory::{InMemorySession, RecordingNavigator};
use txflow::infrastructure::simulator::SimulatedBank;
use txflow::interfaces::csv::intent_reader::IntentReader;
use txflow::interfaces::csv::outcome_writer::{OutcomeRecord, OutcomeWriter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input CSV of transaction intents, one flow per row
    input: PathBuf,

    /// JSON config with amount limits and simulator settings
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref()).into_diagnostic()?;

    // Simulated remote service and the session it authenticates
    let bank = Arc::new(SimulatedBank::from_config(&config.simulator));
    let session = Arc::new(InMemorySession::new(
        config.simulator.opening_balance,
        Some(PrimaryWallet {
            id: config.simulator.primary_wallet_id.clone(),
            currency_code: config.simulator.currency_code.clone(),
        }),
    ));
    let navigator = Arc::new(RecordingNavigator::new());

    let verification = VerificationGateway::new()
        .with_lookup(LookupProvider::BankAccount, bank.clone())
        .with_lookup(LookupProvider::Wallet, bank.clone())
        .with_lookup(LookupProvider::Meter, bank.clone())
        .with_lookup(LookupProvider::SmartCard, bank.clone());
    let services = Arc::new(FlowServices::new(
        bank,
        verification,
        session.clone(),
        navigator,
        config.limits.clone(),
    ));

    let file = File::open(&cli.input).into_diagnostic()?;
    let reader = IntentReader::new(file);
    let stdout = io::stdout();
    let mut writer = OutcomeWriter::new(stdout.lock());

    // One flow at a time, in input order
    for (index, intent) in reader.intents().enumerate() {
        let row = index + 1;
        let intent = match intent {
            Ok(intent) => intent,
            Err(e) => {
                eprintln!("Error reading intent on row {row}: {e}");
                continue;
            }
        };

        let controller = TransactionFlowController::start(intent.kind(), services.clone());
        let record = match drive(&controller, &intent).await {
            Ok(state) => OutcomeRecord::from_state(row, &state),
            Err(e) => {
                eprintln!("Error running intent on row {row}: {e}");
                OutcomeRecord::from_error(row, intent.kind(), &e)
            }
        };
        writer.write(&record).into_diagnostic()?;

        if session.is_logged_out().await {
            eprintln!("Session expired on row {row}, stopping");
            break;
        }
    }

    writer.finish().into_diagnostic()?;
    tracing::info!(balance = %session.current_balance().await, "all intents processed");
    Ok(())
}
