use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use paywatch::application::checkout::{CheckoutForm, CheckoutOutcome, CheckoutSimulator};
use paywatch::application::flows::{PaymentLink, PaymentLinkFlow};
use paywatch::application::session::StatusPoller;
use paywatch::config::Config;
use paywatch::domain::callback::SimulatedResponse;
use paywatch::domain::order::{OrderId, PaymentMethod};
use paywatch::domain::ports::ErrorStoreRef;
use paywatch::infrastructure::http::ShopApiClient;
use paywatch::infrastructure::in_memory::InMemoryErrorStore;
use paywatch::interfaces::console::{ConsoleNavigator, ConsoleNotifier};
use paywatch::interfaces::csv::position_reader::PositionReader;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Root URL of the shop backend.
    #[arg(long, env = "PAYWATCH_BASE_URL")]
    base_url: Option<String>,

    /// Shop API key used to create orders.
    #[arg(long, env = "PAYWATCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Delay between two status checks, in milliseconds.
    #[arg(long, env = "PAYWATCH_POLL_INTERVAL_MS")]
    poll_interval_ms: Option<u64>,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, env = "PAYWATCH_DB_PATH")]
    db_path: Option<PathBuf>,

    /// Log level.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Follow the payment of an order opened through a payment link.
    Watch {
        /// Order whose transaction status is polled.
        #[arg(long)]
        order: OrderId,

        /// Payment link id used for pages and stored errors (defaults to the order id).
        #[arg(long)]
        link: Option<OrderId>,

        #[arg(long, value_enum, default_value = "mobile-money")]
        method: CliPaymentMethod,
    },
    /// Place an order in the demo shop and simulate the provider's answer.
    Checkout {
        /// CSV file with `name, price, quantity, item_id` rows.
        #[arg(long)]
        positions: PathBuf,

        #[arg(long)]
        buyer_name: String,

        #[arg(long)]
        buyer_phone: String,

        #[arg(long)]
        buyer_email: Option<String>,

        /// Shipping address.
        #[arg(long)]
        address: String,

        /// Warehouse code.
        #[arg(long)]
        warehouse: Option<String>,

        #[arg(long, value_enum, default_value = "mobile-money")]
        method: CliPaymentMethod,

        /// Answer of the simulated provider.
        #[arg(long, value_enum, default_value = "success")]
        response: CliResponse,
    },
    /// Print and clear the payment error stored for a payment link.
    PaymentError {
        link: OrderId,
    },
}

/// Payment method CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPaymentMethod {
    Cash,
    MobileMoney,
}

impl From<CliPaymentMethod> for PaymentMethod {
    fn from(method: CliPaymentMethod) -> Self {
        match method {
            CliPaymentMethod::Cash => PaymentMethod::Cash,
            CliPaymentMethod::MobileMoney => PaymentMethod::MobileMoney,
        }
    }
}

/// Simulated provider answer CLI enum.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliResponse {
    Success,
    WrongPin,
    Canceled,
    WrongData,
    /// Post nothing and poll the transaction status instead.
    Await,
}

impl From<CliResponse> for SimulatedResponse {
    fn from(response: CliResponse) -> Self {
        match response {
            CliResponse::Success => SimulatedResponse::Success,
            CliResponse::WrongPin => SimulatedResponse::WrongPin,
            CliResponse::Canceled => SimulatedResponse::Canceled,
            CliResponse::WrongData => SimulatedResponse::WrongData,
            CliResponse::Await => SimulatedResponse::Await,
        }
    }
}

impl Cli {
    /// Splits the arguments into the effective configuration and the command.
    fn into_parts(self) -> Result<(Config, Command)> {
        let mut config = match self.config {
            Some(ref path) => Config::from_file(path).into_diagnostic()?,
            None => Config::default(),
        };

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(api_key) = self.api_key {
            config.api_key = Some(api_key);
        }
        if let Some(poll_interval_ms) = self.poll_interval_ms {
            config.poll_interval_ms = poll_interval_ms;
        }
        if let Some(db_path) = self.db_path {
            config.db_path = Some(db_path);
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }

        config.validate().into_diagnostic()?;
        Ok((config, self.command))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = Cli::parse().into_parts()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let client = ShopApiClient::from_config(&config).into_diagnostic()?;

    match command {
        Command::Watch {
            order,
            link,
            method,
        } => {
            let link = PaymentLink {
                link_id: link.unwrap_or_else(|| order.clone()),
                order_id: order,
                payment_method: method.into(),
            };
            let errors = open_error_store(config.db_path.as_deref())?;
            let flow = PaymentLinkFlow::new(
                link.link_id.clone(),
                Arc::new(ConsoleNavigator::new(&config.base_url)),
                errors,
            );
            let mut poller = StatusPoller::new(Arc::new(client), Arc::new(flow))
                .with_interval(config.poll_interval());

            match PaymentLinkFlow::watch(&mut poller, &link) {
                Some(session) => {
                    tokio::select! {
                        outcome = session.wait() => {
                            if outcome.is_none() {
                                warn!("Polling stopped before the payment settled");
                            }
                        }
                        _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping poll session"),
                    }
                }
                None => println!("Order {} is paid in cash, nothing to watch", link.order_id),
            }
        }
        Command::Checkout {
            positions,
            buyer_name,
            buyer_phone,
            buyer_email,
            address,
            warehouse,
            method,
            response,
        } => {
            let file = File::open(positions).into_diagnostic()?;
            let mut drafts = Vec::new();
            for draft in PositionReader::new(file).positions() {
                match draft {
                    Ok(draft) => drafts.push(draft),
                    Err(e) => warn!(error = %e, "Error reading position"),
                }
            }

            let form = CheckoutForm {
                buyer_name,
                buyer_phone,
                buyer_email,
                address,
                payment_method: method.into(),
                warehouse,
                positions: drafts,
            };

            let client = Arc::new(client);
            let mut simulator = CheckoutSimulator::new(
                client.clone(),
                client.clone(),
                client,
                Arc::new(ConsoleNotifier),
            )
            .with_interval(config.poll_interval());
            println!("Order number: {}", simulator.order_number());

            let outcome = simulator
                .submit(form, response.into())
                .await
                .into_diagnostic()?;
            if let CheckoutOutcome::AwaitingPayment { .. } = outcome {
                tokio::select! {
                    _ = simulator.wait_for_payment() => {}
                    _ = tokio::signal::ctrl_c() => info!("Interrupted, stopping poll session"),
                }
            }
        }
        Command::PaymentError { link } => {
            let errors = open_error_store(config.db_path.as_deref())?;
            match PaymentLinkFlow::take_pending_error(&errors, &link)
                .await
                .into_diagnostic()?
            {
                Some(error) => println!("Payment failed: {error}"),
                None => println!("No payment error for {link}"),
            }
        }
    }

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_error_store(db_path: Option<&Path>) -> Result<ErrorStoreRef> {
    use paywatch::infrastructure::rocksdb::RocksDBErrorStore;

    match db_path {
        Some(path) => Ok(Arc::new(RocksDBErrorStore::open(path).into_diagnostic()?)),
        None => Ok(Arc::new(InMemoryErrorStore::new())),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_error_store(db_path: Option<&Path>) -> Result<ErrorStoreRef> {
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }
    Ok(Arc::new(InMemoryErrorStore::new()))
}
