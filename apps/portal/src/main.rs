use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portal_core::{
    session::LOGIN_PATH,
    views::{Header, SectionContent},
    HttpBankingApi, MainArea, PortalApp, View,
};
use rust_decimal::Decimal;
use shared::{
    domain::{Direction, Section},
    protocol::{LoginRequest, PaymentRequest, RegisterRequest, Transaction},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "portal", about = "Customer banking portal client")]
struct Args {
    /// Overrides the server url from portal.toml / environment.
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    username: String,
    #[arg(long)]
    account_number: String,
    #[arg(long)]
    password: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and show the dashboard summary.
    Login,
    /// Create an account, then show the dashboard summary.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        id_number: String,
    },
    Dashboard,
    Statements,
    Insights,
    Settings,
    /// Submit a payment and show the refreshed balance.
    Pay {
        #[arg(long)]
        amount: Decimal,
        #[arg(long, default_value = "USD")]
        currency: String,
        #[arg(long, default_value = "SWIFT")]
        provider: String,
        #[arg(long)]
        recipient_account: String,
        #[arg(long)]
        swift_code: String,
    },
}

impl Command {
    fn section(&self) -> Section {
        match self {
            Command::Login | Command::Register { .. } | Command::Dashboard => Section::Dashboard,
            Command::Statements => Section::Statements,
            Command::Insights => Section::Insights,
            Command::Settings => Section::Settings,
            Command::Pay { .. } => Section::MakePayment,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let (mut settings, warnings) = load_settings();
    if let Some(server_url) = args.server_url.clone() {
        settings.server_url = server_url;
    }
    let filter =
        EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    for warning in warnings {
        warn!("{warning}");
    }

    let api = HttpBankingApi::new(&settings.server_url)
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    info!(server_url = %api.base_url(), "portal starting");
    let mut app = PortalApp::new(Arc::new(api));
    app.navigate(LOGIN_PATH).await;

    let view = match &args.command {
        Command::Register {
            name,
            surname,
            id_number,
        } => {
            app.register(&RegisterRequest {
                name: name.clone(),
                surname: surname.clone(),
                id_number: id_number.clone(),
                account_number: args.account_number.clone(),
                username: args.username.clone(),
                password: args.password.clone(),
            })
            .await
        }
        _ => {
            app.sign_in(&LoginRequest {
                username: args.username.clone(),
                account_number: args.account_number.clone(),
                password: args.password.clone(),
            })
            .await
        }
    }
    .context("authentication failed")?;

    if view != View::UserHome {
        println!(
            "Signed in to {view:?}; the customer dashboard is only available to user accounts."
        );
        app.logout().await;
        return Ok(());
    }

    app.settle().await;
    let orchestrator = app.orchestrator()?;

    if let Command::Pay {
        amount,
        currency,
        provider,
        recipient_account,
        swift_code,
    } = &args.command
    {
        let submitted = app
            .payment_submitter()?
            .submit(&PaymentRequest {
                amount: *amount,
                currency: currency.clone(),
                provider: provider.clone(),
                recipient_account: recipient_account.clone(),
                swift_code: swift_code.clone(),
            })
            .await;
        let receipt = match submitted {
            Ok(receipt) => receipt,
            Err(err) => {
                if app.expire_session_if_rejected(&err).await {
                    println!("Your session has expired. Please sign in again.");
                }
                return Err(err.context("payment failed"));
            }
        };
        match receipt.message {
            Some(message) => println!("Payment submitted: {message}"),
            None => println!("Payment submitted."),
        }
    }

    orchestrator.select_section(args.command.section()).await;
    print_header(&orchestrator.header().await);
    print_main_area(&orchestrator.main_area().await);

    app.logout().await;
    Ok(())
}

fn print_header(header: &Header) {
    println!("== {} ==  {}", header.title, header.greeting);
}

fn print_main_area(area: &MainArea) {
    match area {
        MainArea::Loading => println!("Loading..."),
        MainArea::Error(message) => println!("{message}"),
        MainArea::Ready(content) => print_content(content),
    }
}

fn print_content(content: &SectionContent) {
    match content {
        SectionContent::Dashboard(summary) => {
            println!("Account Balance: R{:.2}", summary.balance);
            println!("Account Number:  {}", summary.account_number);
            println!("Recent Transactions:");
            print_transactions(&summary.recent_transactions);
        }
        SectionContent::MakePayment(context) => {
            println!("Available balance: R{:.2}", context.balance);
        }
        SectionContent::Statements(transactions) => print_transactions(transactions),
        SectionContent::Insights(insights) => {
            println!("Incoming: R{:.2}", insights.total_incoming);
            println!("Outgoing: R{:.2}", insights.total_outgoing);
            println!("Net flow: R{:.2}", insights.net_flow);
            println!(
                "Approved: {}  Pending: {}  Other: {}",
                insights.approved, insights.pending, insights.other
            );
        }
        SectionContent::Settings(settings) => {
            println!("First Name:     {}", settings.first_name);
            println!("Last Name:      {}", settings.last_name);
            println!("Account Number: {}", settings.account_number);
        }
    }
}

fn print_transactions(transactions: &[Transaction]) {
    if transactions.is_empty() {
        println!("  (none)");
    }
    for transaction in transactions {
        let sign = match transaction.direction {
            Direction::Incoming => '+',
            Direction::Outgoing => '-',
        };
        println!(
            "  {}  {:<30} {sign}R{:.2}  {}",
            transaction.created_at.format("%Y-%m-%d"),
            transaction.display_text,
            transaction.amount,
            String::from(transaction.status.clone()),
        );
    }
}
