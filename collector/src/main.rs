//! Main entry point for the eggventory binary
//!
//! Wires the real HTTP API and file-backed session storage into a
//! [`FarmApp`] and exposes the worker and owner workflows as subcommands.

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use collector::config::{ENV_API_URL, ENV_POLL_SECS, ENV_SESSION_DIR, ENV_TIMEOUT_SECS};
use collector::core::CompanionStatus;
use collector::{display, shutdown};
use collector::{
    COMPONENT, ClientConfig, CollectorError, CollectorResult, FarmApp, SignUpOutcome, View,
    services::{FileSessionStorage, RealFarmApi},
};
use shared::logging;
use shared::{
    BoxAddress, BoxWrite, DateRange, DetailedReportKind, ExpenseRecord, FeedConsumption, FeedPurchase, MedicalRecord,
    ProfileUpdateForm, RecordKind, Role, SaleRecord, SharedError, SignUpForm, initialize_layout,
};

type App = FarmApp<RealFarmApi, FileSessionStorage>;

/// Record and review daily egg collections for the farm
#[derive(Parser)]
#[command(name = "eggventory")]
#[command(about = "Record and review daily egg collections for the farm")]
struct Args {
    /// Backend base URL
    #[arg(long, global = true, env = ENV_API_URL)]
    api_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, global = true, env = ENV_TIMEOUT_SECS)]
    timeout_secs: Option<u64>,

    /// Pending-user poll interval in seconds
    #[arg(long, global = true, env = ENV_POLL_SECS)]
    poll_secs: Option<u64>,

    /// Directory holding the saved session
    #[arg(long, global = true, env = ENV_SESSION_DIR)]
    session_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and save the session
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long, env = "EGGVENTORY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        role: Role,
    },
    /// Ask for a password reset email
    ResetPassword {
        #[arg(long)]
        email: String,
    },
    Logout,
    /// Show the signed-in user and view
    Whoami,
    /// Print the farm layout and box addresses
    Layout,
    /// Record a day's collection
    Collect {
        /// Collection date, defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Eggs collected from the shade
        #[arg(long)]
        shade: Option<String>,
        /// Box count as CAGE-PARTITION-ROW-COLUMN=EGGS, repeatable
        #[arg(long = "box", value_name = "ADDR=EGGS")]
        boxes: Vec<String>,
        /// Read further entries from stdin until `submit`
        #[arg(long)]
        interactive: bool,
    },
    /// Show the recorded collection for a date
    Report {
        #[arg(long)]
        date: Option<NaiveDate>,
        #[command(subcommand)]
        command: Option<ReportCommand>,
    },
    /// Owner overview
    Dashboard,
    /// Manage user accounts
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// Notify about new sign-ups until interrupted
    WatchPending,
    /// Record sales, expenses, feed and treatments
    Record {
        #[command(subcommand)]
        command: RecordCommand,
    },
    /// Show record history (sales, feed, expenses, medical)
    History { kind: RecordKind },
    /// Download a PDF report
    Download {
        kind: RecordKind,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Output file, defaults to the report's own name
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Set the flock size
    ChickenCount { total: u32 },
    /// Update the signed-in owner's profile
    Profile {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        confirm_password: Option<String>,
        #[arg(long)]
        current_password: Option<String>,
    },
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Owner summaries: feed, performance, weekly or monthly
    Detailed {
        #[arg(long)]
        kind: DetailedReportKind,
        #[arg(long)]
        start: Option<NaiveDate>,
        #[arg(long)]
        end: Option<NaiveDate>,
    },
}

#[derive(Subcommand)]
enum UsersCommand {
    List,
    Pending,
    Approve { id: u64 },
    Delete { id: u64 },
    /// Add a staff account
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "worker")]
        role: Role,
    },
}

#[derive(Subcommand)]
enum RecordCommand {
    Sale {
        #[arg(long)]
        trays: u32,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Expense {
        /// e.g. feed, medicine, labour, transport
        #[arg(long = "type")]
        expense_type: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value = "")]
        description: String,
        /// Feed expenses: sacks bought
        #[arg(long)]
        sacks: Option<u32>,
        /// Feed expenses: kilograms bought, overrides sacks
        #[arg(long)]
        quantity_kg: Option<f64>,
        /// Medicine expenses: kind of treatment
        #[arg(long)]
        treatment_type: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    FeedPurchase {
        #[arg(long, conflicts_with = "sacks", required_unless_present = "sacks")]
        quantity_kg: Option<f64>,
        #[arg(long)]
        sacks: Option<u32>,
        #[arg(long)]
        cost: f64,
        #[arg(long, default_value = "general")]
        feed_type: String,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    FeedConsumption {
        #[arg(long)]
        quantity_kg: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    Medical {
        #[arg(long = "type")]
        treatment_type: String,
        #[arg(long)]
        description: String,
        #[arg(long, default_value_t = 0.0)]
        cost: f64,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> CollectorResult<()> {
    // .env must be loaded before clap reads env fallbacks
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    logging::init_tracing_with_level(COMPONENT, Some(&args.log_level));

    let config = ClientConfig::new(
        args.api_url.as_deref(),
        args.timeout_secs,
        args.poll_secs,
        args.session_dir.clone(),
    )?;
    shared::component_debug!(COMPONENT, api_url = %config.api_url, session_dir = %config.session_dir.display(), "Configuration loaded");

    let storage = FileSessionStorage::new(config.session_dir.clone());
    let poll_interval = config.poll_interval;
    let api = RealFarmApi::new(config)?;
    let app = FarmApp::new(api, storage, initialize_layout(), poll_interval);
    app.start().await?;

    let result = run(&app, args.command).await;
    if let Err(e) = &result {
        if e.is_unauthorized() {
            eprintln!("{e}. Run `eggventory login` to continue.");
        } else if e.is_retryable() {
            eprintln!("{e}. Please try again.");
        }
        if let Some(fields) = e.field_errors() {
            for (field, message) in fields {
                eprintln!("  {field}: {message}");
            }
        }
    }
    result
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Range from optional bounds; a missing start means thirty days before the end
fn date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> CollectorResult<Option<DateRange>> {
    if start.is_none() && end.is_none() {
        return Ok(None);
    }
    let end = end.unwrap_or_else(today);
    let start = start.unwrap_or_else(|| DateRange::last_days_until(end).start_date);
    Ok(Some(DateRange::new(start, end)?))
}

async fn run(app: &App, command: Command) -> CollectorResult<()> {
    match command {
        Command::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ").await?,
            };
            let view = app.login(&email, &password).await?;
            println!("Signed in ({view}). {}", landing_hint(view));
        }
        Command::Signup {
            username,
            email,
            password,
            confirm_password,
            role,
        } => {
            app.begin_sign_up().await;
            let form = SignUpForm {
                username,
                email,
                password,
                confirm_password,
                role: Some(role),
            };
            match app.sign_up(&form).await? {
                SignUpOutcome::SignedIn(view) => println!("Account created, signed in ({view})"),
                SignUpOutcome::AwaitingApproval { message } => println!("{message}"),
            }
        }
        Command::ResetPassword { email } => {
            app.request_password_reset(&email).await?;
            println!("If that address has an account, a reset link is on its way");
        }
        Command::Logout => {
            app.logout().await?;
            println!("Signed out");
        }
        Command::Whoami => match app.current_user().await {
            Some(user) => println!("{} <{}> {} ({})", user.username, user.email, user.role, app.view().await),
            None => println!("Not signed in"),
        },
        Command::Layout => print!("{}", display::render_layout(app.layout())),
        Command::Collect {
            date,
            shade,
            boxes,
            interactive,
        } => collect(app, date, shade, boxes, interactive).await?,
        Command::Report { date, command: None } => {
            let report = app.fetch_report(date.unwrap_or_else(today)).await?;
            print!("{}", display::render_report(&report));
        }
        Command::Report {
            command: Some(ReportCommand::Detailed { kind, start, end }),
            ..
        } => {
            let report = app.detailed_report(kind, date_range(start, end)?).await?;
            print!("{}", display::render_detailed(kind, &report));
        }
        Command::Dashboard => {
            let overview = app.dashboard().await?;
            print!("{}", display::render_dashboard(&overview, app.layout()));
        }
        Command::Users { command } => users(app, command).await?,
        Command::WatchPending => watch_pending(app).await?,
        Command::Record { command } => record(app, command).await?,
        Command::History { kind } => {
            let history = app.record_history(kind).await?;
            print!("{}", display::render_history(kind, &history));
        }
        Command::Download {
            kind,
            start,
            end,
            output,
        } => {
            let download = app.download_report(kind, date_range(start, end)?).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(download.file_name()));
            tokio::fs::write(&path, &download.bytes).await?;
            println!("Saved {} ({} bytes)", path.display(), download.bytes.len());
        }
        Command::ChickenCount { total } => {
            app.update_chicken_count(total).await?;
            println!("Flock size set to {total}");
        }
        Command::Profile {
            username,
            email,
            password,
            confirm_password,
            current_password,
        } => {
            let form = ProfileUpdateForm {
                username,
                email,
                password: password.unwrap_or_default(),
                confirm_password: confirm_password.unwrap_or_default(),
                current_password: current_password.unwrap_or_default(),
            };
            let user = app.update_profile(&form).await?;
            println!("Profile updated: {} <{}>", user.username, user.email);
        }
    }
    Ok(())
}

/// Parse `CAGE-PARTITION-ROW-COLUMN=EGGS`
fn parse_box_entry(entry: &str) -> CollectorResult<(BoxAddress, String)> {
    let (address, value) = entry
        .split_once('=')
        .ok_or_else(|| SharedError::InvalidBoxAddress { input: entry.to_string() })?;
    Ok((address.trim().parse()?, value.trim().to_string()))
}

async fn apply_box(app: &App, entry: &str) -> CollectorResult<()> {
    let (address, value) = parse_box_entry(entry)?;
    if app.set_box_count(address, &value).await? == BoxWrite::Reject {
        let grid = app.grid().await;
        let message = grid.field_error(&address).unwrap_or(shared::OVER_CAPACITY_MESSAGE);
        eprintln!("box {address}: {message}");
    }
    Ok(())
}

async fn collect(
    app: &App,
    date: Option<NaiveDate>,
    shade: Option<String>,
    boxes: Vec<String>,
    interactive: bool,
) -> CollectorResult<()> {
    if !app.view().await.is_authenticated() {
        return Err(CollectorError::NotAuthenticated);
    }
    if let Some(date) = date {
        app.set_collection_date(date).await;
    }
    if let Some(shade) = shade {
        app.set_shade_eggs(&shade).await?;
    }
    for entry in &boxes {
        apply_box(app, entry).await?;
    }

    if interactive {
        println!("Enter ADDR=EGGS, shade=N, show, clear or submit");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            match line {
                "" => continue,
                "submit" => {
                    let grid = app.grid().await;
                    if grid.field_errors().is_empty() {
                        break;
                    }
                    for (address, message) in grid.field_errors() {
                        eprintln!("box {address}: {message}");
                    }
                    eprintln!("Correct the flagged boxes before submitting");
                }
                "show" => print!("{}", display::render_grid(&app.grid().await)),
                "clear" => app.collection().reset().await,
                _ => match line.strip_prefix("shade=") {
                    Some(value) => {
                        if let Err(e) = app.set_shade_eggs(value).await {
                            eprintln!("{e}");
                        }
                    }
                    None => {
                        if let Err(e) = apply_box(app, line).await {
                            eprintln!("{e}");
                        }
                    }
                },
            }
        }
    }

    print!("{}", display::render_grid(&app.grid().await));
    let receipt = app
        .submit_collection_until(shutdown::ctrl_c("Submission cancelled by Ctrl+C"))
        .await?;
    println!("{}", display::render_receipt(&receipt));
    Ok(())
}

async fn users(app: &App, command: UsersCommand) -> CollectorResult<()> {
    match command {
        UsersCommand::List => print!("{}", display::render_users(&app.list_users().await?)),
        UsersCommand::Pending => print!("{}", display::render_users(&app.pending_users().await?)),
        UsersCommand::Approve { id } => {
            app.approve_user(id).await?;
            println!("User {id} approved");
        }
        UsersCommand::Delete { id } => {
            app.delete_user(id).await?;
            println!("User {id} deleted");
        }
        UsersCommand::Create {
            username,
            email,
            password,
            role,
        } => {
            let form = SignUpForm {
                username,
                email,
                confirm_password: password.clone(),
                password,
                role: Some(role),
            };
            match app.create_user(&form).await? {
                Some(user) => println!("Created {} ({})", user.username, user.role),
                None => println!("Account created"),
            }
        }
    }
    Ok(())
}

async fn watch_pending(app: &App) -> CollectorResult<()> {
    let mut shown = 0;
    let printer = async {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(1));
        loop {
            ticker.tick().await;
            let notifications = app.notifications().await;
            if notifications.len() > shown {
                print!("{}", display::render_notifications(&notifications[..notifications.len() - shown]));
                shown = notifications.len();
            }
        }
    };

    let watcher = app.watch_pending(shutdown::ctrl_c("Received Ctrl+C signal"));

    tokio::select! {
        result = watcher => result,
        _ = printer => Ok(()),
    }
}

async fn record(app: &App, command: RecordCommand) -> CollectorResult<()> {
    match command {
        RecordCommand::Sale { trays, price, date } => {
            let sale = SaleRecord::new(trays, price, date.unwrap_or_else(today))?;
            app.record_sale(&sale).await?;
            println!("Sale recorded: {:.2}", sale.total_amount());
        }
        RecordCommand::Expense {
            expense_type,
            amount,
            description,
            sacks,
            quantity_kg,
            treatment_type,
            date,
        } => {
            let mut expense = ExpenseRecord::new(&expense_type, amount, &description, date.unwrap_or_else(today))?;
            expense.sacks = sacks;
            expense.quantity_kg = quantity_kg;
            expense.treatment_type = treatment_type;

            let receipt = app.record_expense(&expense).await?;
            println!("Expense recorded");
            if receipt.feed_purchase == CompanionStatus::Failed {
                eprintln!("Feed purchase could not be recorded; add it with `record feed-purchase`");
            }
            if receipt.medical == CompanionStatus::Failed {
                eprintln!("Medical record could not be saved; add it with `record medical`");
            }
        }
        RecordCommand::FeedPurchase {
            quantity_kg,
            sacks,
            cost,
            feed_type,
            date,
        } => {
            let date = date.unwrap_or_else(today);
            let purchase = match (quantity_kg, sacks) {
                (Some(kg), _) => FeedPurchase::new(kg, cost, &feed_type, date)?,
                (None, Some(sacks)) => FeedPurchase::from_sacks(sacks, cost, &feed_type, date)?,
                (None, None) => return Err(SharedError::validation("quantity_kg", "is required").into()),
            };
            app.record_feed_purchase(&purchase).await?;
            println!("Feed purchase recorded: {} kg", purchase.quantity_kg);
        }
        RecordCommand::FeedConsumption { quantity_kg, date } => {
            let consumption = FeedConsumption::new(quantity_kg, date.unwrap_or_else(today))?;
            app.record_feed_consumption(&consumption).await?;
            println!("Feed consumption recorded");
        }
        RecordCommand::Medical {
            treatment_type,
            description,
            cost,
            date,
        } => {
            let record = MedicalRecord::new(&treatment_type, &description, cost, date.unwrap_or_else(today))?;
            app.record_medical(&record).await?;
            println!("Medical record saved");
        }
    }
    Ok(())
}

async fn prompt(label: &str) -> CollectorResult<String> {
    eprint!("{label}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    Ok(lines.next_line().await?.unwrap_or_default())
}

fn landing_hint(view: View) -> &'static str {
    match view {
        View::OwnerDashboard => "Try `eggventory dashboard`",
        View::WorkerCollection => "Try `eggventory collect --interactive`",
        View::SignIn | View::SignUp => "Run `eggventory login`",
    }
}
