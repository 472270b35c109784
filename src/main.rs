use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agenta_console::api::AgentaClient;
use agenta_console::config::ConsoleConfig;
use agenta_console::console::{
    CompanyAction, CompanyChanges, Console, ListOptions, RecordsAction, ViewRequest,
};
use agenta_console::db::LocalStorage;
use agenta_console::export::ExportFormat;
use agenta_console::models::{CreateCompanyInput, CreateRecordInput, UpdateRecordInput};
use agenta_console::session::SessionStore;
use agenta_console::terminal;

#[derive(Parser)]
#[command(name = "agenta")]
#[command(about = "Operator console for vehicle insurance records and companies")]
struct Cli {
    /// Base URL of the records API
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Path to the local storage database
    #[arg(long, global = true)]
    storage: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Unlock the console with the access PIN
    Login {
        /// Enter the PIN without the interactive pad
        #[arg(long)]
        pin: Option<String>,
    },
    /// Lock the console
    Logout,
    /// Show whether the console is unlocked
    Status,
    /// Insurance records
    Records {
        #[command(subcommand)]
        command: Option<RecordsCommand>,
    },
    /// Add an insurance record
    AddRecord(AddRecordArgs),
    /// Insuring companies
    Company {
        #[command(subcommand)]
        command: Option<CompanyCommand>,
    },
    /// Totals and policies expiring soon
    Dashboard,
    /// Open a console page by path, e.g. `/company`
    Open { path: String },
    /// Show the effective configuration
    Config {
        /// Store it, including --api-url and --storage overrides
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Default)]
struct ListArgs {
    /// Only rows containing this text
    #[arg(short, long)]
    search: Option<String>,

    #[arg(long)]
    page: Option<usize>,

    /// Rows per page: 5, 10 or 20
    #[arg(long)]
    page_size: Option<usize>,
}

impl From<ListArgs> for ListOptions {
    fn from(args: ListArgs) -> Self {
        Self {
            search: args.search,
            page: args.page,
            page_size: args.page_size,
        }
    }
}

#[derive(Args)]
struct ExportArgs {
    /// Only rows containing this text
    #[arg(short, long)]
    search: Option<String>,

    #[arg(short, long, value_enum, default_value = "json")]
    format: ExportFormat,

    /// Output file (defaults to the report name in the current directory)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum RecordsCommand {
    /// List records
    List(ListArgs),
    /// Show one record by id or row number
    Show { key: String },
    /// Edit a record's details
    Edit {
        key: String,
        #[command(flatten)]
        fields: RecordEditArgs,
    },
    /// Delete a record
    Delete {
        key: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Export the listed records to a file
    Export(ExportArgs),
}

#[derive(Args)]
struct RecordEditArgs {
    #[arg(long)]
    vehicle_number: Option<String>,
    #[arg(long)]
    vehicle_name: Option<String>,
    #[arg(long)]
    policy: Option<String>,
    #[arg(long)]
    owner_name: Option<String>,
    #[arg(long)]
    ins_type: Option<String>,
    #[arg(long)]
    ins_price: Option<f64>,
}

#[derive(Args)]
struct AddRecordArgs {
    #[arg(long)]
    vehicle_number: Option<String>,
    #[arg(long)]
    vehicle_name: Option<String>,
    #[arg(long)]
    policy: Option<String>,
    #[arg(long)]
    owner_name: Option<String>,

    /// YYYY-MM-DD or RFC 3339
    #[arg(long, value_parser = parse_date)]
    insurance_date: Option<DateTime<Utc>>,

    /// YYYY-MM-DD or RFC 3339
    #[arg(long, value_parser = parse_date)]
    expiry_date: Option<DateTime<Utc>>,

    #[arg(long)]
    ins_type: Option<String>,
    #[arg(long)]
    ins_price: Option<f64>,

    /// Company id or name
    #[arg(long)]
    company: Option<String>,
}

impl AddRecordArgs {
    fn is_empty(&self) -> bool {
        self.vehicle_number.is_none()
            && self.vehicle_name.is_none()
            && self.policy.is_none()
            && self.owner_name.is_none()
            && self.insurance_date.is_none()
            && self.expiry_date.is_none()
            && self.ins_type.is_none()
            && self.ins_price.is_none()
            && self.company.is_none()
    }
}

#[derive(Subcommand)]
enum CompanyCommand {
    /// List companies
    List(ListArgs),
    /// Show one company by id, row number or name
    Show { key: String },
    /// Add a company
    Add {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        agent_name: Option<String>,
        #[arg(long)]
        licence: Option<String>,
    },
    /// Edit a company
    Edit {
        key: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        agent_name: Option<String>,
        #[arg(long)]
        licence: Option<String>,
        /// Replace the company's records (comma separated ids)
        #[arg(long, value_delimiter = ',')]
        records: Option<Vec<String>>,
    },
    /// Delete a company
    Delete {
        key: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Export the listed companies to a file
    Export(ExportArgs),
}

fn parse_date(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| format!("invalid date: {value}"));
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid date {value}: {e}"))
}

/// Initialize tracing. Output goes to stderr so tables on stdout stay clean.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "agenta_console=debug"
    } else {
        "agenta_console=warn"
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn records_request(command: Option<RecordsCommand>) -> ViewRequest {
    let action = match command.unwrap_or(RecordsCommand::List(ListArgs::default())) {
        RecordsCommand::List(args) => RecordsAction::List(args.into()),
        RecordsCommand::Show { key } => RecordsAction::Show { key },
        RecordsCommand::Edit { key, fields } => RecordsAction::Edit {
            key,
            input: UpdateRecordInput {
                vehicle_number: fields.vehicle_number,
                vehicle_name: fields.vehicle_name,
                policy: fields.policy,
                owner_name: fields.owner_name,
                ins_type: fields.ins_type,
                ins_price: fields.ins_price,
            },
        },
        RecordsCommand::Delete { key, yes } => RecordsAction::Delete {
            key,
            confirmed: yes,
        },
        RecordsCommand::Export(args) => RecordsAction::Export {
            search: args.search,
            format: args.format,
            out: args.out,
        },
    };
    ViewRequest::Records(action)
}

fn company_request(command: Option<CompanyCommand>) -> ViewRequest {
    let action = match command.unwrap_or(CompanyCommand::List(ListArgs::default())) {
        CompanyCommand::List(args) => CompanyAction::List(args.into()),
        CompanyCommand::Show { key } => CompanyAction::Show { key },
        CompanyCommand::Add {
            name,
            agent_name,
            licence,
        } => CompanyAction::Add {
            input: CreateCompanyInput {
                name: name.unwrap_or_default(),
                agent_name: agent_name.unwrap_or_default(),
                licence: licence.unwrap_or_default(),
            },
        },
        CompanyCommand::Edit {
            key,
            name,
            agent_name,
            licence,
            records,
        } => CompanyAction::Edit {
            key,
            changes: CompanyChanges {
                name,
                agent_name,
                licence,
                records,
            },
        },
        CompanyCommand::Delete { key, yes } => CompanyAction::Delete {
            key,
            confirmed: yes,
        },
        CompanyCommand::Export(args) => CompanyAction::Export {
            search: args.search,
            format: args.format,
            out: args.out,
        },
    };
    ViewRequest::Company(action)
}

fn add_record_request(args: AddRecordArgs) -> ViewRequest {
    if args.is_empty() {
        return ViewRequest::AddRecord(None);
    }
    ViewRequest::AddRecord(Some(CreateRecordInput {
        vehicle_number: args.vehicle_number.unwrap_or_default(),
        vehicle_name: args.vehicle_name.unwrap_or_default(),
        policy: args.policy.unwrap_or_default(),
        owner_name: args.owner_name.unwrap_or_default(),
        insurance_date: args.insurance_date,
        expiry_date: args.expiry_date,
        ins_type: args.ins_type.unwrap_or_default(),
        ins_price: args.ins_price,
        company: args.company.unwrap_or_default(),
    }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = ConsoleConfig::load().context("Failed to load configuration")?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    if let Some(path) = cli.storage {
        config.storage_path = Some(path);
    }
    config.validate()?;

    let storage = match &config.storage_path {
        Some(path) => LocalStorage::open(path.clone()),
        None => LocalStorage::open_default(),
    }
    .context("Failed to open local storage")?;
    storage.migrate()?;

    let store = SessionStore::init(storage, config.credential()?, config.restore_policy())?;
    let client = AgentaClient::from_config(&config)?;
    tracing::debug!("Using API at {}", client.base_url());

    let mut console = Console::new(config, client, store, std::io::stdout())
        .interactive(terminal::is_interactive());

    let result = match cli.command {
        Commands::Login { pin } => console.login(pin.as_deref()).await,
        Commands::Logout => console.logout(),
        Commands::Status => console.status(),
        Commands::Records { command } => console.show(records_request(command)).await,
        Commands::AddRecord(args) => console.show(add_record_request(args)).await,
        Commands::Company { command } => console.show(company_request(command)).await,
        Commands::Dashboard => console.show(ViewRequest::Dashboard).await,
        Commands::Open { path } => console.open(&path).await,
        Commands::Config { save } => console.config(save),
    };

    console.close();
    result
}
