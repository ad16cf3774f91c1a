use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use planner_core::model::PlanId;
use services::{AppServices, Clock, PlanRequest, ResearchConfig, ResearchSource};
use tracing_subscriber::EnvFilter;

mod cli;
mod server;

const DEFAULT_DB_URL: &str = "sqlite://planner.sqlite3";
const DEFAULT_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    InvalidPlanId { raw: String },
    InvalidPhase { raw: String },
    InvalidDate { raw: String },
    InvalidDbUrl { raw: String },
    InvalidAddr { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}> argument"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidPlanId { raw } => write!(f, "invalid plan id: {raw}"),
            ArgsError::InvalidPhase { raw } => write!(f, "invalid phase number: {raw}"),
            ArgsError::InvalidDate { raw } => {
                write!(f, "invalid --date value: {raw} (expected YYYY-MM-DD)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidAddr { raw } => write!(f, "invalid --addr value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  planner serve    [--addr <host:port>] [options]");
    eprintln!("  planner new      --subject <name> --date <YYYY-MM-DD> --chapters <list> [options]");
    eprintln!("  planner list     [options]");
    eprintln!("  planner show     <plan-id> [options]");
    eprintln!("  planner delete   <plan-id> [options]");
    eprintln!("  planner toggle   <plan-id> <phase-number> [options]");
    eprintln!("  planner visit    <plan-id> <url> [options]");
    eprintln!("  planner progress <plan-id> [options]");
    eprintln!("  planner quiz     <plan-id> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>        default {DEFAULT_DB_URL}");
    eprintln!("  --research-url <url>     remote research endpoint (default: local content)");
    eprintln!("  --content <path>         content table JSON (default: built-in table)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PLANNER_DB_URL, PLANNER_RESEARCH_URL, PLANNER_CONTENT_PATH, PLANNER_ADDR, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Serve,
    New,
    List,
    Show,
    Delete,
    Toggle,
    Visit,
    Progress,
    Quiz,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "serve" => Some(Self::Serve),
            "new" => Some(Self::New),
            "list" => Some(Self::List),
            "show" => Some(Self::Show),
            "delete" => Some(Self::Delete),
            "toggle" => Some(Self::Toggle),
            "visit" => Some(Self::Visit),
            "progress" => Some(Self::Progress),
            "quiz" => Some(Self::Quiz),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    db_url: String,
    research_url: Option<String>,
    content_path: Option<String>,
    addr: SocketAddr,
}

impl Settings {
    fn from_env() -> Result<Self, ArgsError> {
        let db_url = non_blank_env("PLANNER_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.into());
        let addr = non_blank_env("PLANNER_ADDR").unwrap_or_else(|| DEFAULT_ADDR.into());
        Ok(Self {
            db_url: normalize_sqlite_url(&db_url),
            research_url: non_blank_env("PLANNER_RESEARCH_URL"),
            content_path: non_blank_env("PLANNER_CONTENT_PATH"),
            addr: parse_addr(addr)?,
        })
    }

    /// A research URL wins over a content file.
    fn research_source(&self) -> ResearchSource {
        match (&self.research_url, &self.content_path) {
            (Some(url), _) => ResearchSource::Remote(ResearchConfig::new(url.clone())),
            (None, Some(path)) => ResearchSource::TableFile(path.clone()),
            (None, None) => ResearchSource::Builtin,
        }
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_addr(raw: String) -> Result<SocketAddr, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidAddr { raw })
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct NewPlanArgs {
    subject: Option<String>,
    date: Option<NaiveDate>,
    chapters: Option<String>,
}

impl NewPlanArgs {
    fn into_request(self) -> PlanRequest {
        PlanRequest {
            subject: self.subject.unwrap_or_default(),
            test_date: self.date,
            chapters: self.chapters.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    settings: Settings,
    new_plan: NewPlanArgs,
    positional: Vec<String>,
}

impl Args {
    fn parse(
        settings: Settings,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut settings = settings;
        let mut new_plan = NewPlanArgs::default();
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    settings.db_url = normalize_sqlite_url(&value);
                }
                "--research-url" => {
                    settings.research_url = Some(require_value(args, "--research-url")?);
                }
                "--content" => settings.content_path = Some(require_value(args, "--content")?),
                "--addr" => settings.addr = parse_addr(require_value(args, "--addr")?)?,
                "--subject" => new_plan.subject = Some(require_value(args, "--subject")?),
                "--chapters" => new_plan.chapters = Some(require_value(args, "--chapters")?),
                "--date" => {
                    let value = require_value(args, "--date")?;
                    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                        .map_err(|_| ArgsError::InvalidDate { raw: value.clone() })?;
                    new_plan.date = Some(date);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        Ok(Self {
            settings,
            new_plan,
            positional,
        })
    }

    fn plan_id(&self) -> Result<PlanId, ArgsError> {
        let raw = self
            .positional
            .first()
            .ok_or(ArgsError::MissingArgument { name: "plan-id" })?;
        PlanId::from_str(raw).map_err(|_| ArgsError::InvalidPlanId { raw: raw.clone() })
    }

    /// Phases are numbered from 1 on the command line.
    fn phase_index(&self) -> Result<usize, ArgsError> {
        let raw = self
            .positional
            .get(1)
            .ok_or(ArgsError::MissingArgument { name: "phase-number" })?;
        match raw.parse::<usize>() {
            Ok(number) if number >= 1 => Ok(number - 1),
            _ => Err(ArgsError::InvalidPhase { raw: raw.clone() }),
        }
    }

    fn url(&self) -> Result<&str, ArgsError> {
        self.positional
            .get(1)
            .map(String::as_str)
            .ok_or(ArgsError::MissingArgument { name: "url" })
    }
}

/// Turn bare paths into absolute `sqlite://` URLs that create the file on
/// first use.
fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.contains("mode=") {
        return trimmed.to_owned();
    }

    let rest = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let (path_str, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    match query {
        Some(query) => format!("sqlite://{}?{query}&mode=rwc", absolute.display()),
        None => format!("sqlite://{}?mode=rwc", absolute.display()),
    }
}

fn prepare_sqlite_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.contains("mode=memory") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Settings::from_env()
        .and_then(|settings| Args::parse(settings, &mut argv))
        .map_err(|e| {
            eprintln!("{e}");
            print_usage();
            e
        })?;

    prepare_sqlite_dir(&parsed.settings.db_url)?;
    let source = parsed.settings.research_source();
    let services =
        AppServices::new_sqlite(&parsed.settings.db_url, Clock::default_clock(), source.build()?)
            .await?;

    match cmd {
        Command::Serve => {
            let state = server::AppState::new(services, &source)?;
            server::serve(parsed.settings.addr, Arc::new(state)).await?;
        }
        Command::New => {
            let request = parsed.new_plan.into_request();
            let (id, plan) = services.plans().create(&request).await?;
            cli::print_plan(id, &plan);
        }
        Command::List => cli::print_summaries(&services.plans().list().await?),
        Command::Show => {
            let id = parsed.plan_id()?;
            cli::print_plan(id, &services.plans().load(id).await?);
        }
        Command::Delete => {
            let id = parsed.plan_id()?;
            services.plans().delete(id).await?;
            println!("Deleted plan {id}");
        }
        Command::Toggle => {
            let id = parsed.plan_id()?;
            let progress = services
                .progress()
                .toggle_phase(id, parsed.phase_index()?)
                .await?;
            cli::print_progress(&progress);
        }
        Command::Visit => {
            let id = parsed.plan_id()?;
            let progress = services
                .progress()
                .record_resource_visit(id, parsed.url()?)
                .await?;
            cli::print_progress(&progress);
        }
        Command::Progress => {
            let id = parsed.plan_id()?;
            cli::print_progress(&services.progress().progress(id).await?);
        }
        Command::Quiz => {
            let id = parsed.plan_id()?;
            let questions = services.quiz().quiz_for(id).await?;
            cli::run_quiz(&questions).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
