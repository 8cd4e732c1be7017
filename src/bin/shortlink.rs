//! Command-line front end for the shortlink API.
//!
//! The session is kept in a file between invocations:
//! ```text
//! shortlink login alice
//! shortlink shorten https://example.com/some/long/path
//! shortlink list
//! ```

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use shortlink_client::auth::RegistrationProfile;
use shortlink_client::config::ClientOptions;
use shortlink_client::error::Error;
use shortlink_client::guard::{Navigation, Route};
use shortlink_client::Shortlink;

const DEFAULT_SESSION_PATH: &str = ".shortlink/session.json";

#[derive(Parser)]
#[clap(name = "shortlink", version, about = "Shorten URLs from the terminal")]
struct Cli {
    /// API base URL (overrides SHORTLINK_API_URL)
    #[clap(long, value_name = "URL")]
    api: Option<String>,

    /// Session file (overrides SHORTLINK_SESSION_PATH)
    #[clap(long, value_name = "FILE")]
    session: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Register {
        username: String,
        email: String,
        #[clap(long)]
        first_name: Option<String>,
        #[clap(long)]
        last_name: Option<String>,
    },
    /// Log in and keep the session
    Login { username: String },
    /// Forget the session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Renew the access token with the refresh token
    Refresh,
    /// List your short links
    List,
    /// Shorten a URL
    Shorten { url: String },
    /// Delete one of your short links
    Delete {
        id: i64,
        /// Do not ask for confirmation
        #[clap(short, long)]
        yes: bool,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] Error),

    #[error("Could not read from the terminal: {0}")]
    Terminal(#[source] io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Client(Error::SessionExpired | Error::NotAuthenticated)) => {
            eprintln!("Not logged in. Run `shortlink login <username>` first.");
            ExitCode::from(2)
        }
        Err(CliError::Client(Error::Registration(errors))) => {
            eprintln!("Registration failed:");
            for (field, messages) in errors.iter() {
                eprintln!("  {}: {}", field, messages.join(" "));
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut options = ClientOptions::from_env()?;
    if let Some(api) = &cli.api {
        url::Url::parse(api).map_err(Error::from)?;
        options = options.with_base_url(api);
    }
    let session_path = cli
        .session
        .or_else(|| options.session_path.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_PATH));
    let client = Shortlink::new_with_options(options.with_session_path(Some(session_path)))?;

    match cli.command {
        Command::Register {
            username,
            email,
            first_name,
            last_name,
        } => {
            let password = prompt("Password: ")?;
            let mut profile = RegistrationProfile::new(&username, &email, &password);
            profile.first_name = first_name;
            profile.last_name = last_name;
            client.auth().register(&profile).await?;
            println!("Account created. Log in with `shortlink login {}`.", username);
        }
        Command::Login { username } => {
            let password = prompt("Password: ")?;
            let session = client.auth().login(&username, &password).await?;
            println!("Hello, {}", session.username());
        }
        Command::Logout => {
            client.auth().logout();
            println!("Logged out");
        }
        Command::Whoami => match client.session() {
            Some(session) if session.is_expired() => {
                println!("{} (access token expired, run `shortlink refresh`)", session.username())
            }
            Some(session) => println!("{}", session.username()),
            None => return Err(Error::NotAuthenticated.into()),
        },
        Command::Refresh => {
            let session = client.auth().refresh_session().await?;
            println!("Token renewed for {}", session.username());
        }
        Command::List => {
            require_dashboard(&client)?;
            let mut dashboard = client.dashboard();
            dashboard.load().await?;
            if dashboard.links().is_empty() {
                println!("No shortened URLs yet.");
            }
            for link in dashboard.links() {
                println!(
                    "{:>6}  {}  {}  {}",
                    link.id,
                    dashboard.short_url(link),
                    link.created_at.format("%Y-%m-%d"),
                    link.long_url
                );
            }
        }
        Command::Shorten { url } => {
            require_dashboard(&client)?;
            let mut dashboard = client.dashboard();
            match dashboard.submit(&url).await {
                Ok(link) => println!("{}", dashboard.short_url(&link)),
                Err(Error::RateLimited) => {
                    let remaining = dashboard.cooldown_remaining();
                    dashboard.close();
                    return Err(Error::CoolingDown(remaining).into());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Delete { id, yes } => {
            require_dashboard(&client)?;
            if !yes && !confirm(&format!("Delete link {}? [y/N] ", id))? {
                return Ok(());
            }
            client.links().delete(id).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

fn require_dashboard(client: &Shortlink) -> Result<(), Error> {
    match client.navigate(Route::Dashboard) {
        Navigation::Render(_) => Ok(()),
        Navigation::Redirect(_) => Err(Error::NotAuthenticated),
    }
}

fn prompt(label: &str) -> Result<String, CliError> {
    read_answer(label, &mut io::stdin().lock(), &mut io::stdout()).map_err(CliError::Terminal)
}

fn read_answer(label: &str, input: &mut impl BufRead, output: &mut impl Write) -> io::Result<String> {
    write!(output, "{}", label)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no input"));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn confirm(question: &str) -> Result<bool, CliError> {
    let answer = prompt(question)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
