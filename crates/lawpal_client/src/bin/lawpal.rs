//! lawpal: command-line front end for the LawPal backend.
//! Reads config, then runs one subcommand (chat, history, submit-form, login,
//! signup, route, services) against the configured backend or auth provider
//! and prints the result to stdout.

use clap::{Parser, Subcommand};
use lawpal_client::config;
use lawpal_client::{
    ChatAnswer, ChatHistory, Client, FormPayload, Route, Service, SessionListener, SessionStore,
    SupabaseAuth,
};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "LAWPAL_CONFIG";
const USER_ID_ENV: &str = "LAWPAL_USER_ID";
const DEFAULT_USER_ID: &str = "default_user";
const PASSWORD_ENV: &str = "LAWPAL_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "lawpal")]
#[command(version, about = "LawPal legal assistance client", long_about = None)]
struct Args {
    /// Config file (default: $LAWPAL_CONFIG, then ~/.lawpal/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a service a question (positional argument or first line of stdin)
    Chat {
        service: String,
        question: Option<String>,
        #[arg(long)]
        user: Option<String>,
    },
    /// Print prior exchanges with a service
    History {
        service: String,
        #[arg(long)]
        user: Option<String>,
    },
    /// Submit a form as repeated --field key=value pairs
    SubmitForm {
        #[arg(long = "field", value_parser = parse_field, required = true)]
        fields: Vec<(String, String)>,
    },
    /// Sign in with email and password (password: --password, $LAWPAL_PASSWORD, or stdin)
    Login {
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account with email and password
    Signup {
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Show which page a URL path maps to
    Route { path: String },
    /// List the services the backend knows
    Services,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))?;
    if key.is_empty() {
        return Err(format!("empty field name in `{raw}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn resolve_config_path(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .or_else(config::default_config_path)
}

fn resolve_user(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var(USER_ID_ENV).ok())
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string())
}

fn resolve_password(flag: Option<String>) -> String {
    let password = flag
        .or_else(|| std::env::var(PASSWORD_ENV).ok())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(read_line);
    if password.is_empty() {
        fail("no password provided (--password, LAWPAL_PASSWORD or stdin)");
    }
    password
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    process::exit(1);
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    // Commands that never touch the backend.
    match &args.command {
        Command::Route { path } => {
            match Route::parse(path) {
                Some(route) => {
                    println!("{}", route.page_name());
                    if let Some(service) = route.service() {
                        println!("service: {service}");
                    }
                }
                None => fail(format!("no page for path {path}")),
            }
            return;
        }
        Command::Services => {
            for service in Service::ALL {
                println!("{}\t{}", service.slug(), service.title());
            }
            return;
        }
        _ => {}
    }

    let cfg = match resolve_config_path(args.config) {
        Some(path) => config::load_or_default(&path).unwrap_or_else(|e| {
            fail(format!(
                "failed to load config from {}: {}",
                path.display(),
                e
            ))
        }),
        None => config::Config::default(),
    }
    .with_env_overrides();

    let client = Client::new(cfg.base_url());
    let auth = match &args.command {
        Command::Login { .. } | Command::Signup { .. } => {
            let (url, anon_key) = cfg
                .auth_provider()
                .unwrap_or_else(|| fail("auth provider not configured"));
            Some(Arc::new(SupabaseAuth::new(url, anon_key)))
        }
        _ => None,
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| fail(format!("failed to create runtime: {e}")));

    rt.block_on(async {
        match args.command {
            Command::Chat {
                service,
                question,
                user,
            } => {
                let question = question
                    .map(|q| q.trim().to_string())
                    .unwrap_or_else(read_line);
                if question.is_empty() {
                    fail("no question provided (argument or stdin)");
                }
                let reply = client
                    .send_chat_query(&service, &question, &resolve_user(user))
                    .await
                    .unwrap_or_else(|e| fail(format!("chat query failed: {e}")));
                match ChatAnswer::from_json(&reply) {
                    Some(answer) => println!("{}", answer.response),
                    None => println!("{reply}"),
                }
            }
            Command::History { service, user } => {
                let reply = client
                    .get_chat_history(&service, &resolve_user(user))
                    .await
                    .unwrap_or_else(|e| fail(format!("history request failed: {e}")));
                match ChatHistory::from_json(&reply) {
                    Some(history) => {
                        for entry in history.history {
                            println!("{}: {}", entry.role, entry.content);
                        }
                    }
                    None => println!("{reply}"),
                }
            }
            Command::SubmitForm { fields } => {
                let payload: FormPayload = fields.into_iter().collect();
                let reply = client
                    .submit_form(&payload)
                    .await
                    .unwrap_or_else(|e| fail(format!("form submission failed: {e}")));
                println!("{reply}");
            }
            Command::Login { email, password } => {
                let Some(auth) = auth else { return };
                let password = resolve_password(password);
                let store = SessionStore::new();
                let listener = SessionListener::mount(auth.clone(), store.clone());
                auth.sign_in_with_password(&email, &password)
                    .await
                    .unwrap_or_else(|e| fail(format!("sign in failed: {e}")));
                print_signed_in(&store);
                listener.unmount();
            }
            Command::Signup { email, password } => {
                let Some(auth) = auth else { return };
                let password = resolve_password(password);
                let store = SessionStore::new();
                let listener = SessionListener::mount(auth.clone(), store.clone());
                let session = auth
                    .sign_up(&email, &password)
                    .await
                    .unwrap_or_else(|e| fail(format!("sign up failed: {e}")));
                match session {
                    Some(_) => print_signed_in(&store),
                    None => println!("confirmation email sent to {email}"),
                }
                listener.unmount();
            }
            Command::Route { .. } | Command::Services => {}
        }
    });
}

/// Print the user mirrored into `store` by the session listener.
fn print_signed_in(store: &SessionStore) {
    match store.user() {
        Some(user) => println!(
            "signed in: {} {}",
            user.id,
            user.email.as_deref().unwrap_or("")
        ),
        None => fail("no session after sign in"),
    }
}

/// First line of stdin, trimmed.
fn read_line() -> String {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).unwrap_or(0);
    line.trim().to_string()
}
