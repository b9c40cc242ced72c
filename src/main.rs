use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::runtime::Runtime;

use integration_hub::{
    init_tracing, render_text, render_view, CredentialStore, HttpBackend, HubArgs,
    IntegrationSession, LoadOutcome, LogTarget, Provider, Settings,
};

#[derive(Debug, Parser)]
#[command(name = "integration-hub", version, about = "Connect an integration and browse the data it returns")]
struct Cli {
    #[command(flatten)]
    args: HubArgs,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive terminal UI (default)
    Tui,
    /// Load one provider's data and print it
    Load {
        /// Provider name or slug (notion, airtable, hubspot)
        #[arg(long, short)]
        provider: Provider,
        /// Print the raw JSON of grouped data as well
        #[arg(long)]
        raw: bool,
    },
    /// List available integrations
    Providers,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_args(&cli.args)?;

    match cli.cmd.unwrap_or(Command::Tui) {
        Command::Tui => {
            let target = match &settings.log_file {
                Some(path) => LogTarget::File(path),
                None => LogTarget::Discard,
            };
            init_tracing(target)?;
            run_ui_mode(&settings)
        }
        Command::Load { provider, raw } => {
            init_tracing(LogTarget::Stderr)?;
            run_load(&settings, provider, raw)
        }
        Command::Providers => {
            list_providers();
            Ok(())
        }
    }
}

fn list_providers() {
    println!("🔗 Available integrations");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for provider in Provider::ALL {
        let grouped = if provider.grouping_scheme().is_some() {
            "grouped view"
        } else {
            "raw view"
        };
        println!("  {:<10} {:<10} {} ({})", provider.name(), provider.slug(), provider.description(), grouped);
    }
}

fn run_load(settings: &Settings, provider: Provider, raw: bool) -> Result<()> {
    println!("🔗 Loading {} data from {}", provider.name(), settings.backend_url);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store = CredentialStore::from_file(&settings.credentials_path)?;
    let backend = HttpBackend::new(settings.backend_url.clone(), settings.timeout)
        .context("Failed to build HTTP client")?;

    let mut session = IntegrationSession::new(settings.context.clone());
    session.select_provider(provider);
    session.connect(&store)?;
    println!("✓ Connected as {} / {}", settings.context.user_id, settings.context.org_id);

    let rt = Runtime::new().context("Failed to start async runtime")?;
    match rt.block_on(session.load_with(&backend)) {
        Some(LoadOutcome::Loaded) => {}
        Some(LoadOutcome::Failed(message)) => {
            eprintln!("❌ {}", message);
            std::process::exit(1);
        }
        Some(LoadOutcome::Stale) | None => {
            eprintln!("❌ Load did not complete");
            std::process::exit(1);
        }
    }

    println!();
    let view = render_view(session.payload(), session.provider(), &settings.date_format);
    print!("{}", render_text(&view, raw));

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(settings: &Settings) -> Result<()> {
    use integration_hub::ui;
    use std::sync::Arc;

    println!("🖥️  Loading Integration Hub UI...\n");

    // Missing file just means nothing can connect yet
    let store = if settings.credentials_path.exists() {
        CredentialStore::from_file(&settings.credentials_path)?
    } else {
        CredentialStore::new()
    };
    if store.is_empty() {
        println!("⚠️  No credentials in {:?}; connect will fail", settings.credentials_path);
    }

    let backend = HttpBackend::new(settings.backend_url.clone(), settings.timeout)
        .context("Failed to build HTTP client")?;
    let rt = Runtime::new().context("Failed to start async runtime")?;

    println!("Starting UI... (Press 'q' to quit)\n");

    let mut app = ui::App::new(
        IntegrationSession::new(settings.context.clone()),
        store,
        settings.date_format.clone(),
        settings.backend_url.clone(),
        Arc::new(backend),
        rt.handle().clone(),
    );
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_settings: &Settings) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: integration-hub load --provider hubspot");
    std::process::exit(1);
}
