use anyhow::Result;
use clap::{Parser, Subcommand};

use plinkk_audit::cli::{handle_entity_command, handle_log_command, EntityCommands, LogCommands};
use plinkk_audit::config::{AuditPaths, Settings};
use plinkk_audit::logging;
use plinkk_audit::storage::Storage;

#[derive(Parser)]
#[command(
    name = "plinkk-audit",
    author = "Plinkk Team",
    version,
    about = "Audit trail with field-level diffs and point-in-time restoration",
    long_about = "plinkk-audit records every administrative change to users, pages, \
                  themes, redirects and roles as an append-only field-level diff, and \
                  can restore an entity to its state right after any recorded change."
)]
struct Cli {
    /// Enable debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Audited entity operations
    #[command(subcommand)]
    Entity(EntityCommands),

    /// Browse the audit log and restore from it
    #[command(subcommand)]
    Log(LogCommands),

    /// Write the default settings and create the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = AuditPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    logging::init(&settings.log_filter, cli.verbose)?;

    let storage = Storage::new(paths.clone(), &settings)?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Entity(cmd)) => handle_entity_command(&storage, cmd)?,
        Some(Commands::Log(cmd)) => handle_log_command(&storage, cmd)?,
        Some(Commands::Init) => {
            println!("Initializing plinkk-audit at: {}", paths.base_dir().display());
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Settings written to {}", paths.settings_file().display());
            println!("Run 'plinkk-audit entity create user --set name=...' to get started.");
        }
        Some(Commands::Config) => {
            println!("plinkk-audit Configuration");
            println!("==========================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Data directory:  {}", paths.data_dir().display());
            println!("Audit log:       {}", paths.audit_log().display());
            println!("Initialized:     {}", if paths.is_initialized() { "yes" } else { "no" });
            println!();
            println!("Settings:");
            println!("  Log filter:      {}", settings.log_filter);
            println!(
                "  Excluded fields: {}",
                settings
                    .excluded_fields
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("  Classification rules (first match wins):");
            for rule in &settings.classification_rules {
                let mut matchers = rule.keywords.clone();
                matchers.extend(rule.exact.iter().map(|e| format!("={}", e)));
                println!("    {:<9} {}", rule.entity_type.as_str(), matchers.join(", "));
            }
        }
        None => {
            println!("plinkk-audit - audit trail and restoration");
            println!();
            println!("Run 'plinkk-audit --help' for usage information.");
        }
    }

    let failures = storage.audit.failure_count();
    if failures > 0 {
        eprintln!("Warning: {} audit entries could not be written", failures);
    }

    Ok(())
}
