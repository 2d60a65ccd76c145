//! Command-line interface: argument definitions and command handlers.

use crate::config::Settings;
use crate::error::Error;
use crate::github::{GitHubClient, RemoteRepository};
use crate::locator::PackageId;
use crate::manifest::Manifest;
use crate::project::{self, InstallReport, InstallStatus, Project};
use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Default number of search results
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

const RULE_WIDTH: usize = 70;

#[derive(Parser, Debug)]
#[command(
    name = "skillmaster",
    version,
    about = "AI Code Assistant Markdown Package Manager",
    long_about = "Manage, discover, and share AI code assistant configuration files \
                  (prompts, instructions, context files) across projects, using GitHub \
                  repositories as packages."
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create skillmaster.json and the install directory here
    Init {
        /// Overwrite an existing manifest without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Install a package, or every manifest dependency when none is given
    Install {
        /// Package identifier, owner/repo
        package: Option<String>,
        /// Download again even if files are already present
        #[arg(short, long)]
        force: bool,
    },
    /// Remove an installed package
    Uninstall {
        /// Package identifier, owner/repo
        package: String,
    },
    /// List installed packages
    List,
    /// Search GitHub for packages by keyword
    Search {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Maximum number of results
        #[arg(short, long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,
    },
    /// Show the current configuration
    Config {
        /// Print the raw JSON settings
        #[arg(short, long)]
        raw: bool,
    },
}

/// Run a parsed command against the project in `cwd`.
pub fn run(cli: Cli, settings: &Settings, cwd: &Path) -> Result<()> {
    match cli.command {
        Command::Init { force } => cmd_init(cwd, settings, force),
        Command::Install { package, force } => {
            let client = client(settings)?;
            match package {
                Some(package) => cmd_install(cwd, &client, &package, force),
                None => cmd_install_all(cwd, &client, force),
            }
        }
        Command::Uninstall { package } => cmd_uninstall(cwd, &package),
        Command::List => cmd_list(cwd),
        Command::Search { query, limit } => {
            let client = client(settings)?;
            cmd_search(&client, &query.join(" "), limit)
        }
        Command::Config { raw } => cmd_config(settings, raw),
    }
}

fn client(settings: &Settings) -> Result<GitHubClient> {
    let client = GitHubClient::new(&settings.github)?;
    if !client.is_authenticated() {
        eprintln!("⚠ No GitHub token configured. API rate limits will be lower.");
        eprintln!("ℹ Add a token to ~/.skillmaster/config.json or set GITHUB_TOKEN\n");
    }
    Ok(client)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} (y/N): ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("failed to read input")?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn cmd_init(cwd: &Path, settings: &Settings, force: bool) -> Result<()> {
    let mut overwrite = force;
    if Manifest::exists(cwd) && !force {
        println!("⚠ skillmaster.json already exists in this directory");
        if !confirm("Overwrite?")? {
            println!("ℹ Initialization cancelled");
            return Ok(());
        }
        overwrite = true;
    }

    let report = project::init_project(cwd, &settings.install_dir, overwrite)?;
    if report.gitignore_updated {
        println!("✓ Added {}/ to .gitignore", report.install_dir);
    }
    println!("✓ Initialized SkillMaster project: {}", report.name);
    println!(
        "ℹ Created skillmaster.json and {}/ directory",
        report.install_dir
    );
    println!();
    println!("Next steps:");
    println!("  • Search for packages: skillmaster search <query>");
    println!("  • Install a package: skillmaster install <owner/repo>");
    Ok(())
}

fn print_install(report: &InstallReport, install_dir: &str) {
    match report.status {
        InstallStatus::Installed => {
            println!("✓ Successfully installed {}@{}", report.id, report.version);
            println!(
                "ℹ Installed {} markdown file(s) to {}/{}/",
                report.files,
                install_dir,
                report.id.namespace()
            );
        }
        InstallStatus::AlreadyInstalled => {
            println!(
                "✓ {}@{} already installed ({} file(s)); use --force to reinstall",
                report.id, report.version, report.files
            );
        }
    }
}

fn explain(err: Error, what: &str) -> anyhow::Error {
    let written = err.files_written();
    let err = anyhow::Error::new(err);
    if written > 0 {
        err.context(format!("{what} failed after writing {written} file(s)"))
    } else {
        err.context(format!("{what} failed"))
    }
}

fn cmd_install(cwd: &Path, client: &GitHubClient, package: &str, force: bool) -> Result<()> {
    let id = PackageId::parse(package)?;
    let project = Project::new(cwd, client);

    println!("→ Installing {id}...");
    let report = project
        .install(&id, force)
        .map_err(|e| explain(e, &format!("installation of {id}")))?;

    let install_dir = Manifest::load(cwd)?.config.install_dir;
    print_install(&report, &install_dir);
    Ok(())
}

fn cmd_install_all(cwd: &Path, client: &GitHubClient, force: bool) -> Result<()> {
    let install_dir = Manifest::load(cwd)?.config.install_dir;
    let batch = Project::new(cwd, client).install_all(force)?;
    if batch.total() == 0 {
        println!("No dependencies declared in skillmaster.json");
        return Ok(());
    }

    for report in &batch.installed {
        print_install(report, &install_dir);
    }
    for (key, err) in &batch.failed {
        eprintln!("✗ {key}: {err}");
    }

    println!(
        "\n{} of {} package(s) installed",
        batch.installed.len(),
        batch.total()
    );
    if !batch.is_success() {
        bail!("{} package(s) failed to install", batch.failed.len());
    }
    Ok(())
}

fn cmd_uninstall(cwd: &Path, package: &str) -> Result<()> {
    let id = PackageId::parse(package)?;
    project::uninstall(cwd, &id).map_err(|e| explain(e, &format!("removal of {id}")))?;
    println!("✓ Removed {id}");
    Ok(())
}

fn cmd_list(cwd: &Path) -> Result<()> {
    let (manifest, packages) = project::list_packages(cwd)?;
    if packages.is_empty() {
        println!("No packages installed");
        println!();
        println!("Install a package with:");
        println!("  skillmaster install <owner/repo>");
        return Ok(());
    }

    println!();
    println!("Installed Packages");
    println!("{}", "─".repeat(RULE_WIDTH));
    println!("{:<40} {:<15} Files", "Package", "Version");
    println!("{}", "─".repeat(RULE_WIDTH));
    for package in &packages {
        match package.files {
            None => println!("✗ Invalid package name: {}", package.key),
            Some(0) => println!("{:<40} {:<15} not installed", package.key, package.version),
            Some(n) => println!("{:<40} {:<15} {} file(s)", package.key, package.version, n),
        }
    }
    println!("{}", "─".repeat(RULE_WIDTH));
    println!();
    println!("ℹ Installation directory: {}", manifest.config.install_dir);
    Ok(())
}

fn cmd_search(client: &dyn RemoteRepository, query: &str, limit: usize) -> Result<()> {
    println!("→ Searching GitHub repositories...\n");
    let repos = client.search(query, limit)?;

    if repos.is_empty() {
        println!("No packages found matching: {query}");
        println!();
        println!("Tips:");
        println!("  • Try different keywords");
        println!("  • Packages must have the '{}' topic", crate::github::PACKAGE_TOPIC);
        return Ok(());
    }

    println!("Found {} package(s)", repos.len());
    println!("{}", "─".repeat(RULE_WIDTH));
    for (i, repo) in repos.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{} ⭐ {}", repo.key(), repo.stars);
        if !repo.description.is_empty() {
            println!("  {}", repo.description);
        }
        if let Some(updated) = &repo.updated_at {
            println!("  Updated: {updated}");
        }
        println!("  Install: skillmaster install {}", repo.key());
    }
    println!("{}", "─".repeat(RULE_WIDTH));
    Ok(())
}

fn cmd_config(settings: &Settings, raw: bool) -> Result<()> {
    let path = Settings::path()?;

    println!();
    println!("SkillMaster Configuration");
    println!("{}", "─".repeat(41));
    println!("{:<20} {}", "Config File:", path.display());
    if path.exists() {
        println!("{:<20} ✓ exists", "Status:");
    } else {
        println!("{:<20} ⚠ using defaults (file not found)", "Status:");
    }
    println!();
    println!("Settings:");
    println!("{}", "─".repeat(41));
    println!("{:<20} {}", "Install Directory:", settings.install_dir);
    println!("{:<20} {}", "API URL:", settings.github.api_url);
    match settings.masked_token() {
        Some(masked) => println!("{:<20} ✓ configured ({masked})", "GitHub Token:"),
        None => {
            println!("{:<20} ⚠ not configured", "GitHub Token:");
            println!();
            println!("  Configure a GitHub token to increase API rate limits:");
            println!("  set GITHUB_TOKEN or edit {}", path.display());
        }
    }
    println!();

    if raw {
        let mut shown = settings.clone();
        if let Some(masked) = settings.masked_token() {
            shown.github.token = masked;
        }
        println!("Raw Configuration:");
        println!("{}", "─".repeat(41));
        println!("{}", serde_json::to_string_pretty(&shown)?);
        println!();
    }
    Ok(())
}
