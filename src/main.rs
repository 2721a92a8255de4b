//! YAML Checker CLI - Command-line host for frontmatter validation
//!
//! CDD Principle: Application Layer - CLI coordinates user interactions with domain services
//! - Translates user commands to validation runs
//! - Handles external concerns like configuration discovery, exit codes and terminal output
//! - The validation core never touches stdout

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};
use yaml_checker::config::DEFAULT_CONFIG_FILES;
use yaml_checker::{
    CheckerConfig, CheckerError, CheckerResult, DocumentStore, LinkStyle, OutputFormat,
    ReportFormatter, ReportOptions, WriterSink, YamlChecker,
};

/// YAML Checker - validate YAML frontmatter across a markdown vault
#[derive(Parser)]
#[command(name = "yaml-checker")]
#[command(version)]
#[command(about = "Check the YAML frontmatter of every markdown file in a directory")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the YAML format in all the markdown files
    Check {
        /// Root directory of the documents (defaults to the current directory)
        root: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Additional exclude patterns
        #[arg(long, action = clap::ArgAction::Append)]
        exclude: Vec<String>,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,

        /// Maximum number of failing documents to list
        #[arg(long)]
        max_failures: Option<usize>,

        /// Reference failing documents with obsidian:// links into this vault
        #[arg(long)]
        vault: Option<String>,
    },

    /// Watch for document changes and re-run the check
    Watch {
        /// Root directory to watch (defaults to the current directory)
        root: Option<PathBuf>,

        /// Debounce delay in milliseconds
        #[arg(long, default_value = "500")]
        delay: u64,
    },

    /// Validate a configuration file
    ValidateConfig {
        /// Configuration file to validate
        config_file: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Junit,
    Sarif,
    Github,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Junit => OutputFormat::Junit,
            OutputFormatArg::Sarif => OutputFormat::Sarif,
            OutputFormatArg::Github => OutputFormat::GitHub,
        }
    }
}

/// Settings of one `check` invocation
struct CheckArgs {
    root: PathBuf,
    format: OutputFormatArg,
    exclude: Vec<String>,
    no_parallel: bool,
    max_failures: Option<usize>,
    vault: Option<String>,
    use_colors: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli).await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    }
}

async fn run_command(cli: Cli) -> CheckerResult<i32> {
    match cli.command {
        Commands::Check {
            root,
            format,
            exclude,
            no_parallel,
            max_failures,
            vault,
        } => {
            let args = CheckArgs {
                root: root.unwrap_or_else(|| PathBuf::from(".")),
                format,
                exclude,
                no_parallel,
                max_failures,
                vault,
                use_colors: !cli.no_color,
            };
            run_check(cli.config, args, &mut std::io::stdout()).await
        }
        Commands::Watch { root, delay } => {
            let root = root.unwrap_or_else(|| PathBuf::from("."));
            run_watch(cli.config, root, delay, !cli.no_color).await
        }
        Commands::ValidateConfig { config_file } => run_validate_config(config_file.or(cli.config)),
    }
}

/// Load the explicit config file, or discover one in the working directory
fn load_config(config_path: Option<&Path>) -> CheckerResult<CheckerConfig> {
    match config_path {
        Some(path) => CheckerConfig::load_from_file(path),
        None => CheckerConfig::discover("."),
    }
}

async fn run_check<W: std::io::Write>(
    config_path: Option<PathBuf>,
    args: CheckArgs,
    out: &mut W,
) -> CheckerResult<i32> {
    let mut config = load_config(config_path.as_deref())?;

    if args.no_parallel {
        config.validation.parallel = false;
    }
    if let Some(vault) = args.vault {
        config.report.link_style = LinkStyle::Obsidian;
        config.report.vault_name = Some(vault);
    }

    let checker = YamlChecker::new_with_config(config)?;

    let mut store = checker.open_store(&args.root)?;
    for pattern in args.exclude {
        store = store.exclude(pattern)?;
    }
    let store: Arc<dyn DocumentStore> = Arc::new(store);

    let formatter = ReportFormatter::new(ReportOptions {
        use_colors: args.use_colors && args.format == OutputFormatArg::Human,
        max_failures: args.max_failures,
        ..ReportOptions::from_config(&checker.config().report)
    });
    let mut sink = WriterSink::new(out, formatter, args.format.into());

    let report = checker.run(store, &mut sink).await?;

    Ok(if report.has_failures() { 1 } else { 0 })
}

async fn run_watch(
    config_path: Option<PathBuf>,
    root: PathBuf,
    delay_ms: u64,
    use_colors: bool,
) -> CheckerResult<i32> {
    use notify::{Event, RecursiveMode, Result as NotifyResult, Watcher};
    use std::io::{self, Write};
    use std::sync::mpsc;

    println!("🔍 Starting YAML Checker watch mode...");
    println!("📂 Watching: {}", root.display());
    println!("⏱️  Debounce delay: {delay_ms}ms");
    println!("Press Ctrl+C to stop watching\n");

    let (tx, rx) = mpsc::channel();

    let mut watcher = notify::recommended_watcher(move |res: NotifyResult<Event>| match res {
        Ok(event) => {
            if let Err(e) = tx.send(event) {
                tracing::warn!("Error sending event: {}", e);
            }
        }
        Err(e) => tracing::warn!("Watch error: {}", e),
    })
    .map_err(|e| CheckerError::config(format!("Failed to create file watcher: {e}")))?;

    watcher.watch(&root, RecursiveMode::Recursive).map_err(|e| {
        CheckerError::config(format!("Failed to watch path '{}': {}", root.display(), e))
    })?;

    let debounce = Duration::from_millis(delay_ms);
    let mut config = load_config(config_path.as_deref())?;

    println!("🚀 Running initial check...");
    run_watch_check(&config, &root, use_colors).await;
    let mut last_run = Instant::now();
    let mut pending = false;

    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                if let Some(changed) = config_change(&event) {
                    println!("🔄 Configuration file changed: {}", changed.display());
                    config = match load_config(config_path.as_deref()) {
                        Ok(reloaded) => reloaded,
                        Err(e) => {
                            eprintln!("⚠️  Failed to reload configuration: {e}");
                            eprintln!("   Keeping the previous configuration...");
                            config
                        }
                    };
                    pending = true;
                } else if touches_document(&event, &config) {
                    pending = true;
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                eprintln!("File watcher disconnected");
                break;
            }
        }

        if !should_run(pending, last_run.elapsed(), debounce) {
            continue;
        }

        print!("\x1B[2J\x1B[H");
        io::stdout().flush()?;

        println!("📝 Changes detected, re-running check...");
        run_watch_check(&config, &root, use_colors).await;
        last_run = Instant::now();
        pending = false;
    }

    Ok(0)
}

/// One check in watch mode; failures are printed, never fatal
async fn run_watch_check(config: &CheckerConfig, root: &Path, use_colors: bool) {
    match check_once(config, root, use_colors).await {
        Ok(()) => println!("⌚ Watching for changes... (Press Ctrl+C to stop)\n"),
        Err(e) => eprintln!("❌ Check failed: {e}"),
    }
}

async fn check_once(config: &CheckerConfig, root: &Path, use_colors: bool) -> CheckerResult<()> {
    let checker = YamlChecker::new_with_config(config.clone())?;
    let store: Arc<dyn DocumentStore> = Arc::new(checker.open_store(root)?);
    let formatter = ReportFormatter::new(ReportOptions {
        use_colors,
        ..ReportOptions::from_config(&config.report)
    });
    let mut sink = WriterSink::new(std::io::stdout(), formatter, OutputFormat::Human);
    checker.run(store, &mut sink).await?;
    Ok(())
}

/// Changes seen inside the debounce window wait for it to pass
fn should_run(pending: bool, since_last_run: Duration, debounce: Duration) -> bool {
    pending && since_last_run >= debounce
}

/// Whether an event creates, modifies or removes a document
fn touches_document(event: &notify::Event, config: &CheckerConfig) -> bool {
    use notify::EventKind;

    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
        _ => return false,
    }

    event
        .paths
        .iter()
        .any(|path| config.documents.matches_extension(path))
}

/// Check if an event indicates a config file change
fn config_change(event: &notify::Event) -> Option<PathBuf> {
    use notify::EventKind;

    match event.kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {}
        _ => return None,
    }

    event
        .paths
        .iter()
        .find(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map_or(false, |name| DEFAULT_CONFIG_FILES.contains(&name))
        })
        .cloned()
}

fn run_validate_config(config_path: Option<PathBuf>) -> CheckerResult<i32> {
    let config_path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILES[0]));

    println!("Validating configuration: {}", config_path.display());

    match CheckerConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Configuration is valid");
            println!("📊 Configuration summary:");
            println!("  Extensions: {}", config.documents.extensions.join(", "));
            println!("  Path patterns: {}", config.documents.patterns.len());
            println!("  Parallel: {}", config.validation.parallel);
            println!(
                "  Reject unusable values: {}",
                config.validation.reject_unusable_values
            );
            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Configuration validation failed: {e}");
            Ok(1)
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn check_args(root: &Path, format: OutputFormatArg) -> CheckArgs {
        CheckArgs {
            root: root.to_path_buf(),
            format,
            exclude: vec![],
            no_parallel: false,
            max_failures: None,
            vault: None,
            use_colors: false,
        }
    }

    fn empty_config(dir: &Path) -> PathBuf {
        let path = dir.join("yaml_checker.yaml");
        fs::write(&path, "version: \"1.0\"\n").unwrap();
        path
    }

    #[tokio::test]
    async fn test_check_command() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("vault");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("good.md"), "---\ntitle: ok\n---\n").unwrap();
        fs::write(root.join("bad.md"), "---\ntitle: [\n---\n").unwrap();

        let config = empty_config(temp_dir.path());
        let mut out = Vec::new();
        let code = run_check(Some(config), check_args(&root, OutputFormatArg::Json), &mut out)
            .await
            .unwrap();

        assert_eq!(code, 1);
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["failures"][0]["document"], "bad.md");
    }

    #[tokio::test]
    async fn test_check_command_all_valid() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("vault");
        fs::create_dir_all(root.join("drafts")).unwrap();
        fs::write(root.join("good.md"), "---\ntitle: ok\n---\n").unwrap();
        fs::write(root.join("drafts/bad.md"), "---\ntitle: [\n---\n").unwrap();

        let config = empty_config(temp_dir.path());
        let mut args = check_args(&root, OutputFormatArg::Human);
        args.exclude = vec!["drafts/".to_string()];
        args.no_parallel = true;

        let mut out = Vec::new();
        let code = run_check(Some(config), args, &mut out).await.unwrap();

        assert_eq!(code, 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("All markdown files have valid YAML format"));
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("test_config.yaml");

        let yaml = serde_yaml::to_string(&CheckerConfig::default()).unwrap();
        fs::write(&config_file, yaml).unwrap();
        assert_eq!(run_validate_config(Some(config_file.clone())).unwrap(), 0);

        fs::write(&config_file, "version: \"9\"\n").unwrap();
        assert_eq!(run_validate_config(Some(config_file)).unwrap(), 1);
    }

    #[test]
    fn test_debounced_changes_are_not_lost() {
        let debounce = Duration::from_millis(500);

        // A second save 200ms after a run waits, then runs once the window passes
        assert!(!should_run(true, Duration::from_millis(200), debounce));
        assert!(should_run(true, Duration::from_millis(500), debounce));
        assert!(should_run(true, Duration::from_secs(3), debounce));

        assert!(!should_run(false, Duration::from_secs(3), debounce));
    }

    #[test]
    fn test_event_filters() {
        use notify::event::{CreateKind, EventKind};

        let config = CheckerConfig::default();

        let note = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/vault/note.md"));
        assert!(touches_document(&note, &config));
        assert!(config_change(&note).is_none());

        let image = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/vault/image.png"));
        assert!(!touches_document(&image, &config));

        let settings = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/vault/yaml_checker.yaml"));
        assert_eq!(
            config_change(&settings),
            Some(PathBuf::from("/vault/yaml_checker.yaml"))
        );
    }
}
