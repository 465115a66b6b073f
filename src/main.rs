use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::*;
use spellpad::checker::dictionary::DictionaryOracle;
use spellpad::checker::oracle::{SpellOracle, UnavailableOracle};
use spellpad::checker::tokenizer;
use spellpad::cli::output::{self, OutputFormat};
use spellpad::{dict, Classification, Config, EditorSession, Settings};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "spellpad")]
#[command(version, about = "A text editor core with as-you-type spell checking", long_about = None)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Language/dictionary to use (e.g., en_US, en_GB)
    #[arg(short, long, global = true)]
    language: Option<String>,

    /// Personal dictionary file
    #[arg(long, global = true)]
    personal_dict: Option<PathBuf>,

    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open a file, check the first page and print it with errors marked
    Open {
        file: PathBuf,

        /// Viewport width used to size the first chunk
        #[arg(short, long, default_value_t = 80)]
        width: i64,

        /// Page in the whole file before printing
        #[arg(short, long)]
        all: bool,
    },
    /// Check whole files and report every misspelled word
    Check {
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Output format (text, json)
        #[arg(short = 'o', long, default_value = "text")]
        format: OutputFormat,

        /// Exit with code 0 even if errors are found
        #[arg(long)]
        no_fail: bool,
    },
    /// Type text into an empty document, checking each word as it is finished
    Type { text: String },
    /// Show or reset the appearance settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommands,
    },
    /// Dictionary management
    Dict {
        #[command(subcommand)]
        action: DictCommands,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommands {
    /// Print the stored settings
    Show,
    /// Overwrite the stored settings with the defaults
    Reset,
}

#[derive(Subcommand, Debug)]
enum DictCommands {
    /// List installed dictionaries
    List,
    /// Download a dictionary
    Download {
        /// Language code (e.g., en_US, en_GB)
        language: String,
    },
    /// Update all dictionaries
    Update,
    /// Show dictionary info
    Info {
        /// Language code
        language: String,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "spellpad=warn",
        1 => "spellpad=info",
        _ => "spellpad=debug",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }
    let colored_output = !cli.no_color;

    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "spellpad", &mut io::stdout());
        return Ok(());
    }

    let Some(command) = cli.command else {
        anyhow::bail!("No command specified. Use --help for usage information.");
    };

    let load_config = || Config::load(cli.language.clone(), cli.personal_dict.clone());

    match command {
        Commands::Dict { action } => handle_dict(action),
        Commands::Open { file, width, all } => {
            let mut session = new_session(&load_config()?);
            open(&mut session, &file, width, all, colored_output)
        }
        Commands::Check {
            files,
            format,
            no_fail,
        } => {
            let total_errors = check(&load_config()?, &files, &format, colored_output)?;
            if total_errors > 0 && !no_fail {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Type { text } => {
            let mut session = new_session(&load_config()?);
            type_into(&mut session, &text, colored_output)
        }
        Commands::Settings { action } => {
            handle_settings(&load_config()?, action, colored_output)
        }
    }
}

fn build_oracle(config: &Config) -> Box<dyn SpellOracle> {
    match DictionaryOracle::from_config(config) {
        Ok(oracle) => Box::new(oracle),
        Err(e) => {
            warn!(error = %format!("{:#}", e), "dictionary unavailable, words stay unmarked");
            Box::new(UnavailableOracle::new(format!("{:#}", e)))
        }
    }
}

fn load_settings(config: &Config) -> Settings {
    let Some(path) = &config.settings_file else {
        return Settings::default();
    };
    Settings::load(path).unwrap_or_else(|e| {
        warn!(error = %format!("{:#}", e), "settings unreadable, using defaults");
        Settings::default()
    })
}

fn new_session(config: &Config) -> EditorSession {
    EditorSession::new(build_oracle(config), config, load_settings(config))
}

fn open(
    session: &mut EditorSession,
    file: &Path,
    width: i64,
    all: bool,
    colored_output: bool,
) -> Result<()> {
    let mut result = session.open_file(file, width)?;
    if all {
        let appended = session.load_remaining(width)?;
        debug!(appended, "paged in rest of file");
        result = session.check_text_area()?;
    }

    println!("{}", output::render_buffer(session.buffer(), colored_output));
    if !session.is_fully_loaded() {
        eprintln!("{}", "(more text not loaded, use --all)".dimmed());
    }
    eprintln!("{}", result.summary());
    Ok(())
}

fn check(
    config: &Config,
    files: &[PathBuf],
    format: &OutputFormat,
    colored_output: bool,
) -> Result<usize> {
    let mut session = new_session(config);
    let width = config.scroll_probe_width;
    let mut total_errors = 0;
    let mut reports = Vec::new();

    for file in files {
        let loaded = session
            .open_file(file, width)
            .and_then(|_| session.load_remaining(width))
            .and_then(|_| session.check_text_area());

        let result = match loaded {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Error: {}", e);
                continue;
            }
        };

        total_errors += result.error_count;
        let report = output::FileReport::new(
            file,
            session.buffer(),
            &result,
            session.is_fully_loaded(),
        );
        match format {
            OutputFormat::Text => output::print_text_report(&report, colored_output),
            OutputFormat::Json => reports.push(report),
        }
    }

    match format {
        OutputFormat::Text => output::print_check_summary(total_errors, files, colored_output),
        OutputFormat::Json => output::print_json_reports(&reports),
    }
    Ok(total_errors)
}

fn type_into(session: &mut EditorSession, text: &str, colored_output: bool) -> Result<()> {
    let mut caret = 0;
    let mut buf = [0u8; 4];

    for ch in text.chars() {
        let typed = session.type_text(caret, ch.encode_utf8(&mut buf))?;
        caret += 1;
        if let Some(class) = typed {
            print_mark(session.text(), caret, class, colored_output);
        }
    }

    // The last word has no terminating key yet.
    if text.chars().next_back().is_some_and(|c| !tokenizer::ends_word(c)) {
        if let Some(class) = session.check_last_word(caret)? {
            print_mark(session.text(), caret, class, colored_output);
        }
    }

    println!();
    println!("{}", output::render_buffer(session.buffer(), colored_output));
    Ok(())
}

fn print_mark(content: &str, caret: usize, class: Classification, colored_output: bool) {
    let Some(word) = tokenizer::word_at(content, caret) else {
        return;
    };
    let mark = match (class, colored_output) {
        (Classification::Correct, true) => "✓".green().to_string(),
        (Classification::Incorrect, true) => "✗".red().bold().to_string(),
        (Classification::Correct, false) => "ok".to_string(),
        (Classification::Incorrect, false) => "misspelled".to_string(),
    };
    println!("  {} {}", word.text, mark);
}

fn handle_settings(config: &Config, action: SettingsCommands, colored_output: bool) -> Result<()> {
    let path = config
        .settings_file
        .clone()
        .context("Failed to locate settings file")?;

    match action {
        SettingsCommands::Show => {
            let settings = Settings::load(&path)?;
            output::print_settings(&settings, Some(&path), colored_output);
        }
        SettingsCommands::Reset => {
            Settings::default().save(&path)?;
            println!("{} Settings reset: {}", "✓".green().bold(), path.display());
        }
    }
    Ok(())
}

fn handle_dict(action: DictCommands) -> Result<()> {
    match action {
        DictCommands::List => dict::manager::list_dictionaries(),
        DictCommands::Download { language } => dict::manager::download_dictionary(&language),
        DictCommands::Update => dict::manager::update_dictionaries(),
        DictCommands::Info { language } => dict::manager::show_info(&language),
    }
}
