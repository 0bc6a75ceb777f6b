//! codelines - syntax-highlighting line viewer and editor

mod pager;
mod terminal;

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use codelines::syntax::{describe_block, BlockKind};
use codelines::{CodeError, Config, Document, MarkupKind, Result};

use pager::Pager;
use terminal::Terminal;

/// Tokenize, highlight and edit source files line by line
#[derive(Parser, Debug)]
#[command(name = "codelines", version, about)]
struct Cli {
    /// Language to use instead of detecting it from the file extension
    #[arg(short, long, global = true)]
    language: Option<String>,

    /// Markup for formatted output
    #[arg(short, long, global = true, value_enum)]
    markup: Option<MarkupKind>,

    /// Disable highlighting
    #[arg(long, global = true)]
    no_highlight: bool,

    /// Config file (default ~/.codelines.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print formatted lines
    View {
        file: PathBuf,
        /// Print unformatted text
        #[arg(long)]
        raw: bool,
        /// Prefix lines with their number
        #[arg(short, long)]
        numbers: bool,
    },
    /// Show line, width and block statistics
    Stats { file: PathBuf },
    /// List the blocks the tokenizer produces
    Tokens { file: PathBuf },
    /// Replace a line (1-based) and save
    Set {
        file: PathBuf,
        line: usize,
        text: String,
    },
    /// Insert a line above (or below) line LINE (1-based) and save
    Insert {
        file: PathBuf,
        line: usize,
        text: String,
        #[arg(long)]
        below: bool,
    },
    /// Delete a line (1-based) and save
    Delete { file: PathBuf, line: usize },
    /// Browse a file interactively
    Page { file: PathBuf },
    /// List known languages
    Languages,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    codelines::logging::init(cli.log_file.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(markup) = cli.markup {
        config.markup = markup;
    }
    if cli.no_highlight {
        config.highlight = false;
    }
    let language = cli.language.as_deref();

    match cli.command {
        Command::View { file, raw, numbers } => view(&file, &config, language, raw, numbers),
        Command::Stats { file } => stats(&file, &config, language),
        Command::Tokens { file } => tokens(&file, &config, language),
        Command::Set { file, line, text } => edit(&file, &config, language, |doc| {
            doc.set_line(to_index(line)?, &text)
        }),
        Command::Insert {
            file,
            line,
            text,
            below,
        } => edit(&file, &config, language, |doc| {
            let index = to_index(line)?;
            if below {
                doc.insert_below(index, &text)
            } else {
                doc.insert_above(index, &text)
            }
        }),
        Command::Delete { file, line } => {
            edit(&file, &config, language, |doc| doc.delete_line(to_index(line)?))
        }
        Command::Page { file } => page(&file, config, language),
        Command::Languages => {
            for name in config.registry().list_languages() {
                println!("{}", name);
            }
            Ok(())
        }
    }
}

/// Convert a 1-based line number from the command line
fn to_index(line: usize) -> Result<usize> {
    line.checked_sub(1)
        .ok_or_else(|| CodeError::Message("line numbers start at 1".to_string()))
}

fn open(path: &Path, config: &Config, language: Option<&str>) -> Result<Document> {
    Document::open(path, &config.registry(), config, language)
}

fn view(path: &Path, config: &Config, language: Option<&str>, raw: bool, numbers: bool) -> Result<()> {
    let doc = open(path, config, language)?;
    let code = doc.code();
    let width = code.len().to_string().len();
    let mut out = BufWriter::new(io::stdout().lock());
    for (i, line) in code.lines().enumerate() {
        if numbers {
            write!(out, "{:>width$} ", i + 1, width = width)?;
        }
        let text = if raw { line.unformatted() } else { line.formatted() };
        writeln!(out, "{}", text)?;
    }
    out.flush()?;
    Ok(())
}

fn stats(path: &Path, config: &Config, language: Option<&str>) -> Result<()> {
    let doc = open(path, config, language)?;
    let code = doc.code();
    println!("file:        {}", path.display());
    println!("language:    {}", code.rules().name());
    println!("lines:       {}", code.len());
    println!("code lines:  {}", code.code_line_count());
    println!("width:       {}", code.width());
    println!("terminator:  {:?}", code.terminator());
    println!("blocks:      {}", code.blocks().len());
    for kind in BlockKind::ALL {
        let count = code.blocks().iter().filter(|b| b.kind == kind).count();
        if count > 0 {
            println!("  {:<22} {}", kind.name(), count);
        }
    }
    Ok(())
}

fn tokens(path: &Path, config: &Config, language: Option<&str>) -> Result<()> {
    let doc = open(path, config, language)?;
    let mut out = BufWriter::new(io::stdout().lock());
    for block in doc.code().blocks().iter() {
        writeln!(out, "{}", describe_block(&block))?;
    }
    out.flush()?;
    Ok(())
}

fn edit<F>(path: &Path, config: &Config, language: Option<&str>, apply: F) -> Result<()>
where
    F: FnOnce(&mut Document) -> Result<()>,
{
    let mut doc = open(path, config, language)?;
    apply(&mut doc)?;
    doc.save()?;
    println!("{}: {} lines", path.display(), doc.code().len());
    Ok(())
}

fn page(path: &Path, mut config: Config, language: Option<&str>) -> Result<()> {
    // The pager writes formatted lines straight to the terminal
    config.markup = MarkupKind::Ansi;
    let (doc, text) = Document::open_deferred(path, &config.registry(), &config, language)?;
    let mut pager = Pager::new(doc, text, &config);
    let mut terminal = Terminal::new()?;
    pager.run(&mut terminal)
}
