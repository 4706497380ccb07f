use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};

use crate::cli::Output;
use crate::config::{ParallelizeConfig, SettingsOverrides};
use crate::parallel::{ParallelError, ProgressMode, Task, expand, expand_indexed};

const ITEM_PLACEHOLDER: &str = "{}";
const INDEX_PLACEHOLDER: &str = "{#}";

#[derive(Args)]
pub struct RunArgs {
    /// Read items from FILE instead of standard input, one per line
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Number of worker threads (default: logical CPU count)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Items handed to a worker at a time
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Progress display on stderr
    #[arg(long, value_enum)]
    pub progress: Option<ProgressMode>,

    /// Make the item's zero-based index available as `{#}`
    #[arg(short, long)]
    pub enumerate: bool,

    /// Run every item on the calling thread
    #[arg(long)]
    pub sequential: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Command to run; `{}` is replaced by the item, otherwise the item is appended
    #[arg(last = true, required = true, num_args = 1.., value_name = "COMMAND")]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One result per line
    Text,
    /// A JSON array of `{index, item, output}` objects
    Json,
}

impl RunArgs {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            workers: self.workers,
            chunk_size: self.chunk_size,
            progress: self.progress,
            enumerate: self.enumerate.then_some(true),
            sequential: self.sequential.then_some(true),
        }
    }
}

/// A command line with `{}` and `{#}` placeholders, run once per item
#[derive(Debug, Clone)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
    appends_item: bool,
}

impl CommandTemplate {
    pub fn parse(command: Vec<String>, enumerate: bool) -> std::result::Result<Self, ParallelError> {
        if !enumerate && command.iter().any(|part| part.contains(INDEX_PLACEHOLDER)) {
            return Err(ParallelError::Config(format!(
                "`{INDEX_PLACEHOLDER}` needs --enumerate"
            )));
        }
        let appends_item = !command.iter().any(|part| part.contains(ITEM_PLACEHOLDER));

        let mut parts = command.into_iter();
        let program = parts
            .next()
            .ok_or_else(|| ParallelError::Config("no command given".to_string()))?;

        Ok(Self {
            program,
            args: parts.collect(),
            appends_item,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Render one argv for `item`; the index placeholder is substituted first
    pub fn render(&self, item: &str, index: Option<usize>) -> Vec<String> {
        let substitute = |part: &str| {
            let part = match index {
                Some(index) => part.replace(INDEX_PLACEHOLDER, &index.to_string()),
                None => part.to_string(),
            };
            part.replace(ITEM_PLACEHOLDER, item)
        };

        let mut argv: Vec<String> = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(substitute)
            .collect();
        if self.appends_item {
            argv.push(item.to_string());
        }
        argv
    }

    fn execute(&self, item: &str, index: Option<usize>) -> anyhow::Result<String> {
        let argv = self.render(item, index);
        tracing::trace!(?argv, "spawning command");

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to start `{}`", argv[0]))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("`{}` exited with {}: {}", argv[0], output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    }
}

impl Task<String> for CommandTemplate {
    type Output = String;

    fn run(&self, item: String) -> anyhow::Result<String> {
        self.execute(&item, None)
    }
}

impl Task<(String, usize)> for CommandTemplate {
    type Output = String;

    fn run(&self, (item, index): (String, usize)) -> anyhow::Result<String> {
        self.execute(&item, Some(index))
    }
}

/// Non-blank lines of `reader`, in order
fn read_items<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut items = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line.context("failed to read input line")?;
        if !line.trim().is_empty() {
            items.push(line);
        }
    }
    Ok(items)
}

pub fn execute(args: RunArgs, output: &Output, custom_config: Option<&str>) -> Result<()> {
    let config = ParallelizeConfig::load(custom_config, Some(args.overrides()))?;
    let mut settings = config.settings()?;
    if output.is_quiet() {
        settings.progress = ProgressMode::Off;
    }

    let template = CommandTemplate::parse(args.command, settings.enumerate)?;
    let items = match &args.input {
        Some(path) => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("failed to open input file {}", path.display()))?;
            read_items(file)?
        }
        None => read_items(io::stdin().lock())?,
    };

    if items.is_empty() {
        output.warning("no input items");
    }

    let dispatcher = settings.dispatcher()?;
    output.verbose(&format!(
        "running `{}` over {} item(s) with {:?}",
        template.program(),
        items.len(),
        dispatcher.strategy()
    ));

    let count = items.len();
    let results = if settings.enumerate {
        dispatcher.run(expand_indexed(items.clone()), &template)
    } else {
        dispatcher.run(expand(items.clone()), &template)
    }
    .with_context(|| format!("failed to run `{}` over {count} item(s)", template.program()))?;

    match args.format {
        OutputFormat::Text => {
            for line in &results {
                println!("{line}");
            }
        }
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = items
                .iter()
                .zip(&results)
                .enumerate()
                .map(|(index, (item, output))| {
                    serde_json::json!({ "index": index, "item": item, "output": output })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    output.verbose(&format!("{} result(s) written", results.len()));
    Ok(())
}
