//! Minimal CLI: schema + JSON inputs → (hydrated plain JSON | type description)
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use typecast::registry::TypeSummary;
use typecast::{Registry, Value};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// hydrate JSON documents into declared types and print their canonical plain form
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,

    /// more logging on stderr (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// hydrate every input document as the given type and print it back out
    Hydrate(HydrateOut),
    /// print the resolved field table of a type
    Describe(DescribeOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// JSON schema file declaring types, enums and config
    #[arg(long, short)]
    schema: PathBuf,

    /// type to hydrate / describe
    #[arg(long = "type", short = 't')]
    type_name: String,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct HydrateOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    #[command(flatten)]
    input_settings: InputSettings,

    /// drop null-valued fields at every level
    #[arg(long)]
    elide_nulls: bool,

    /// pretty-print each document
    #[arg(long)]
    pretty: bool,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DescribeOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    fn load_registry(&self) -> Result<Registry> {
        let bytes = std::fs::read(&self.schema)
            .with_context(|| format!("failed to read schema file {}", self.schema.display()))?;
        let registry = Registry::from_schema_slice(&bytes)
            .with_context(|| format!("invalid schema file {}", self.schema.display()))?;
        if !registry.has_type(&self.type_name) {
            bail!("type {} is not declared in {}", self.type_name, self.schema.display());
        }
        Ok(registry)
    }
}

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(&str, serde_json::Value) -> Result<()>) -> Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;
            let documents = if self.ndjson {
                source
                    .lines()
                    .filter(|line| !line.trim().is_empty())
                    .map(serde_json::from_str::<serde_json::Value>)
                    .collect::<Result<Vec<_>, _>>()
            } else {
                serde_json::from_str::<serde_json::Value>(&source).map(|v| vec![v])
            };
            let documents = documents
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;

            for document in documents {
                let selected = match self.json_pointer.as_deref() {
                    None => document,
                    Some(pointer) => match document.pointer(pointer) {
                        Some(node) => node.clone(),
                        None => bail!("JSON pointer {pointer} matched nothing in {source_path_str}"),
                    },
                };
                // a top-level array is a batch of records
                match selected {
                    serde_json::Value::Array(records) => {
                        for record in records { apply(&source_path_str, record)?; }
                    }
                    record => apply(&source_path_str, record)?,
                }
            }
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Hydrate(target) => {
                let registry = target.schema_settings.load_registry()?;
                let type_name = target.schema_settings.type_name.as_str();

                let mut rendered = Vec::<String>::new();
                target.input_settings.load_process(|source, record| {
                    let instance = registry
                        .hydrate_json(type_name, record)
                        .with_context(|| format!("failed to hydrate {type_name} from {source}"))?;
                    let plain = Value::Map(instance.to_plain(target.elide_nulls)).to_json_value();
                    rendered.push(if target.pretty {
                        serde_json::to_string_pretty(&plain)?
                    } else {
                        plain.to_string()
                    });
                    Ok(())
                })?;
                tracing::debug!(documents = rendered.len(), type_name, "hydrated inputs");
                write_output(target.out.as_ref(), &rendered.join("\n"))
            }
            Command::Describe(target) => {
                let registry = target.schema_settings.load_registry()?;
                let meta = registry.metadata(&target.schema_settings.type_name)?;
                let summary = serde_json::to_string_pretty(&TypeSummary::from(&*meta))?;
                write_output(None, &summary)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(out: Option<&PathBuf>, contents: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, contents)
                .with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
