//! protoc-gen-pydocstring
//!
//! protoc plugin that inserts Python docstrings, built from `.proto` comments,
//! into the modules generated by the Python plugin.
//!
//! Run by protoc as `--pydocstring_out=<dir>` it reads a `CodeGeneratorRequest`
//! on stdin and writes a `CodeGeneratorResponse` on stdout. The subcommands are
//! for use outside protoc.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use prost::Message;
use prost_types::compiler::CodeGeneratorResponse;
use protoc_docs_common::{DocumentedStructure, PluginConfig, StructureRegistry};
use protoc_docs_generator::{convert_descriptor_file, PandocConverter, ResponseAssembler};
use protoc_docs_parser::CodeGeneratorParser;
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "protoc-gen-pydocstring")]
#[command(version, about = "protoc plugin that turns .proto comments into Python docstrings", long_about = None)]
struct Cli {
    /// Without a subcommand, act as a protoc plugin on stdin/stdout
    #[command(subcommand)]
    command: Option<Commands>,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Markup converter executable
    #[arg(long, env = "PROTOC_DOCS_PANDOC", global = true)]
    pandoc: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the comments of a binary FileDescriptorSet to reStructuredText
    #[command(after_help = "EXAMPLES:\n  \
        protoc --include_source_info --descriptor_set_out=api.pb api.proto\n  \
        protoc-gen-pydocstring convert-descriptors api.pb api.rst.pb")]
    ConvertDescriptors {
        /// FileDescriptorSet to read
        input: PathBuf,

        /// Where to write the converted FileDescriptorSet
        output: PathBuf,
    },

    /// Print the documented structures of a saved CodeGeneratorRequest as JSON
    Inspect {
        /// Binary CodeGeneratorRequest
        request: PathBuf,
    },
}

#[derive(Serialize)]
struct InspectedFile {
    file: String,
    structures: Vec<DocumentedStructure>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();

    let config = load_config(cli.config.as_deref(), cli.pandoc.as_deref())?;

    match cli.command {
        None => plugin_command(config),
        Some(Commands::ConvertDescriptors { input, output }) => {
            convert_descriptors_command(&input, &output, &config)
        }
        Some(Commands::Inspect { request }) => inspect_command(&request),
    }
}

fn load_config(path: Option<&Path>, pandoc: Option<&Path>) -> Result<PluginConfig> {
    let mut config = match path {
        Some(path) => PluginConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PluginConfig::default(),
    };

    if let Some(pandoc) = pandoc {
        config.converter.command = pandoc.to_path_buf();
    }

    Ok(config)
}

/// protoc plugin protocol: request on stdin, response on stdout
fn plugin_command(config: PluginConfig) -> Result<()> {
    let parser = CodeGeneratorParser::from_reader(io::stdin().lock())
        .context("Failed to read CodeGeneratorRequest from stdin")?;

    let response = match assemble(&parser, config) {
        Ok(response) => response,
        Err(e) => {
            log::error!("{}", e);
            CodeGeneratorResponse {
                error: Some(e.to_string()),
                ..Default::default()
            }
        }
    };

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&response.encode_to_vec())
        .context("Failed to write CodeGeneratorResponse to stdout")?;
    stdout.flush()?;

    Ok(())
}

fn assemble(
    parser: &CodeGeneratorParser,
    mut config: PluginConfig,
) -> protoc_docs_common::Result<CodeGeneratorResponse> {
    if let Some(parameter) = parser.parameter() {
        config.apply_parameter(parameter)?;
    }

    let converter = PandocConverter::from_config(&config.converter);
    let assembler = ResponseAssembler::new(config, &converter)?;
    assembler.assemble(parser)
}

fn convert_descriptors_command(input: &Path, output: &Path, config: &PluginConfig) -> Result<()> {
    eprintln!(
        "{} Converting comments in {}",
        "→".cyan(),
        input.display()
    );

    let converter = PandocConverter::from_config(&config.converter);
    let written = convert_descriptor_file(input, output, &converter, config)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    eprintln!(
        "{} Wrote {} comments to {}",
        "✓".green(),
        written,
        output.display()
    );

    Ok(())
}

fn inspect_command(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    let parser = CodeGeneratorParser::from_bytes(&bytes).context("Failed to decode request")?;

    let mut registry = StructureRegistry::new();
    let inspected: Vec<InspectedFile> = parser
        .find_docs(&mut registry)
        .into_iter()
        .map(|docs| InspectedFile {
            file: docs.filename,
            structures: docs.structures.iter().map(|h| h.snapshot()).collect(),
        })
        .collect();

    eprintln!(
        "{} Found {} structures in {} files",
        "✓".green(),
        registry.len(),
        inspected.len()
    );

    println!("{}", serde_json::to_string_pretty(&inspected)?);

    Ok(())
}
