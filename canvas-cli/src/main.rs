//! # Canvas CLI
//!
//! Command-line front end for the canvas drawing language.
//!
//! Usage:
//!   canvas run <file>
//!   canvas repl
//!   canvas compile <file> -o <out>
//!   canvas disasm <file.bin>
//!   canvas tokens <file>
//!
//! Examples:
//!   canvas run demos/sunset.cnv --out sunset.ppm --seed 7
//!   canvas -v compile demos/sunset.cnv -o sunset.bin
//!   RUST_LOG=canvas_vm=trace canvas run demos/sunset.cnv

mod canvas;

use canvas::HeadlessCanvas;
use canvas_vm::{disassemble, scan, Diagnostics, Outcome, Result, VirtualMachine, VmConfig};
use clap::{Args, Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "canvas")]
#[command(author, version, about = "Canvas - a tiny drawing language")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct CanvasArgs {
    /// Canvas width in pixels (at most 8192)
    #[arg(long, default_value = "640")]
    width: u32,

    /// Canvas height in pixels (at most 8192)
    #[arg(long, default_value = "480")]
    height: u32,

    /// Write the final image here (binary PPM)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Seed for noise and random numbers
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a script on a headless canvas
    Run {
        /// Script file
        file: PathBuf,

        #[command(flatten)]
        canvas: CanvasArgs,
    },
    /// Read statements interactively
    Repl {
        #[command(flatten)]
        canvas: CanvasArgs,
    },
    /// Compile a script to raw bytecode
    Compile {
        /// Script file
        file: PathBuf,

        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Disassemble a raw bytecode file
    Disasm {
        /// Bytecode file
        file: PathBuf,
    },
    /// Print the tokens of a script
    Tokens {
        /// Script file
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "canvas_cli=debug,canvas_vm=debug"
    } else {
        "canvas_cli=info,canvas_vm=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<VmConfig> {
    match path {
        Some(path) => VmConfig::from_json_file(path),
        None => Ok(VmConfig::default()),
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        canvas_vm::error::io_error(format!("failed to read {}", path.display())).set_source(e)
    })
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic);
    }
}

/// Run a script file; returns whether any error was reported
fn run_file(config: VmConfig, file: &Path, args: &CanvasArgs) -> Result<bool> {
    let source = read_source(file)?;
    let mut vm = VirtualMachine::new(config)?;
    let mut canvas = HeadlessCanvas::new(args.width, args.height, args.seed)?;
    tracing::debug!(seed = canvas.seed(), "canvas ready");

    let report = vm.run(&source, &mut canvas);
    print_diagnostics(&report.diagnostics);
    match report.outcome {
        Some(Outcome::Completed) => {
            tracing::info!(bytes = report.bytecode.len(), texts = canvas.texts(), "run complete")
        }
        Some(outcome) => tracing::info!(?outcome, "run stopped early"),
        None => tracing::info!("not run"),
    }

    if let Some(out) = &args.out {
        canvas.save_ppm(out)?;
    }
    Ok(vm.had_error())
}

fn repl(config: VmConfig, args: &CanvasArgs) -> Result<()> {
    let mut vm = VirtualMachine::new(config)?;
    let mut canvas = HeadlessCanvas::new(args.width, args.height, args.seed)?;
    let mut history: Vec<String> = Vec::new();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next() else { break };
        let line = line?;
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        match input {
            ":quit" | ":q" => break,
            ":reset" => {
                vm.reset();
                println!("bindings cleared");
            }
            ":stack" => {
                for value in vm.interpreter().stack().iter_top_down() {
                    println!("  {}", value);
                }
            }
            ":vars" => {
                let mut bindings: Vec<_> = vm.interpreter().variables().iter().collect();
                bindings.sort_by_key(|(key, _)| *key);
                for (key, value) in bindings {
                    println!("{:>11} = {}", key, value);
                }
            }
            ":history" => {
                for (i, entry) in history.iter().enumerate() {
                    println!("{:4}  {}", i + 1, entry);
                }
            }
            ":save" => match &args.out {
                Some(out) => canvas.save_ppm(out)?,
                None => eprintln!("no --out path given"),
            },
            _ => {
                history.push(input.to_string());
                let report = vm.run(input, &mut canvas);
                print_diagnostics(&report.diagnostics);
                vm.clear_error();
                if let Ok(top) = vm.interpreter().stack().peek() {
                    println!("{}", top);
                }
            }
        }
    }

    if let Some(out) = &args.out {
        canvas.save_ppm(out)?;
    }
    Ok(())
}

/// Compile a script file; returns whether any error was reported
fn compile_file(config: VmConfig, file: &Path, out: &Path) -> Result<bool> {
    let source = read_source(file)?;
    let mut vm = VirtualMachine::new(config)?;
    let compilation = vm.compile(&source);
    print_diagnostics(&compilation.diagnostics);
    if !compilation.is_ok() {
        return Ok(true);
    }

    std::fs::write(out, &compilation.bytecode).map_err(|e| {
        canvas_vm::error::io_error(format!("failed to write {}", out.display())).set_source(e)
    })?;
    tracing::info!(bytes = compilation.bytecode.len(), path = %out.display(), "bytecode written");
    Ok(false)
}

fn execute(cli: Cli) -> Result<bool> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Run { file, canvas } => run_file(config, &file, &canvas),
        Commands::Repl { canvas } => repl(config, &canvas).map(|_| false),
        Commands::Compile { file, out } => compile_file(config, &file, &out),
        Commands::Disasm { file } => {
            let bytecode = std::fs::read(&file).map_err(|e| {
                canvas_vm::error::io_error(format!("failed to read {}", file.display()))
                    .set_source(e)
            })?;
            print!("{}", disassemble(&bytecode));
            Ok(false)
        }
        Commands::Tokens { file } => {
            let (tokens, diagnostics) = scan(&read_source(&file)?);
            for token in &tokens {
                println!("{:4} {}", token.line, token);
            }
            print_diagnostics(&diagnostics);
            Ok(diagnostics.has_errors())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli) {
        Ok(false) => {}
        Ok(true) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}
