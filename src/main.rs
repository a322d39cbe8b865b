use std::{fs::read_to_string, path::PathBuf, process::ExitCode, time::Instant};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use reflang::{ast::dump::dump_program, display_error, driver::Session, interpreter::interpreter::Interpreter};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    /// The parsed, untyped tree.
    Ast,
    /// The tree after type assignment.
    TypedAst,
    /// The lowered module.
    Ir,
    None,
}

#[derive(Debug, Parser)]
#[command(version, about = "Compile and run reflang programs")]
struct CompilerOptions {
    /// The source file to compile.
    input: PathBuf,

    /// What to print once compilation succeeds.
    #[arg(long, value_enum, default_value = "ir")]
    emit: Emit,

    /// Run this function with the interpreter after compiling.
    #[arg(long)]
    run: Option<String>,

    /// Integer arguments for the function given to `--run`.
    #[arg(long = "arg", allow_negative_numbers = true)]
    args: Vec<i64>,

    /// Values returned by successive `input()` calls.
    #[arg(long = "input", allow_negative_numbers = true)]
    inputs: Vec<i64>,

    /// Log the pipeline stages.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let opts = CompilerOptions::parse();

    let default_level = if opts.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let file_contents = read_to_string(&opts.input)
        .with_context(|| format!("failed to read {}", opts.input.display()))?;
    let file_name = opts
        .input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("<input>"));

    let session = Session::new();

    if opts.emit == Emit::Ast {
        match session.parse(&file_contents, &file_name) {
            Ok(program) => print!("{}", dump_program(&program)),
            Err(error) => {
                display_error(&error, &file_contents);
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    let start = Instant::now();
    let compilation = match session.compile(&file_contents, &file_name) {
        Ok(compilation) => compilation,
        Err(error) => {
            display_error(&error, &file_contents);
            return Ok(ExitCode::FAILURE);
        }
    };
    tracing::info!(elapsed = ?start.elapsed(), "compiled {}", file_name);

    match opts.emit {
        Emit::TypedAst => print!("{}", dump_program(&compilation.program)),
        Emit::Ir => print!("{}", compilation.module),
        Emit::Ast | Emit::None => {}
    }

    if let Some(function) = &opts.run {
        let mut interpreter = Interpreter::new(&compilation.module).with_input(opts.inputs.clone());
        let run_start = Instant::now();
        let result = interpreter
            .run_function(function, &opts.args)
            .with_context(|| format!("failed to run `{}`", function))?;
        tracing::info!(elapsed = ?run_start.elapsed(), "ran {}", function);

        for value in interpreter.output() {
            println!("{}", value);
        }
        if let Some(result) = result {
            println!("{} returned {}", function, result);
        }
    }

    Ok(ExitCode::SUCCESS)
}
