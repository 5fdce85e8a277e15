use clap::{ArgGroup, Parser};
use std::path::PathBuf;
use std::process::ExitCode;

use c_macro_eval::{FsLoader, Interpreter, PreprocessorConfig, PreprocessorError};

#[derive(Parser)]
#[command(name = "c-macro-eval")]
#[command(about = "Evaluate C/C++ macros without compiling", long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "raw"])))]
struct Cli {
    /// A C/C++ file to evaluate with the preprocessor
    #[arg(short, long)]
    file: Option<String>,

    /// Source text to evaluate directly
    #[arg(short, long)]
    raw: Option<String>,

    /// The macro to be evaluated
    #[arg(short, long = "macro", value_name = "NAME")]
    macro_name: Option<String>,

    /// Include path, works like gcc's -I
    #[arg(short = 'I', long = "include-path", value_name = "DIR")]
    include_paths: Vec<PathBuf>,

    /// Predefine a macro, works like gcc's -D (NAME alone means NAME=1)
    #[arg(short = 'D', long = "define", value_name = "NAME[=BODY]")]
    defines: Vec<String>,

    /// Print every defined symbol
    #[arg(long)]
    list: bool,

    /// Treat unbalanced conditionals as errors
    #[arg(long)]
    strict: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), PreprocessorError> {
    let loader = FsLoader::with_include_paths(cli.include_paths.iter().cloned());

    let mut config = PreprocessorConfig::new();
    config.strict(cli.strict);
    for define in &cli.defines {
        let (name, body) = define.split_once('=').unwrap_or((define.as_str(), "1"));
        config.define(name, body);
    }

    let mut interpreter = Interpreter::with_config(&loader, config);
    if let Some(file) = &cli.file {
        log::debug!("processing {}", file);
        interpreter.process_unit(file)?;
    } else if let Some(raw) = &cli.raw {
        interpreter.process_source(raw)?;
    }

    for pragma in interpreter.pragmas() {
        println!("pragma {}", pragma);
    }

    if cli.list {
        for name in interpreter.symbols().defined_symbols() {
            match interpreter.symbols().get(&name)?.body() {
                "" => println!("{}", name),
                body => println!("{} {}", name, body),
            }
        }
    }

    if let Some(name) = &cli.macro_name {
        println!("{}", interpreter.evaluate(name)?);
    }

    Ok(())
}
