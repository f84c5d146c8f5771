use clap::Parser as ClapParser;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};

use pl0_parser::{
    Compilation, CompileError, CompilerSettings, Lexer, compile, read_tokens, scan_to_token_list,
};
use pm0_bytecode::{Listing, codec};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// PL/0 source file, or a token list with `--tokens`
    input: PathBuf,

    #[arg(short, long, default_value = "elf.txt", help = "Bytecode output file")]
    output: PathBuf,

    #[arg(long, help = "Read the input as a token list instead of source text")]
    tokens: bool,

    /// Also write the scanned token list to this file
    #[arg(long, value_name = "PATH", conflicts_with = "tokens")]
    emit_tokens: Option<PathBuf>,

    #[arg(short, long, help = "Do not print the listing and symbol table")]
    quiet: bool,

    #[arg(long, default_value_t = CompilerSettings::default().max_code_length)]
    max_code: usize,

    #[arg(long, default_value_t = CompilerSettings::default().max_symbols)]
    max_symbols: usize,

    #[arg(long, default_value_t = CompilerSettings::default().max_tokens)]
    max_tokens: usize,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let input = match fs::read_to_string(&cli.input) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error reading file '{}': {}", cli.input.display(), err);
            process::exit(1);
        }
    };

    let settings = CompilerSettings {
        max_code_length: cli.max_code,
        max_symbols: cli.max_symbols,
        max_tokens: cli.max_tokens,
    };

    let result = if cli.tokens {
        match read_tokens(&input) {
            Ok(tokens) => compile(tokens, &settings),
            Err(err) => {
                let path = cli.input.display();
                eprintln!("Error reading token list '{path}': {err}");
                process::exit(1);
            }
        }
    } else {
        if let Some(path) = &cli.emit_tokens {
            let list = scan_to_token_list(&input);
            if let Err(err) = write_output(path, |out| out.write_all(list.as_bytes())) {
                eprintln!("Error writing '{}': {}", path.display(), err);
                process::exit(1);
            }
        }
        compile(Lexer::from_str(&input), &settings)
    };

    match result {
        Ok(compiled) => {
            if !cli.quiet {
                print_report(&compiled);
            }
            let raw = compiled.program.to_raw();
            if let Err(err) = write_output(&cli.output, |out| codec::write_text(out, &raw)) {
                eprintln!("Error writing '{}': {}", cli.output.display(), err);
                process::exit(1);
            }
        }
        Err(err) => {
            let source = (!cli.tokens).then_some(input.as_str());
            report_failure(&cli.output, &err, source)
        }
    }
}

fn print_report(compiled: &Compilation) {
    println!("Assembly Code:\n");
    print!("{}", Listing::new(compiled.program.instructions()));
    println!("\nSymbol Table:\n");
    print!("{}", compiled.symbols.dump());
}

/// Print the error and replace the output file with the marker line.
fn report_failure(output: &Path, err: &CompileError, source: Option<&str>) -> ! {
    eprintln!("Error: {err}");
    if let Some(excerpt) = source.and_then(|src| err.span?.excerpt(src)) {
        eprintln!("{excerpt}");
    }
    let marker = format!("{} {}", codec::ERROR_MARKER, err.kind);
    if let Err(io_err) = write_output(output, |out| writeln!(out, "{marker}")) {
        eprintln!("Error writing '{}': {}", output.display(), io_err);
    }
    process::exit(1);
}

fn write_output(
    path: &Path,
    write: impl FnOnce(&mut io::BufWriter<fs::File>) -> io::Result<()>,
) -> io::Result<()> {
    let mut out = io::BufWriter::new(fs::File::create(path)?);
    write(&mut out)?;
    out.flush()
}
