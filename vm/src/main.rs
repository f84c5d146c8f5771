use clap::Parser as ClapParser;
use std::{fs, path::PathBuf, process};

use pm0_vm::{DEFAULT_MEMORY_SIZE, Machine, MachineSettings, TRACE_HEADER, TextConsole};

#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bytecode file written by the compiler
    #[arg(help = "The bytecode file to execute")]
    bytecode: PathBuf,

    #[arg(long, default_value_t = DEFAULT_MEMORY_SIZE, help = "Memory size in words")]
    memory: usize,

    #[arg(long, help = "Do not print the execution trace")]
    no_trace: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let text = match fs::read_to_string(&cli.bytecode) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error reading file '{}': {}", cli.bytecode.display(), err);
            process::exit(1);
        }
    };

    let settings = MachineSettings {
        memory_size: cli.memory,
    };
    let mut machine = match Machine::new(&settings) {
        Ok(machine) => machine,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    };
    if let Err(err) = machine.load_text(&text) {
        eprintln!("Error loading '{}': {}", cli.bytecode.display(), err);
        process::exit(1);
    }

    let trace = !cli.no_trace;
    if trace {
        println!("{TRACE_HEADER}");
        println!("Initial values : {}", machine.registers());
    }

    let mut console = TextConsole::stdio();
    let result = machine.run(&mut console, |record| {
        if trace {
            println!("{record}");
        }
    });
    if let Err(err) = result {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
