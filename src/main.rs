#![warn(rust_2018_idioms)]

#[macro_use]
mod utils;
mod assembler;
mod catalog;
mod decoder;
#[allow(unused)]
mod registers;
mod simulator;

use std::env::args as program_args;
use std::fs;
use std::io::BufWriter;
use std::io::Write;
use std::process;

use getopts::Options;
use itertools::Itertools;

use crate::assembler::Assembler;
use crate::simulator::DumpState;
use crate::utils::{stdout, GenericResult};

fn main() {
    if let Err(error) = run() {
        println!("error: {}", error);
        process::exit(1);
    }
}

fn run() -> GenericResult<()> {
    const HELP_OPTION: &str = "h";
    const DUMP_OPTION: &str = "d";

    let args: Vec<String> = program_args().collect();
    let mut spec = Options::new();
    spec.optflag(HELP_OPTION, "help", "print this help menu");
    spec.optflag(
        DUMP_OPTION,
        "dump",
        "disassemble each executed instruction (sim mode)",
    );

    let matches = spec.parse(&args[1..])?;
    let program_name = &args[0];
    let brief = format!(
        "Usage: {} asm <input.s> <output.bin>\n       {} sim <input.bin> <trace.bin.txt> <trace.dec.txt>",
        program_name, program_name
    );
    if matches.opt_present(HELP_OPTION) {
        print!("{}", spec.usage(&brief));
        return Ok(());
    }

    let (mode, rest) = match matches.free.split_first() {
        Some((mode, rest)) => (mode.as_str(), rest),
        None => {
            print!("{}", spec.usage(&brief));
            process::exit(1)
        }
    };
    match (mode, rest) {
        ("asm", [input, output]) => assemble_file(input, output),
        ("sim", [input, binary_trace, decimal_trace]) => simulate_file(
            input,
            binary_trace,
            decimal_trace,
            matches.opt_present(DUMP_OPTION),
        ),
        ("asm", _) => error!("usage: {} asm <input.s> <output.bin>", program_name),
        ("sim", _) => error!(
            "usage: {} sim <input.bin> <trace.bin.txt> <trace.dec.txt>",
            program_name
        ),
        _ => error!("unknown mode `{}'; expected `asm' or `sim'", mode),
    }
}

fn assemble_file(input: &str, output: &str) -> GenericResult<()> {
    let source = fs::read_to_string(input)?;
    let program = Assembler::new().assemble(&source)?;
    let text = program
        .iter()
        .map(|&word| rvbits::to_bit_string(word))
        .join("\n");
    fs::write(output, text + "\n")?;
    Ok(())
}

fn simulate_file(
    input: &str,
    binary_trace: &str,
    decimal_trace: &str,
    dump: bool,
) -> GenericResult<()> {
    let text = fs::read_to_string(input)?;
    let lines: Vec<&str> = text.lines().collect();

    let mut dump_stream;
    let dump_state = if dump {
        dump_stream = stdout();
        DumpState::Instructions(&mut dump_stream)
    } else {
        DumpState::None
    };
    let simulation = simulator::run(&lines, dump_state)?;

    let mut binary = BufWriter::new(fs::File::create(binary_trace)?);
    simulation.write_binary(&mut binary)?;
    binary.flush()?;
    let mut decimal = BufWriter::new(fs::File::create(decimal_trace)?);
    simulation.write_decimal(&mut decimal)?;
    decimal.flush()?;
    Ok(())
}
