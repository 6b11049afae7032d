use crate::assembler::{self, model::EncodedInst, Failure};
use ansi_term::Color::Red;
use anyhow::Context;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[cfg(windows)]
pub fn terminal_init() {
    ansi_term::enable_ansi_support().expect("could not enable terminal ANSI support");
}

#[cfg(not(windows))]
pub fn terminal_init() {}

#[derive(StructOpt, Debug)]
#[structopt(name = "gasm", about = "Assembler for the Graphite CPU")]
pub struct SubcommandAsm {
    #[structopt(name = "in.gs", parse(from_os_str))]
    in_src: PathBuf,

    /// Also write the listing to this file.
    #[structopt(short = "o", long = "out", parse(from_os_str))]
    out_listing: Option<PathBuf>,
}

pub fn asm(cmd: SubcommandAsm) -> ! {
    match run(cmd) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(err) => {
            println!("{}", Red.paint(format!("{:#}", err)));
            std::process::exit(1);
        }
    }
}

/// Assembles the input and prints the listing. A translation failure still
/// prints whatever was encoded before the error, then the diagnostic; only
/// the exit status distinguishes the two.
fn run(cmd: SubcommandAsm) -> anyhow::Result<bool> {
    let source = std::fs::read_to_string(&cmd.in_src)
        .with_context(|| format!("could not read source file '{}'", cmd.in_src.display()))?;

    match assembler::assemble(&source) {
        Ok(listing) => {
            print_listing(&listing);
            if let Some(path) = &cmd.out_listing {
                write_listing(path, &listing)?;
            }
            Ok(true)
        }
        Err(Failure { listing, error }) => {
            print_listing(&listing);
            println!("{}", Red.paint(error.to_string()));
            Ok(false)
        }
    }
}

fn print_listing(listing: &[EncodedInst]) {
    for inst in listing {
        println!("{}", inst);
    }
}

fn write_listing(path: &Path, listing: &[EncodedInst]) -> anyhow::Result<()> {
    let mut text = assembler::render_listing(listing);
    if !text.is_empty() {
        text.push('\n');
    }
    std::fs::write(path, text)
        .with_context(|| format!("could not write listing to '{}'", path.display()))
}
