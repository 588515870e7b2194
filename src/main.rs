use std::fs::File;
use std::io::{stdin, stdout, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use clap::Parser;

use transport_catalogue::requests;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(clap::Subcommand, Debug)]
enum Mode {
    /// Read base requests, build the catalogue and router, and persist them
    #[command(alias = "make_base")]
    MakeBase {
        /// JSON document to read (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Also store the precomputed routing graph and table
        #[arg(long)]
        with_router_cache: bool,
    },
    /// Load the persisted catalogue and answer stat requests
    #[command(alias = "process_requests")]
    ProcessRequests {
        /// JSON document to read (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Where to write the answers (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn open_input(input: Option<PathBuf>) -> Result<Box<dyn Read>, std::io::Error> {
    Ok(match input {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(stdin().lock()),
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // Usage errors exit with a non-zero status from here.
    let args = Args::parse();

    match args.mode {
        Mode::MakeBase { input, with_router_cache } => {
            let document = requests::read_document(open_input(input)?)?;
            requests::make_base(&document, with_router_cache)?;
        }
        Mode::ProcessRequests { input, output } => {
            let document = requests::read_document(open_input(input)?)?;
            let mut writer: Box<dyn Write> = match output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(BufWriter::new(stdout().lock())),
            };
            requests::process_requests(&document, &mut writer)?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }

    Ok(())
}
