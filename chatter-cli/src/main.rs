use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::process;

use tracing::info;
use tracing_subscriber::EnvFilter;

use chatter_core::error::ChatterError;
use chatter_core::model::chatter::Chatter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.init();

	let args: Vec<String> = env::args().collect();
	match (args.get(1).map(String::as_str), args.get(2)) {
		(Some("learn"), Some(path)) if args.len() == 3 => learn(path),
		(Some("talk"), Some(dir)) if args.len() == 3 => talk(dir),
		_ => {
			eprintln!("usage: chatter learn <file> | chatter talk <dir>");
			process::exit(2);
		}
	}
}

/// Learns each line of the file at `path` into the model directory
/// `<path>.d`, creating it if needed.
fn learn(path: &str) -> Result<(), Box<dyn std::error::Error>> {
	let mut model = Chatter::open(format!("{path}.d"))?;

	println!("Learning...");
	let mut lines = 0usize;
	for line in BufReader::new(File::open(path)?).lines() {
		model.learn(&line?)?;
		lines += 1;
	}
	info!(lines, "corpus read");

	println!("Writing to disk...");
	model.close()?;
	Ok(())
}

/// Interactive prompt loop against the model stored in `dir`.
fn talk(dir: &str) -> Result<(), Box<dyn std::error::Error>> {
	let mut model = Chatter::open(dir)?;
	let stdin = io::stdin();

	loop {
		print!("> ");
		io::stdout().flush()?;

		let mut line = String::new();
		if stdin.lock().read_line(&mut line)? == 0 {
			break; // EOF
		}

		match model.respond(&line) {
			Ok(sentence) => println!("{sentence}"),
			Err(ChatterError::EmptyModel) => println!("nothing learned yet"),
			Err(e) => return Err(e.into()),
		}
	}

	model.close()?;
	Ok(())
}
