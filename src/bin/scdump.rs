use std::path::PathBuf;
use std::process::ExitCode;

use sc_asset::{NoLzhamDecoder, ProcessOptions, ProcessOutcome};


fn construct_app() -> clap::Command<'static> {
	clap::Command::new("scdump")
		.version(clap::crate_version!())
		.setting(clap::AppSettings::DeriveDisplayOrder)
		.arg(clap::arg!(loglevel: -L --verbose "Global log verbosity level")
			.ignore_case(true)
			.possible_values(["Error", "Warn", "Info", "Debug", "Trace"])
			.default_value("Info"))
		.arg(clap::arg!(old: --old "Apply the legacy OldDictionary prologue before walking chunks").takes_value(false))
		.arg(clap::arg!(output_dir: -o --"output-dir" <DIR> "Output directory").required(false))
		.arg(clap::arg!(inputs: <INPUT> ... "Input container files"))
}


fn main() -> ExitCode {
	let args: Vec<_> = wild::args().collect();
	let matches = construct_app().get_matches_from(args);

	let loglevel = matches.value_of("loglevel")
		.unwrap_or("Info")
		.parse::<log::LevelFilter>()
		.expect("Could not parse -L <loglevel>");

	fern::Dispatch::new()
		.format(|out, message, record| {
			out.finish(format_args!(
				"[{}] [{}] [{}] {}",
				chrono::Local::now().format("%H:%M:%S"),
				record.target(),
				record.level(),
				message))
		})
		.level(loglevel)
		.chain(std::io::stderr())
		.apply()
		.unwrap();

	log::trace!("Global loglevel set to {:?}", loglevel);

	let options = ProcessOptions {
		old_dictionary: matches.is_present("old"),
	};

	let output_dir = matches.value_of("output_dir")
		.map(PathBuf::from)
		.unwrap_or_else(|| std::env::current_dir().expect("Could not read current directory"));

	let inputs: Vec<&str> = matches.values_of("inputs").expect("at least one INPUT required").collect();
	let lzham = NoLzhamDecoder;

	let mut any_succeeded = false;

	for input in inputs {
		match process_one(input, &output_dir, &options, &lzham) {
			Ok(outcome) => {
				any_succeeded = true;
				log::info!("{}: {}", input, describe(&outcome));
			},

			Err(e) => {
				log::error!("{}: {}", input, e);
			},
		}
	}

	if any_succeeded {
		ExitCode::SUCCESS
	} else {
		ExitCode::FAILURE
	}
}


fn process_one(
	input: &str,
	output_dir: &PathBuf,
	options: &ProcessOptions,
	lzham: &dyn sc_asset::LzhamDecoder,
) -> Result<ProcessOutcome, Box<dyn std::error::Error>> {
	let path = PathBuf::from(input);
	let bytes = std::fs::read(&path)?;

	let source_dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
	let base_name = path.file_stem()
		.and_then(|s| s.to_str())
		.ok_or("input path has no valid file name")?;

	let extension = path.extension()
		.and_then(|s| s.to_str())
		.map(|s| format!(".{}", s))
		.unwrap_or_default();

	let outcome = sc_asset::process_file(&bytes, source_dir, base_name, &extension, output_dir, options, lzham)?;
	Ok(outcome)
}


fn describe(outcome: &ProcessOutcome) -> String {
	match outcome {
		ProcessOutcome::Images { count } => format!("wrote {} image(s)", count),
		ProcessOutcome::RawTable { len } => format!("wrote {} byte table", len),
	}
}
