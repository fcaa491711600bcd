use std::{io::Write, path::Path, process::ExitCode};

use crate::cli::Command;
use crate::reassembly::Analyzer;

mod cli;
mod config;
mod diagnostic;
mod reassembly;
mod report;
mod transcript;

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> anyhow::Result<()> {
    let (global, command) = cli::parse(args)?;
    let transcript_path = match command {
        Command::Help => {
            print!("{}", cli::USAGE);
            return Ok(());
        }
        Command::Decode { transcript, .. } | Command::Summary { transcript } | Command::Check { transcript } => {
            Path::new(transcript)
        }
    };

    let mut config = config::load(global.config.map(Path::new))?;
    if let Some(port) = global.port {
        config.service_port = port;
    }
    if let Some(passes) = global.passes {
        config.passes = passes;
    }
    let _log_guard = kvlog::collector::init_file_logger(config.log_file.as_str());
    kvlog::info!("Starting", command = ?command, port = config.service_port, passes = config.passes);

    let transcript = transcript::load(transcript_path)?;
    let mut out = String::new();
    match command {
        Command::Check { .. } => {
            out = format!(
                "{}: {} segments, {} streams, {} bytes\n",
                transcript_path.display(),
                transcript.segments.len(),
                transcript.stream_count(),
                transcript.byte_count()
            );
        }
        Command::Summary { .. } => {
            let report = Analyzer::new(&config).run(&transcript);
            for message in &report.messages {
                report::write_summary(&mut out, message);
            }
        }
        Command::Decode { json: true, .. } => {
            let report = Analyzer::new(&config).run(&transcript);
            out = report::to_json(&report);
            out.push('\n');
        }
        Command::Decode { json: false, .. } => {
            let report = Analyzer::new(&config).run(&transcript);
            for message in &report.messages {
                report::write_tree(&mut out, message);
            }
        }
        Command::Help => {}
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(out.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
