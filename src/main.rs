use chrono::Local;
use flexi_logger::{FileSpec, Logger, WriteMode};
use log::{error, info};
use std::env;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::process;
use windga::param;

fn main() {
    let param_file = env::args().nth(1).unwrap_or_else(|| "param.yaml".to_string());

    let param = match param::get(param_file.clone()) {
        Ok(param) => param,
        Err(e) => {
            eprintln!("Cannot load parameters from {}: {}", param_file, e);
            process::exit(1);
        }
    };

    // Keep the handle alive so file logs are flushed on exit
    let _logger = match start_logger(&param) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Cannot start logger: {}", e);
            process::exit(1);
        }
    };
    info!("windga {} using {}", env!("CARGO_PKG_VERSION"), param_file);

    let result = match windga::run(&param) {
        Ok(result) => result,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };

    if !param.general.save_result.is_empty() {
        match save_result(&result, &param.general.save_result) {
            Ok(()) => info!("Result saved to {}", param.general.save_result),
            Err(e) => {
                error!("Cannot save result to {}: {}", param.general.save_result, e);
                process::exit(1);
            }
        }
    }
}

fn start_logger(param: &param::Param) -> Result<flexi_logger::LoggerHandle, Box<dyn Error>> {
    let logger = Logger::try_with_env_or_str(&param.general.log_level)?;

    let handle = if param.general.log_base.is_empty() {
        logger.start()?
    } else {
        let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
        logger
            .log_to_file(
                FileSpec::default()
                    .basename(format!("{}_{}", param.general.log_base, timestamp))
                    .suppress_timestamp()
                    .suffix(&param.general.log_suffix),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .duplicate_to_stderr(flexi_logger::Duplicate::All)
            .start()?
    };
    Ok(handle)
}

fn save_result(result: &windga::ga::RunResult, path: &str) -> Result<(), Box<dyn Error>> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, result)?;
    Ok(())
}
