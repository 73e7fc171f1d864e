use std::process::ExitCode;

use lexical_ambiguity::{
    CancellationToken,
    cli::{self, LexambArgs},
    logging::init_tracing,
};
use ortho_config::OrthoConfig;

fn main() -> ExitCode {
    // CLI flags override environment variables, which override the config file.
    let args = match LexambArgs::load() {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(args.log_level());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    if let Err(err) = ctrlc::set_handler(move || on_interrupt.cancel()) {
        tracing::warn!(error = %err, "Ctrl-C handler not installed");
    }

    match cli::run(&args, &cancel).and_then(|report| cli::render(&report, args.json)) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "detection aborted");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
