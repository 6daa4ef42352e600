use std::process::ExitCode;

fn main() -> ExitCode {
    match housing_prep::app::run_ingest() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
