use std::process::ExitCode;

fn main() -> ExitCode {
    match pklot_prep::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
