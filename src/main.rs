use std::process::ExitCode;

fn main() -> ExitCode {
    match vaxnet::runner::run_with_args() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vaxnet: {e}");
            ExitCode::FAILURE
        }
    }
}
