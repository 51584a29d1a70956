use std::process::ExitCode;

fn main() -> ExitCode {
    match genova_studio_lib::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}
