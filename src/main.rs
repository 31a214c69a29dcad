use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
mod app;

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    let result = app::start();
    match result {
        Ok(..) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() -> ExitCode {
    ExitCode::SUCCESS
}
