mod cli;
mod commands;
mod prompt;
mod shell;

use jobapp::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
