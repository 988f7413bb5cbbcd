use jobapp_cli::run;

fn main() {
    if let Err(err) = run() {
        println!("failed: {err}");
        std::process::exit(err.exit_code());
    }
}
