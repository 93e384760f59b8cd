//! fibbench: benchmark classical Fibonacci algorithms in concurrent workers.

use fibbench_lib::{app, config, errors};

fn main() {
    // Initialize tracing; stdout is reserved for reports and worker JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    // Parse CLI args and run
    let config = config::AppConfig::parse();
    let code = match app::run(&config) {
        Ok(code) => code,
        Err(err) => {
            fibbench_cli::ui::print_error(&format!("{err:#}"));
            errors::exit_code_for(&err)
        }
    };
    std::process::exit(code);
}
