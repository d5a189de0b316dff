use std::path::Path;
use std::process::ExitCode;

#[cfg(target_os = "linux")]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

use cache_clean_config::generate_config;
use clap::Parser;

#[derive(Parser)]
#[command(
    name = "generate-cache-clean-config",
    version,
    about = "Writes the consolidated cache-clean configuration for a Magento installation"
)]
struct Cli {
    /// Path to the Magento installation
    #[arg(value_name = "path/to/magento", default_value = ".")]
    path: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Help goes to stdout, usage errors to stderr; both exit 1, as
            // the consumers of this tool expect.
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    match generate_config(Path::new(&cli.path)).await {
        Ok(output_file) => {
            println!("Wrote configuration to {}", output_file.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("[ERROR] {:#}", err);
            ExitCode::FAILURE
        }
    }
}
