use clap::Parser;

use slide_explainer_lib::cli::{self, Args};

fn main() {
    let args = Args::parse();
    slide_explainer_lib::init_logging(slide_explainer_lib::DEFAULT_LOG_DIRECTIVES);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create tokio runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = rt.block_on(cli::run(args.command)) {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}
