mod cli;
mod find_cmd;
mod images_cmd;
mod info_cmd;
mod page_range;
mod render_cmd;
mod shared;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Info {
            ref file,
            ref pages,
            format,
        } => info_cmd::run(file, pages.as_deref(), format),
        Commands::Render {
            ref file,
            ref pages,
            dpi,
            ref output,
            transparent,
        } => render_cmd::run(file, pages.as_deref(), dpi, output, transparent),
        Commands::Find {
            ref file,
            ref query,
            ref pages,
            format,
            points,
            regex,
            case_sensitive,
        } => find_cmd::run(
            file,
            pages.as_deref(),
            format,
            &find_cmd::FindArgs {
                query,
                points,
                regex,
                case_sensitive,
            },
        ),
        Commands::Images {
            ref file,
            ref pages,
            format,
        } => images_cmd::run(file, pages.as_deref(), format),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
