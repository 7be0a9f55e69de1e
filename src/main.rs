use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use folio::build::{build_site, check_site, Report};
use folio::config::Config;
use folio::frontmatter;
use folio::util::read_to_string;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(
        short,
        long,
        default_value = ".",
        help = "The project directory, or any directory below it."
    )]
    project: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Builds the site.
    Build {
        #[arg(short, long, help = "The output directory. Defaults to `_site`.")]
        output: Option<PathBuf>,

        #[arg(long, help = "Publish drafts too.")]
        drafts: bool,
    },

    /// Parses every content file and reports problems without writing
    /// anything.
    Check,

    /// Prints the front matter and rendered HTML of a single content file.
    Render {
        #[arg(help = "The Markdown file to render.")]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize Logging.
    let log_environ = env_logger::Env::new()
        .filter("FOLIO_LOG")
        .write_style("FOLIO_LOG_STYLE");
    let mut log_builder = env_logger::Builder::new();

    log_builder.filter_level(log::LevelFilter::Info);
    log_builder.parse_env(log_environ);
    log_builder.init();

    // Parse Arguments.
    let args = Args::parse();
    let project = args
        .project
        .canonicalize()
        .with_context(|| format!("Resolving `{}`", args.project.display()))?;

    match args.command {
        Command::Build { output, drafts } => {
            let mut config = Config::from_directory(&project, output.as_deref())?;
            config.include_drafts |= drafts;
            log::info!(
                "Outputting to `{}`",
                config.root_output_directory.display()
            );
            finish(build_site(&config)?)
        }
        Command::Check => {
            let config = Config::from_directory(&project, None)?;
            let report = check_site(&config)?;
            log::info!(
                "{} records ok, {} drafts",
                report.records,
                report.drafts
            );
            finish(report)
        }
        Command::Render { file } => {
            let input = read_to_string(&file, "content")?;
            print!("{}", frontmatter::extract(&input)?.render()?);
            Ok(())
        }
    }
}

fn finish(report: Report) -> Result<()> {
    match report.succeeded() {
        true => {
            log::info!("Done.");
            Ok(())
        }
        false => Err(anyhow!("{} content files failed", report.failures)),
    }
}
