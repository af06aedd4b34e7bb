use clap::Parser;
use run::app::{self, App, Options};
use run::config::settings;
use run::dispatch::InvocationContext;
use run::util;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "run",
    version,
    about = "Run tasks from a project Runfile",
    after_help = "Examples:\n  run                 list tasks (creates Runfile.yaml if missing)\n  run build -v        run task 'build' with argument '-v'\n  run .install        install run and its shell completion"
)]
struct Cli {
    /// Task file to use instead of ./Runfile.yaml (also RUNFILE)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// List tasks without running anything
    #[arg(short, long)]
    list: bool,

    /// Show task descriptions in listings
    #[arg(short, long)]
    verbose: bool,

    /// Print listings as JSON
    #[arg(long)]
    json: bool,

    /// Task name followed by its arguments; prefix with '.' for built-in tasks
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // stdout is reserved for task output and completion candidates
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_env("RUN_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let code = match try_main(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            app::exit_code(&err)
        }
    };
    std::process::exit(code);
}

async fn try_main(cli: Cli) -> anyhow::Result<()> {
    let ctx = InvocationContext::from_process(cli.args)?;

    let config_dir = util::config_dir(&ctx)?;
    let (settings, _) = settings::load_settings(&config_dir)?;
    let exe = std::env::current_exe()?;

    let opts = Options {
        file: cli.file,
        list: cli.list,
        verbose: cli.verbose,
        json: cli.json,
    };

    let app = App::new(settings, exe);
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();
    let result = app.execute(&ctx, &opts, &mut out, &mut err).await;
    out.flush()?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_stop_at_the_task_name() {
        let cli = Cli::try_parse_from(["run", "-v", "build", "-v", "--list"]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.list);
        assert_eq!(cli.args, vec!["build", "-v", "--list"]);
    }

    #[test]
    fn builtin_keeps_its_arguments() {
        let cli = Cli::try_parse_from(["run", ".install", "/opt/bin"]).unwrap();
        assert_eq!(cli.args, vec![".install", "/opt/bin"]);
        assert!(cli.file.is_none());
    }

    #[test]
    fn file_option_before_task() {
        let cli = Cli::try_parse_from(["run", "-f", "tasks.yaml", "--json", "lint", "-f", "x"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("tasks.yaml")));
        assert!(cli.json);
        assert_eq!(cli.args, vec!["lint", "-f", "x"]);
    }

    #[test]
    fn no_arguments_lists() {
        let cli = Cli::try_parse_from(["run"]).unwrap();
        assert!(cli.args.is_empty());
        assert!(!cli.list);
    }
}
