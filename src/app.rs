use crate::builtins::{self, BuiltinEnv};
use crate::config::settings::{expand_home, Settings};
use crate::dispatch::{self, InvocationContext, InvocationOutcome, TaskFile};
use crate::error::RunError;
use crate::loader::{Loader, YamlLoader};
use crate::registry::TaskRegistry;
use crate::template;
use crate::util;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Output switches from the command line.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub file: Option<PathBuf>,
    pub list: bool,
    pub verbose: bool,
    pub json: bool,
}

pub struct App {
    pub settings: Settings,
    pub exe: PathBuf,
    pub loader: Arc<dyn Loader>,
}

impl App {
    pub fn new(settings: Settings, exe: PathBuf) -> Self {
        let loader = Arc::new(YamlLoader::new(settings.shell.clone()));
        App {
            settings,
            exe,
            loader,
        }
    }

    /// Task file for this run: `--file`, then `RUNFILE`, then the configured name in the cwd.
    pub fn runfile_path(&self, ctx: &InvocationContext, opts: &Options) -> PathBuf {
        let chosen = opts
            .file
            .clone()
            .or_else(|| ctx.var("RUNFILE").filter(|f| !f.is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(&self.settings.runfile.name));
        ctx.cwd.join(chosen)
    }

    fn builtin_env(&self, ctx: &InvocationContext, runfile: PathBuf) -> BuiltinEnv {
        let home = ctx.home_dir();
        BuiltinEnv {
            exe: self.exe.clone(),
            install_dir: expand_home(&self.settings.install.dir, home.as_deref()),
            rc_file: expand_home(&self.settings.install.rc_file, home.as_deref()),
            runfile,
            comp_line: ctx.var("COMP_LINE").map(str::to_string),
            comp_point: ctx.var("COMP_POINT").and_then(|p| p.trim().parse().ok()),
            loader: self.loader.clone(),
        }
    }

    /// Resolve, load and invoke once. Listings and produced values go to `out`, hints to `err`.
    pub async fn execute(
        &self,
        ctx: &InvocationContext,
        opts: &Options,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> Result<()> {
        let runfile = self.runfile_path(ctx, opts);

        if opts.list {
            let registry = self.loader.load(&runfile).await?;
            return self.print_listing(&registry, &registry.names(), opts, out);
        }

        let request = dispatch::resolve_target(
            &ctx.args,
            TaskFile::Project(runfile.clone()),
            TaskFile::Builtin,
        );

        let missing = !tokio::fs::try_exists(&runfile).await.unwrap_or(false);
        if request.task_name.is_none() && missing {
            if template::create_runfile(&runfile)
                .await
                .with_context(|| format!("failed to create {}", runfile.display()))?
            {
                info!(path = %runfile.display(), "created task file template");
                writeln!(out, "{} created!", util::display_path(&runfile, &ctx.cwd))?;
                return Ok(());
            }
        }

        let registry = match &request.target {
            TaskFile::Project(path) => self.loader.load(path).await?,
            TaskFile::Builtin => builtins::registry(self.builtin_env(ctx, runfile)),
        };

        let outcome = dispatch::invoke(
            &registry,
            request.task_name.as_deref(),
            &request.forwarded_args,
        )
        .await?;

        match outcome {
            InvocationOutcome::Listing(names) => {
                if let Some(name) = request.task_name.as_deref().filter(|n| !n.is_empty()) {
                    writeln!(err, "unknown task '{}', available tasks:", name)?;
                }
                self.print_listing(&registry, &names, opts, out)
            }
            InvocationOutcome::Value(Some(value)) if !value.is_empty() => {
                writeln!(out, "{}", value)?;
                Ok(())
            }
            InvocationOutcome::Value(_) => Ok(()),
        }
    }

    fn print_listing(
        &self,
        registry: &TaskRegistry,
        names: &[String],
        opts: &Options,
        out: &mut dyn Write,
    ) -> Result<()> {
        // The entry point is rejected when invoked, so it is never offered
        let names: Vec<&String> = names
            .iter()
            .filter(|n| !registry.get(n).is_some_and(|unit| unit.is_entry_point()))
            .collect();
        let description = |name: &str| {
            registry
                .get(name)
                .and_then(|unit| unit.description().map(str::to_string))
        };

        if opts.json {
            let json = if opts.verbose {
                let entries: Vec<serde_json::Value> = names
                    .iter()
                    .map(|n| serde_json::json!({ "name": n, "description": description(n) }))
                    .collect();
                serde_json::to_string(&entries)?
            } else {
                serde_json::to_string(&names)?
            };
            writeln!(out, "{}", json)?;
            return Ok(());
        }

        let width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);
        for name in names {
            match description(name).filter(|_| opts.verbose) {
                Some(desc) => writeln!(out, "{:<width$}  {}", name, desc, width = width)?,
                None => writeln!(out, "{}", name)?,
            }
        }
        Ok(())
    }
}

/// Process exit status for a failed run.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<RunError>()
        .map(RunError::exit_code)
        .unwrap_or(1)
}
