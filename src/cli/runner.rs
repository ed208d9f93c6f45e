//! Orchestration between parsed CLI arguments and the engine operations.

use indexmap::IndexMap;
use log::warn;

use crate::builders::BuilderKind;
use crate::cli::args::{BuilderArg, GenerateArgs, GitArg, ListArgs, PrepareArgs};
use crate::error::{Error, Result};
use crate::generate::{generate, GenerateOptions};
use crate::gitops::GitMode;
use crate::manifest::TemplateManifest;
use crate::prepare::{prepare, PrepareOptions};
use crate::prompt::{InteractivePrompt, NonInteractive, ValueSource};
use crate::repository::list_templates;
use crate::settings::AppSettings;
use crate::slug::SlugValue;

pub fn run_prepare(args: PrepareArgs) -> Result<()> {
    let mut seed = match &args.manifest {
        Some(path) => TemplateManifest::load(path)?,
        None => {
            let name = args
                .name
                .clone()
                .or_else(|| {
                    args.source_dir
                        .file_name()
                        .and_then(|n| n.to_str())
                        .map(str::to_string)
                })
                .ok_or_else(|| {
                    Error::ValidationError(
                        "cannot derive a template name; pass --name".into(),
                    )
                })?;
            TemplateManifest::new(&name)
        }
    };
    if let Some(name) = args.name {
        seed.name = name;
    }
    if let Some(author) = args.author {
        seed.author = author;
    }
    if let Some(description) = args.description {
        seed.description = description;
    }
    seed.prepare_excluded_paths.extend(args.excluded);
    seed.rename_only_paths.extend(args.rename_only);

    let result = prepare(PrepareOptions {
        source_dir: args.source_dir,
        output_dir: args.output_dir,
        seed,
        builder: args.builder.map(BuilderKind::from),
        skip_cleaning: args.skip_cleaning,
        dry_run: args.dry_run,
        force: args.force,
    })?;

    for line in result.report.lines() {
        println!("{line}");
    }
    if let Some(archive) = &result.archive_path {
        println!("Template archive written to '{}'", archive.display());
    }
    if let Some(scratch) = &result.scratch_dir {
        println!("Scratch copy kept at '{}'", scratch.display());
    }
    Ok(())
}

pub fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut provided: IndexMap<String, SlugValue> = IndexMap::new();
    for pair in &args.values {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            Error::ValidationError(format!("'{pair}' is not a KEY=VALUE pair"))
        })?;
        provided.insert(key.to_string(), SlugValue::Str(value.to_string()));
    }

    let git_mode = match args.git {
        GitArg::None => GitMode::NoRepo,
        GitArg::Init => GitMode::Init,
        GitArg::Full => {
            let remote = args.git_remote.clone().ok_or_else(|| {
                Error::ValidationError("--git full requires --git-remote".into())
            })?;
            GitMode::Full { remote }
        }
    };

    let interactive = InteractivePrompt;
    let non_interactive = NonInteractive;
    let source: &dyn ValueSource =
        if args.non_interactive { &non_interactive } else { &interactive };

    let result = generate(GenerateOptions {
        archive_path: args.archive,
        output_dir: args.output_dir,
        provided,
        source,
        force: args.force,
        dry_run: args.dry_run,
        git_mode,
    })?;

    for line in result.report.lines() {
        println!("{line}");
    }
    for warning in &result.warnings {
        warn!("{warning}");
    }
    if !result.report.dry_run {
        println!("Project generated in '{}'", result.output_dir.display());
        if let Some(instructions) = &result.instructions {
            println!();
            println!("{instructions}");
        }
    }
    Ok(())
}

pub fn run_list(args: ListArgs) -> Result<()> {
    let settings = match args.settings.or_else(AppSettings::default_path) {
        Some(path) => AppSettings::load(&path)?,
        None => AppSettings::default(),
    };
    if settings.repositories.is_empty() {
        println!("No template repositories configured.");
        return Ok(());
    }

    let outcome = list_templates(&settings.repositories, settings.access_token.as_deref())?;
    for warning in &outcome.warnings {
        warn!("{warning}");
    }
    if outcome.templates.is_empty() {
        println!("No templates found.");
        return Ok(());
    }
    for template in &outcome.templates {
        println!(
            "{}  ({}, {} bytes)",
            template.name, template.origin, template.size
        );
    }
    Ok(())
}

impl From<BuilderArg> for BuilderKind {
    fn from(arg: BuilderArg) -> Self {
        match arg {
            BuilderArg::Generic => BuilderKind::Generic,
            BuilderArg::Dotsln => BuilderKind::DotSln,
            BuilderArg::Dotslnx => BuilderKind::DotSlnx,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_args_map_to_builder_kinds() {
        assert_eq!(BuilderKind::from(BuilderArg::Generic), BuilderKind::Generic);
        assert_eq!(BuilderKind::from(BuilderArg::Dotsln), BuilderKind::DotSln);
        assert_eq!(BuilderKind::from(BuilderArg::Dotslnx), BuilderKind::DotSlnx);
    }
}
