use crate::cli::args::{ListArgs, ListDirArgs, ListSub};
use crate::exit_codes::SUCCESS;
use anyhow::Context;
use gauntlet_core::{prompt, suite};

pub fn run(args: ListArgs) -> anyhow::Result<i32> {
    match args.cmd {
        ListSub::Prompts(dir_args) => list_prompts(&dir_args),
        ListSub::Suites(dir_args) => list_suites(&dir_args),
    }
}

fn list_prompts(args: &ListDirArgs) -> anyhow::Result<i32> {
    let dir = args.dir.join("prompts");
    let prompts = prompt::load_dir(&dir)
        .with_context(|| format!("loading prompts from {}", dir.display()))?;

    if prompts.is_empty() {
        println!("No prompt variants found.");
        return Ok(SUCCESS);
    }
    for p in prompts {
        let desc = if p.description.is_empty() {
            "(no description)"
        } else {
            &p.description
        };
        println!("  {:<20} {}", p.name, desc);
    }
    Ok(SUCCESS)
}

fn list_suites(args: &ListDirArgs) -> anyhow::Result<i32> {
    let dir = args.dir.join("suites");
    let suites = suite::load_dir(&dir)
        .with_context(|| format!("loading suites from {}", dir.display()))?;

    if suites.is_empty() {
        println!("No eval suites found.");
        return Ok(SUCCESS);
    }
    for s in suites {
        let desc = if s.description.is_empty() {
            "(no description)"
        } else {
            &s.description
        };
        println!("  {:<20} {:<40} ({} cases)", s.name, desc, s.cases.len());
    }
    Ok(SUCCESS)
}
