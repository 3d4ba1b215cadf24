use anyhow::Context;
use gauntlet_core::{config, judge, prompt, suite};

use crate::cli::args::ValidateArgs;
use crate::exit_codes;

pub fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let cfg = config::load_or_default(&args.config)
        .with_context(|| format!("loading config {:?}", args.config))?;
    cfg.validate()
        .with_context(|| format!("config {:?}", args.config))?;
    println!("Config {:?} is valid.", args.config);

    if let Some(suite_path) = &args.suite {
        let suite = suite::load(suite_path)?;
        suite
            .validate()
            .with_context(|| format!("suite {suite_path:?}"))?;

        // Judge specs fail at scoring time otherwise; surface them here.
        for case in &suite.cases {
            for spec in &case.judges {
                judge::from_spec(spec).map_err(|e| {
                    anyhow::anyhow!("suite {:?}, case \"{}\": {}", suite_path, case.name, e)
                })?;
            }
        }

        if !suite.prompt.is_empty() {
            let variants = prompt::load_dir(&args.prompts_dir)
                .with_context(|| format!("loading prompts from {:?}", args.prompts_dir))?;
            let variant = variants
                .iter()
                .find(|v| v.name == suite.prompt)
                .with_context(|| {
                    format!(
                        "suite {:?} references prompt \"{}\" which was not found in {:?}",
                        suite_path, suite.prompt, args.prompts_dir
                    )
                })?;
            variant
                .validate()
                .with_context(|| format!("prompt \"{}\"", variant.name))?;
        }

        println!(
            "Suite {:?} is valid ({} cases).",
            suite_path,
            suite.cases.len()
        );
    }

    Ok(exit_codes::SUCCESS)
}
