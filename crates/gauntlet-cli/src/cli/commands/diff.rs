use crate::cli::args::DiffArgs;
use crate::exit_codes::{EVAL_FAILED, SUCCESS};
use anyhow::{bail, Context};
use gauntlet_core::diff::{compare, Category};
use gauntlet_core::report::print_diff_table;
use gauntlet_core::result::RunSummary;

pub fn run(args: DiffArgs) -> anyhow::Result<i32> {
    let a = RunSummary::load(&args.run_a)?;
    let b = RunSummary::load(&args.run_b)?;

    let categories = args
        .filter
        .iter()
        .map(|s| s.parse::<Category>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(anyhow::Error::msg)?;

    let dr = compare(&a, &b, args.threshold).filter(&categories);

    match args.format.as_str() {
        "table" => {
            let mut stdout = std::io::stdout().lock();
            print_diff_table(&mut stdout, &dr)?;
        }
        "json" => {
            let out = serde_json::to_string_pretty(&dr).context("serializing diff")?;
            println!("{}", out);
        }
        other => bail!("unknown format \"{}\" (expected table or json)", other),
    }

    if dr.has_regressions() {
        Ok(EVAL_FAILED)
    } else {
        Ok(SUCCESS)
    }
}
