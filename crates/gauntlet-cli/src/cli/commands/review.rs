use crate::cli::args::ReviewArgs;
use crate::exit_codes::SUCCESS;
use gauntlet_core::result::RunSummary;
use gauntlet_core::review::{ReviewFilter, Reviewer};

pub fn run(args: ReviewArgs) -> anyhow::Result<i32> {
    let mut summary = RunSummary::load(&args.run)?;
    let filter = ReviewFilter::parse(&args.filter);

    let stdin = std::io::stdin().lock();
    let stdout = std::io::stdout().lock();
    let reviewed = Reviewer::new(stdin, stdout).review(&mut summary, filter)?;

    if reviewed > 0 {
        summary.save(&args.run)?;
        println!(
            "\n{} case(s) graded; results updated in {}",
            reviewed,
            args.run.display()
        );
    } else {
        println!("\nNo cases graded; file left unchanged.");
    }
    Ok(SUCCESS)
}
