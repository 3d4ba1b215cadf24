use anyhow::Context;
use std::path::Path;

use crate::cli::args::InitArgs;
use crate::exit_codes;

const EXAMPLE_CONFIG: &str = r#"providers:
  anthropic:
    model: claude-sonnet-4-5-20250929
    api_key_env: ANTHROPIC_API_KEY

concurrency: 5
timeout_secs: 60
output_dir: results/
"#;

const EXAMPLE_PROMPT: &str = r#"name: default
description: Baseline assistant prompt
system: You are a helpful assistant.
user: "{{question}}"
"#;

const EXAMPLE_SUITE: &str = r#"name: example
description: Smoke-test suite
prompt: default
cases:
  - name: greeting
    input:
      question: Say hello to the user.
    judges:
      - type: contains
        value: hello
        weight: 1.0
        comment: The reply should greet the user.
"#;

pub fn run(args: InitArgs) -> anyhow::Result<i32> {
    println!("Initializing eval project in {:?}", args.dir);

    for sub in ["prompts", "suites", "results"] {
        let dir = args.dir.join(sub);
        if dir.exists() {
            println!("  skipped {sub}/ (already exists)");
        } else {
            std::fs::create_dir_all(&dir).with_context(|| format!("creating {dir:?}"))?;
            println!("  created {sub}/");
        }
    }

    write_if_absent(&args.dir.join("gauntlet.yaml"), EXAMPLE_CONFIG)?;
    write_if_absent(&args.dir.join("prompts/default.yaml"), EXAMPLE_PROMPT)?;
    write_if_absent(&args.dir.join("suites/example.yaml"), EXAMPLE_SUITE)?;

    println!("\nRun 'gauntlet validate --suite suites/example.yaml' to check the scaffold.");
    Ok(exit_codes::SUCCESS)
}

fn write_if_absent(path: &Path, content: &str) -> anyhow::Result<()> {
    if path.exists() {
        println!("  skipped {} (already exists)", path.display());
        return Ok(());
    }
    std::fs::write(path, content).with_context(|| format!("writing {path:?}"))?;
    println!("  created {}", path.display());
    Ok(())
}
