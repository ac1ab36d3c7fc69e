//! `sq check <branch>`: runs the Merge Detector (C7) once and prints the
//! result. Exit code reflects `merged`.

use anyhow::Context;
use side_quest::detect::{self, DetectOptions};
use side_quest::styling::println;
use side_quest::{discover, env_config, shallow};

pub fn run(branch: &str, target: Option<&str>) -> anyhow::Result<()> {
    let root = discover::current_worktree_root().context("sq check")?;
    let env = env_config::load()?;

    let options = DetectOptions {
        timeout: std::time::Duration::from_millis(env.detection_timeout_ms),
        is_shallow: shallow::is_shallow(&root),
        ..Default::default()
    };

    let result = detect::detect(&root, branch, target, &options, None);
    println!("{}", serde_json::to_string_pretty(&result)?);

    if !result.merged {
        std::process::exit(1);
    }
    Ok(())
}
