//! Startup self-check, verifying each component before the daemon runs.

use nocturne_agent::ClaudeCli;
use nocturne_core::config::Config;
use nocturne_core::schedule::{cron_field, last_wakeup_label, minute_pattern, ordinary_hours};
use std::path::Path;

/// Result of a single check.
struct CheckResult {
    name: String,
    detail: String,
    ok: bool,
}

/// Run all checks against the loaded config. Returns true if all passed.
pub async fn run(config: &Config) -> bool {
    let mut results = Vec::new();

    // 1. Schedule summary.
    results.push(check_schedule(config));

    // 2. Agent CLI check.
    results.push(check_agent(config).await);

    // 3. Prompt template checks.
    results.push(check_template(
        "Opening prompt",
        &config.paths.opening_prompt_file,
    ));
    results.push(check_template(
        "Closing prompt",
        &config.paths.closing_prompt_file,
    ));

    // 4. Env file check.
    results.push(check_env_file(config));

    // 5. Journal directory check.
    results.push(check_journal_dir(config));

    // Print results.
    println!("\nNocturne Self-Check");
    println!("===================");
    let mut all_ok = true;
    for r in &results {
        let icon = if r.ok { "+" } else { "x" };
        println!("  {icon} {} — {}", r.name, r.detail);
        if !r.ok {
            all_ok = false;
        }
    }
    println!();

    all_ok
}

fn check_schedule(config: &Config) -> CheckResult {
    let schedule = &config.schedule;
    let hours = ordinary_hours(schedule.night_start, schedule.night_end);
    let minutes = minute_pattern(schedule.interval_minutes);
    CheckResult {
        name: "Schedule".to_string(),
        detail: format!(
            "hours {} | minutes {} | closing {}",
            cron_field(&hours),
            cron_field(&minutes),
            last_wakeup_label(schedule.night_end)
        ),
        ok: true,
    }
}

async fn check_agent(config: &Config) -> CheckResult {
    let agent = ClaudeCli::new(
        config.paths.claude_path.clone(),
        config.paths.working_dir.clone(),
    );
    let available = agent.check_cli().await;
    CheckResult {
        name: "Agent".to_string(),
        detail: if available {
            format!("{} (available)", config.paths.claude_path)
        } else {
            format!(
                "{} (NOT FOUND — install the claude CLI)",
                config.paths.claude_path
            )
        },
        ok: available,
    }
}

fn check_template(name: &str, path: &Path) -> CheckResult {
    let detail = if path.is_file() {
        path.display().to_string()
    } else {
        format!("{} missing (fallback text will be used)", path.display())
    };
    CheckResult {
        name: name.to_string(),
        detail,
        ok: true,
    }
}

fn check_env_file(config: &Config) -> CheckResult {
    let path = &config.paths.env_file;
    let detail = if path.is_file() {
        path.display().to_string()
    } else {
        format!("{} missing (agent may lack API keys)", path.display())
    };
    CheckResult {
        name: "Env file".to_string(),
        detail,
        ok: true,
    }
}

fn check_journal_dir(config: &Config) -> CheckResult {
    let dir = &config.paths.journal_dir;
    // Prove the directory is writable, not merely present.
    let probe = dir.join(".nocturne-check");
    let outcome = std::fs::create_dir_all(dir)
        .and_then(|_| std::fs::write(&probe, b"ok"))
        .and_then(|_| std::fs::remove_file(&probe));
    match outcome {
        Ok(()) => CheckResult {
            name: "Journal dir".to_string(),
            detail: format!("{} (writable)", dir.display()),
            ok: true,
        },
        Err(e) => CheckResult {
            name: "Journal dir".to_string(),
            detail: format!("FAILED: {e}"),
            ok: false,
        },
    }
}
