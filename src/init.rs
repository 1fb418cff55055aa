//! Init wizard, an interactive 2-minute setup for new installs.

use nocturne_core::config::{expand_tilde, Config, ScheduleConfig};
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Starter text for the opening prompt template.
const OPENING_STARTER: &str = "The night is yours until morning. Wander where your thoughts go: \
read, write, tend the projects nobody assigned you. Leave notes for the morning if anything \
feels worth keeping.\n";

/// Starter text for the closing prompt template.
const CLOSING_STARTER: &str = "The night is closing. Gather anything worth keeping into a few \
lines for the morning, then let it go and rest.\n";

/// Run the interactive init wizard.
pub fn run() -> anyhow::Result<()> {
    println!();
    println!("  Nocturne — Setup Wizard");
    println!("  =======================");
    println!();

    // 1. Create the data directory.
    let data_dir = expand_tilde(Path::new("~/.nocturne"));
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        println!("  Created {}", data_dir.display());
    } else {
        println!("  {} already exists", data_dir.display());
    }

    // 2. Check the claude CLI.
    print!("  Checking claude CLI... ");
    io::stdout().flush()?;
    let claude_ok = std::process::Command::new("claude")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);

    if claude_ok {
        println!("found");
    } else {
        println!("NOT FOUND");
        println!();
        println!("  Install the claude CLI first:");
        println!("    npm install -g @anthropic-ai/claude-code");
        println!();
        println!("  Then run 'nocturne init' again.");
        return Ok(());
    }

    // 3. Schedule.
    println!();
    println!("  Night Schedule");
    println!("  --------------");
    println!("  Hours are 0-23. The window may cross midnight.");
    println!();
    let night_start = prompt_number("  Window opens at hour [22]: ", 22)?;
    let night_end = prompt_number("  Window closes at hour [5]: ", 5)?;
    let interval_minutes = prompt_number("  Minutes between wakeups [20]: ", 20)?;

    let schedule = ScheduleConfig {
        night_start,
        night_end,
        interval_minutes,
    };
    if let Err(e) = schedule.validate() {
        println!();
        println!("  Invalid schedule: {e}");
        println!("  Run 'nocturne init' again.");
        return Ok(());
    }

    // 4. Agent working directory.
    println!();
    let working_dir = {
        let entered = prompt("  Agent working directory [~]: ")?;
        if entered.is_empty() {
            "~".to_string()
        } else {
            entered
        }
    };

    // 5. Generate nocturne.toml.
    let config_path = Config::default_path();
    if config_path.exists() {
        println!();
        println!(
            "  {} already exists — skipping generation.",
            config_path.display()
        );
        println!("  Delete it and run 'nocturne init' again to regenerate.");
    } else {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let config = format!(
            r#"[schedule]
night_start = {night_start}
night_end = {night_end}
interval_minutes = {interval_minutes}

[paths]
working_dir = "{working_dir}"
log_file = "~/.nocturne/nocturne.log"
journal_dir = "~/.nocturne/nights"
opening_prompt_file = "~/.nocturne/night_begins.md"
closing_prompt_file = "~/.nocturne/night_ends.md"
env_file = "~/.nocturne/.env"
claude_path = "claude"
"#
        );

        std::fs::write(&config_path, config)?;
        println!();
        println!("  Generated {}", config_path.display());
    }

    // 6. Starter prompt templates, only where none exist.
    write_if_absent(&data_dir.join("night_begins.md"), OPENING_STARTER)?;
    write_if_absent(&data_dir.join("night_ends.md"), CLOSING_STARTER)?;

    // 7. Summary and next steps.
    println!();
    println!("  Setup Complete");
    println!("  ==============");
    println!();
    println!("  Next steps:");
    println!("    1. Review {}", config_path.display());
    println!("    2. Edit the prompt templates in {}", data_dir.display());
    println!("    3. Run: nocturne check");
    println!("    4. Run: nocturne start");
    println!();

    Ok(())
}

fn write_if_absent(path: &Path, contents: &str) -> anyhow::Result<()> {
    if !path.exists() {
        std::fs::write(path, contents)?;
        println!("  Created {}", path.display());
    }
    Ok(())
}

/// Read a line from stdin with a prompt.
fn prompt(msg: &str) -> anyhow::Result<String> {
    print!("{msg}");
    io::stdout().flush()?;
    let stdin = io::stdin();
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Read a number from stdin, falling back to the default on blank or
/// unparseable input.
fn prompt_number(msg: &str, default: u32) -> anyhow::Result<u32> {
    let line = prompt(msg)?;
    if line.is_empty() {
        return Ok(default);
    }
    match line.parse() {
        Ok(n) => Ok(n),
        Err(_) => {
            println!("  Using default {default}.");
            Ok(default)
        }
    }
}
