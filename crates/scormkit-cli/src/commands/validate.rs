//! The `scormkit validate` command.

use std::path::PathBuf;

use anyhow::Result;

pub fn execute(session_path: PathBuf) -> Result<()> {
    let scripts = if session_path.is_dir() {
        scormkit_core::script::load_script_directory(&session_path)?
    } else {
        vec![scormkit_core::script::parse_script(&session_path)?]
    };

    let mut total_warnings = 0;

    for script in &scripts {
        println!("Session: {} ({} calls)", script.name, script.calls.len());

        let warnings = scormkit_core::script::validate_script(script);
        for w in &warnings {
            let prefix = w
                .call_index
                .map(|index| format!("  [call {index}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All session scripts valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
