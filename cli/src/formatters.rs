//! Output formatting utilities

use colored::*;
use embedmongo_engine::domain::value_objects::{Feature, FeatureSet, SupervisorState};
use embedmongo_engine::ManagedProcess;
use std::io::Write;
use tabwriter::TabWriter;

/// Format supervisor state with appropriate color
pub fn format_state(state: SupervisorState) -> ColoredString {
    let state_str = state.to_string();
    match state {
        SupervisorState::Running { .. } => state_str.green(),
        SupervisorState::StartFailed => state_str.red(),
        SupervisorState::StoppingGraceful | SupervisorState::StoppingForced => state_str.yellow(),
        SupervisorState::Starting => state_str.cyan(),
        SupervisorState::Stopped => state_str.normal(),
    }
}

fn format_pid(pid: Option<u32>) -> String {
    pid.map_or_else(|| "-".to_string(), |p| p.to_string())
}

/// Feature table for one version
pub fn feature_table(features: &FeatureSet) -> std::io::Result<String> {
    let mut tw = TabWriter::new(vec![]).padding(2);
    writeln!(tw, "FEATURE\tENABLED")?;
    for feature in Feature::ALL {
        let enabled = if features.enabled(feature) {
            "yes".green()
        } else {
            "no".dimmed()
        };
        writeln!(tw, "{}\t{}", feature, enabled)?;
    }
    into_string(tw)
}

/// One row per started process
pub fn process_table(processes: &[(String, ManagedProcess)]) -> std::io::Result<String> {
    let mut tw = TabWriter::new(vec![]).padding(2);
    writeln!(tw, "NAME\tVERSION\tPORT\tPID\tSTATE")?;
    for (name, process) in processes {
        writeln!(
            tw,
            "{}\t{}\t{}\t{}\t{}",
            name,
            process.features().version(),
            process.net().port(),
            format_pid(process.pid().or(process.os_pid())),
            format_state(process.state()),
        )?;
    }
    into_string(tw)
}

fn into_string(tw: TabWriter<Vec<u8>>) -> std::io::Result<String> {
    let bytes = tw
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
