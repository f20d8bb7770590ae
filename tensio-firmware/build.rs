//! Build script for tensio-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates training.toml at compile time

use std::collections::BTreeSet;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn main() {
    setup_linker();
    validate_definitions();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate training.toml at compile time
fn validate_definitions() {
    println!("cargo:rerun-if-changed=training.toml");

    let path = Path::new("training.toml");

    if !path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: training.toml not found!                                 ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a default set of training definitions.      ║\n\
            ║  Please create training.toml in the tensio-firmware directory.   ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read training.toml                             ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let definitions: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in training.toml                     ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    if definitions.get("timer").is_none() && definitions.get("workout").is_none() {
        errors.push("No [timer.*] or [workout.*] section - nothing to run".to_string());
    }
    validate_run(&definitions, &mut errors);
    validate_timers(&definitions, &mut errors);
    validate_workouts(&definitions, &mut errors);
    report("Invalid training definitions", &errors);

    println!("cargo:warning=training.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with every collected error in one box
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Read a positive integer field, recording an error when it is not one
fn positive(
    table: &toml::Table,
    key: &str,
    context: &str,
    required: bool,
    errors: &mut Vec<String>,
) {
    match table.get(key) {
        Some(toml::Value::Integer(v)) if *v > 0 => {}
        Some(_) => errors.push(format!("{} '{}' must be a positive integer", context, key)),
        None if required => errors.push(format!("{} missing '{}'", context, key)),
        None => {}
    }
}

/// Validate the [run] section
fn validate_run(definitions: &toml::Value, errors: &mut Vec<String>) {
    let Some(run) = definitions.get("run").and_then(|r| r.as_table()) else {
        return;
    };

    positive(run, "sample_period_ms", "[run]", false, errors);
    if let Some(toml::Value::Integer(pre_roll)) = run.get("pre_roll") {
        if !(0..=9).contains(pre_roll) {
            errors.push("[run] pre_roll must be 0-9".to_string());
        }
    }
    match run.get("body_weight") {
        Some(toml::Value::Float(w)) if *w < 0.0 => {
            errors.push("[run] body_weight cannot be negative".to_string());
        }
        Some(toml::Value::Integer(w)) if *w < 0 => {
            errors.push("[run] body_weight cannot be negative".to_string());
        }
        _ => {}
    }
}

/// Validate nested timers
fn validate_timers(definitions: &toml::Value, errors: &mut Vec<String>) {
    let timers = match definitions.get("timer") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    for (name, timer) in timers {
        let steps = match timer.get("step") {
            Some(toml::Value::Table(steps)) if !steps.is_empty() => steps,
            _ => {
                errors.push(format!("[timer.{}] needs at least one step", name));
                continue;
            }
        };

        for (step_name, step) in steps {
            let context = format!("[timer.{}.step.{}]", name, step_name);
            let Some(step) = step.as_table() else {
                errors.push(format!("{} must be a table", context));
                continue;
            };
            positive(step, "repetition", &context, false, errors);

            match step.get("exercises") {
                Some(toml::Value::Array(exercises)) if !exercises.is_empty() => {
                    for (i, exercise) in exercises.iter().enumerate() {
                        let context = format!("{} exercise {}", context, i);
                        let Some(exercise) = exercise.as_table() else {
                            errors.push(format!("{} must be a table", context));
                            continue;
                        };
                        if !matches!(exercise.get("name"), Some(toml::Value::String(_))) {
                            errors.push(format!("{} missing 'name'", context));
                        }
                        positive(exercise, "duration", &context, true, errors);
                        positive(exercise, "repetition", &context, false, errors);
                    }
                }
                _ => errors.push(format!("{} needs at least one exercise", context)),
            }
        }
    }
}

/// Validate flat workouts
fn validate_workouts(definitions: &toml::Value, errors: &mut Vec<String>) {
    let workouts = match definitions.get("workout") {
        Some(toml::Value::Table(t)) => t,
        _ => return,
    };

    for (name, workout) in workouts {
        let context = format!("[workout.{}]", name);
        let sequences = match workout.get("sequences") {
            Some(toml::Value::Array(sequences)) if !sequences.is_empty() => sequences,
            _ => {
                errors.push(format!("{} needs at least one sequence", context));
                continue;
            }
        };

        let mut orders = BTreeSet::new();
        for (i, sequence) in sequences.iter().enumerate() {
            let context = format!("{} sequence {}", context, i);
            let Some(sequence) = sequence.as_table() else {
                errors.push(format!("{} must be a table", context));
                continue;
            };
            positive(sequence, "duration", &context, true, errors);

            if let Some(toml::Value::Integer(order)) = sequence.get("order") {
                if !orders.insert(*order) {
                    errors.push(format!("{} repeats order {}", context, order));
                }
            }
            if let Some(toml::Value::String(kind)) = sequence.get("kind") {
                if !["effort", "rest"].contains(&kind.to_lowercase().as_str()) {
                    errors.push(format!("{} kind must be 'effort' or 'rest'", context));
                }
            }
        }
    }
}
