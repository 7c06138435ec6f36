use clap::{Arg, ArgMatches, Command};
use lead_capture::config::Config;
use lead_capture::controller::{LeadForm, SubmitAttempt};
use lead_capture::lead::{FieldKind, LeadField, LeadRecord, ProjectsPerMonth};
use lead_capture::pipeline::{FailureReason, SubmissionOutcome, SubmissionPipeline};
use log::LevelFilter;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process;
use std::str::FromStr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let matches = Command::new("lead-capture")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Capture roofing-platform signup leads and deliver them through a fallback chain")
        .long_about("Lead Capture - validates signup form leads and delivers them:\n\
                    • Primary: templated email-relay API (when credentials are configured)\n\
                    • Secondary: JSON webhook endpoint\n\
                    • Last resort: local JSON lead store")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path (.toml, .yaml or .yml)")
                .default_value("lead-capture.toml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and show the active delivery chain")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("lead-file")
                .long("lead-file")
                .value_name("FILE")
                .help("Submit a lead from a JSON file instead of prompting")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("list-stored")
                .long("list-stored")
                .help("List leads kept in the local fallback store")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("lead-capture.toml");
    let config_found = Path::new(config_path).exists();

    let config = match load_config(config_path, config_found) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    init_logging(&matches, &config);
    if !config_found {
        log::warn!("Configuration file '{config_path}' not found, using default configuration");
    }

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    if matches.get_flag("test-config") {
        test_config(&config);
        return;
    }

    let pipeline = Arc::new(SubmissionPipeline::from_config(&config));

    if matches.get_flag("list-stored") {
        list_stored(&pipeline);
        return;
    }

    let lead = if let Some(lead_file) = matches.get_one::<String>("lead-file") {
        match read_lead_file(lead_file) {
            Ok(lead) => Some(lead),
            Err(e) => {
                eprintln!("❌ {e:#}");
                process::exit(1);
            }
        }
    } else {
        None
    };

    let mut form = LeadForm::from_config(&config, pipeline);
    match lead {
        Some(lead) => {
            for field in LeadField::ALL {
                form.input(field, lead.get(field));
            }
        }
        None => {
            if !prompt_fields(&mut form) {
                println!();
                println!("Input closed, nothing submitted.");
                return;
            }
        }
    }

    println!();
    println!("⏳ Submitting...");
    let attempt = form.submit().await;
    if !report_attempt(&attempt) {
        process::exit(1);
    }
}

fn init_logging(matches: &ArgMatches, config: &Config) {
    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        config
            .logging
            .as_ref()
            .and_then(|l| LevelFilter::from_str(&l.level).ok())
            .unwrap_or(LevelFilter::Info)
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();
}

fn load_config(path: &str, exists: bool) -> anyhow::Result<Config> {
    if exists {
        Config::from_file(path)
    } else {
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    match Config::template().to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Fill in the [relay] credentials to enable the email relay.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e:#}");
            process::exit(1);
        }
    }
}

fn test_config(config: &Config) {
    println!("🔍 Testing configuration...");
    println!();

    if let Err(e) = config.check() {
        println!("❌ Configuration validation failed:");
        println!("Error: {e:#}");
        process::exit(1);
    }

    match (&config.relay, config.active_relay()) {
        (_, Some(relay)) => println!("  ✅ Email relay: {} -> {}", relay.api_url, relay.to_email),
        (Some(_), None) => println!("  ⚠️  Email relay: placeholder credentials, skipped"),
        (None, None) => println!("  ➖ Email relay: not configured"),
    }
    if config.webhook.enabled {
        println!("  ✅ Webhook: {}", config.webhook.url);
    } else {
        println!("  ➖ Webhook: disabled");
    }
    println!(
        "  💾 Local store: {}/{}.json",
        config.storage.directory, config.storage.namespace
    );

    let optional: Vec<&str> = config.form.optional_fields.iter().map(|f| f.as_str()).collect();
    if !optional.is_empty() {
        println!("  Optional fields: {}", optional.join(", "));
    }
    println!();
    println!("✅ Configuration is valid");
}

fn list_stored(pipeline: &SubmissionPipeline) {
    let leads = match pipeline.store().load() {
        Ok(leads) => leads,
        Err(e) => {
            eprintln!("❌ Failed to read local lead store: {e}");
            process::exit(1);
        }
    };

    if leads.is_empty() {
        println!("📭 No leads stored locally");
        return;
    }

    println!("📋 Locally stored leads ({} total):", leads.len());
    println!("═══════════════════════════════════════");
    for entry in &leads {
        println!(
            "  • {} <{}> {} | {} | {} projects/month | {}",
            entry.lead.full_name(),
            entry.lead.email,
            entry.lead.phone,
            truncate_string(&entry.lead.company, 30),
            entry.lead.projects_per_month,
            entry.submitted_at
        );
    }
}

fn read_lead_file(path: &str) -> anyhow::Result<LeadRecord> {
    use anyhow::Context;

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read lead file: {path}"))?;
    let lead = serde_json::from_str(&content)
        .with_context(|| format!("Lead file is not a valid lead record: {path}"))?;
    Ok(lead)
}

/// Prompt for each field until it validates. Returns false on end of input.
fn prompt_fields(form: &mut LeadForm) -> bool {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    println!("🏠 Start your 14-day free trial");
    println!();

    for field in LeadField::ALL {
        if field.kind() == FieldKind::Choice {
            let options: Vec<String> = ProjectsPerMonth::ALL
                .iter()
                .map(|b| b.as_str().to_string())
                .collect();
            println!("  Options: {}", options.join(", "));
        }

        loop {
            let required = if form.state().schema().is_required(field) {
                ""
            } else {
                " (optional)"
            };
            print!("{}{}: ", field.label(), required);
            flush_prompt(&mut io::stdout());

            let line = match lines.next() {
                Some(Ok(line)) => line,
                _ => return false,
            };
            form.input(field, line.trim());

            let result = form.blur(field);
            if result.valid {
                break;
            }
            println!("  ✗ {}", result.message.unwrap_or_default());
        }
    }
    true
}

/// Push a pending prompt out; a broken terminal is logged, not fatal.
fn flush_prompt(out: &mut impl Write) -> bool {
    match out.flush() {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Failed to flush prompt: {e}");
            false
        }
    }
}

/// Print the banner for an attempt. Returns whether it counts as success.
fn report_attempt(attempt: &SubmitAttempt) -> bool {
    match attempt {
        SubmitAttempt::Rejected(errors) => {
            println!("❌ Please fix the highlighted fields:");
            for (field, message) in errors {
                println!("  • {}: {}", field.label(), message);
            }
            false
        }
        SubmitAttempt::Busy => {
            println!("⏳ A submission is already in progress");
            false
        }
        SubmitAttempt::Completed(outcome) => {
            match outcome {
                SubmissionOutcome::Delivered => {
                    println!("✅ Success! We'll be in touch soon.")
                }
                SubmissionOutcome::DeliveredFallback => {
                    println!("✅ Success! We'll be in touch soon. (sent via webhook)")
                }
                SubmissionOutcome::StoredLocally => {
                    println!("✅ Success! We'll be in touch soon.");
                    println!("⚠️  No delivery service accepted the lead; it was saved locally.");
                    println!("   Run with --list-stored to review pending leads.");
                }
                SubmissionOutcome::Failed(FailureReason::Rejected(errors)) => {
                    println!("❌ Lead rejected:");
                    for (field, message) in errors {
                        println!("  • {}: {}", field.label(), message);
                    }
                }
                SubmissionOutcome::Failed(FailureReason::Terminal(reason)) => {
                    println!("❌ Something went wrong. Please try again.");
                    println!("   {reason}");
                }
            }
            outcome.is_success()
        }
    }
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
