//! Terminal rendering of progress, results and reports.
//!
//! Results go to stdout; progress lines go to stderr so `--json` output stays clean.

use pandu_core::{
    filename_for_today, AspectRatioChoice, BatchReport, GeneratedImage, ImageStatus, QueueEvent,
    StudioConfig, StudioSession,
};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub(crate) fn missing_key_message(config: &StudioConfig) -> String {
    format!(
        "Studio Pandu requires a valid API key from Google AI Studio.\n\
         Set {} (or API_KEY), or put `api_key` under [api] in pandu.toml.",
        config.api.api_key_env
    )
}

pub(crate) fn print_ratios(choices: &[AspectRatioChoice], custom_note: &str) {
    for choice in choices {
        println!("{:<8} {}", choice.value, choice.label);
    }
    println!();
    println!("{custom_note}");
}

pub(crate) fn print_event(event: &QueueEvent, prompts: &[String]) {
    match event {
        QueueEvent::Started { total } => eprintln!("Generating {total} image(s)..."),
        QueueEvent::StatusChanged { index, status, .. } => {
            let prompt = prompts.get(*index).map_or("", String::as_str);
            eprintln!(
                "[{}/{}] {:<7} {}",
                index + 1,
                prompts.len(),
                status,
                truncate(prompt, 60)
            );
        }
        QueueEvent::Aborted { reason, .. } => eprintln!("{reason}"),
        QueueEvent::Finished(_) => {}
    }
}

pub(crate) fn print_downloads(paths: &[PathBuf]) {
    for path in paths {
        println!("saved {}", path.display());
    }
}

pub(crate) fn print_summary(session: &StudioSession, report: &BatchReport) {
    println!();
    for (index, image) in session.results().iter().enumerate() {
        let detail = match image.status {
            ImageStatus::Error => image.error.as_deref().unwrap_or("failed"),
            ImageStatus::Pending => "not attempted",
            _ => "",
        };
        println!(
            "{:>3}. {:<7} {} {}",
            index + 1,
            image.status,
            truncate(&image.prompt, 60),
            detail
        );
    }
    println!();
    println!("{}", session.status_line());
    if report.failed > 0 || report.not_attempted > 0 {
        println!(
            "{} failed, {} not attempted",
            report.failed, report.not_attempted
        );
    }
    if let Some(reason) = &report.aborted {
        println!("{reason}");
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    results: Vec<Value>,
    report: &'a BatchReport,
}

/// Print results and report; saved images are listed by `file` instead of inline `image_url`
pub(crate) fn print_json(
    results: &[GeneratedImage],
    report: &BatchReport,
    saved: &[PathBuf],
    dir: &Path,
) -> anyhow::Result<()> {
    println!("{}", json_document(results, report, saved, dir)?);
    Ok(())
}

fn json_document(
    results: &[GeneratedImage],
    report: &BatchReport,
    saved: &[PathBuf],
    dir: &Path,
) -> serde_json::Result<String> {
    let results = results
        .iter()
        .enumerate()
        .map(|(index, image)| json_result(image, saved_file(saved, dir, index)))
        .collect::<serde_json::Result<Vec<_>>>()?;
    serde_json::to_string_pretty(&JsonOutput { results, report })
}

fn json_result(image: &GeneratedImage, file: Option<&Path>) -> serde_json::Result<Value> {
    let mut value = serde_json::to_value(image)?;
    if let (Some(file), Value::Object(fields)) = (file, &mut value) {
        fields.remove("image_url");
        fields.insert("file".to_string(), Value::String(file.display().to_string()));
    }
    Ok(value)
}

fn saved_file<'a>(saved: &'a [PathBuf], dir: &Path, index: usize) -> Option<&'a Path> {
    let expected = dir.join(filename_for_today(index));
    saved.iter().find(|p| **p == expected).map(PathBuf::as_path)
}

fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}
