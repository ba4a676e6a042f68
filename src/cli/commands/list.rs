//! List command - show cookies in the jar

use crate::cli::args::{ListArgs, OutputFormat};
use crate::error::JarResult;
use crate::jar::{Entry, Jar, JarOptions};
use crate::ui::{self, UiContext};
use chrono::{DateTime, Utc};
use console::style;
use serde::Serialize;

/// One listed cookie; values are only included on request
#[derive(Debug, Serialize)]
struct CookieRow {
    domain: String,
    path: String,
    name: String,
    host: String,
    expires: DateTime<Utc>,
    secure: bool,
    http_only: bool,
    persistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

/// Execute the list command
pub fn execute(args: ListArgs, options: JarOptions) -> JarResult<()> {
    let ctx = UiContext::detect();
    let jar = Jar::new(options);
    let report = jar.load()?;
    if matches!(args.format, OutputFormat::Table) {
        super::show_diagnostics(&ctx, &report.diagnostics);
    }
    let now = Utc::now();
    let rows: Vec<CookieRow> = jar
        .entries()
        .iter()
        .filter(|entry| !entry.is_expired(now))
        .map(|entry| row(&jar, entry, args.show_values))
        .collect();

    if rows.is_empty() {
        match args.format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Plain => {}
            OutputFormat::Table => ui::step_info(&ctx, "No cookies in jar"),
        }
        return Ok(());
    }

    match args.format {
        OutputFormat::Table => print_table(&ctx, &rows),
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Plain => print_plain(&rows),
    }

    Ok(())
}

fn row(jar: &Jar, entry: &Entry, show_values: bool) -> CookieRow {
    let value = show_values.then(|| {
        jar.value_of(entry)
            .unwrap_or_else(|e| format!("<undecryptable: {}>", e))
    });
    CookieRow {
        domain: entry.domain.clone(),
        path: entry.path.clone(),
        name: entry.name.clone(),
        host: entry.canonical_host.clone(),
        expires: entry.expires,
        secure: entry.secure,
        http_only: entry.http_only,
        persistent: entry.persistent,
        value,
    }
}

fn print_table(ctx: &UiContext, rows: &[CookieRow]) {
    ui::intro(ctx, "Cookies");

    println!(
        "{:<30} {:<20} {:<24} {:<17} {}",
        style("DOMAIN").bold(),
        style("PATH").bold(),
        style("NAME").bold(),
        style("EXPIRES").bold(),
        style("FLAGS").bold()
    );
    println!("{}", "-".repeat(100));

    for row in rows {
        let mut flags = Vec::new();
        if row.secure {
            flags.push("secure");
        }
        if row.http_only {
            flags.push("httponly");
        }
        let expires = row.expires.format("%Y-%m-%d %H:%M").to_string();

        println!(
            "{:<30} {:<20} {:<24} {:<17} {}",
            row.domain,
            row.path,
            style(&row.name).cyan(),
            expires,
            style(flags.join(",")).dim()
        );
        if let Some(value) = &row.value {
            println!("  {}", style(value).dim());
        }
    }

    println!();
    println!("{} cookie(s)", rows.len());
}

fn print_json(rows: &[CookieRow]) -> JarResult<()> {
    let json = serde_json::to_string_pretty(rows)?;
    println!("{}", json);
    Ok(())
}

fn print_plain(rows: &[CookieRow]) {
    for row in rows {
        match &row.value {
            Some(value) => println!("{}\t{}\t{}\t{}", row.domain, row.path, row.name, value),
            None => println!("{}\t{}\t{}", row.domain, row.path, row.name),
        }
    }
}
