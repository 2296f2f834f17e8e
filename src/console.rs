// console.rs - Terminal output for both binaries
// Status prefixes: [*] info, [+] action, [✓] success, [!] warning, [✗] error

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const RULE: &str = "═══════════════════════════════════════════════════════════════";

pub fn print_banner(title: &str, subtitle: &str) {
    println!("{}", RULE.cyan().bold());
    println!("{}", format!("  {}", title).white().bold());
    println!("{}", format!("  {}", subtitle).white());
    println!("{}", format!("{}\n", RULE).cyan().bold());
}

pub fn section(title: &str) {
    println!("\n{}", format!("─── {} ───", title).yellow().bold());
}

pub fn info(msg: &str) {
    println!("{}", format!("[*] {}", msg).cyan());
}

pub fn action(msg: &str) {
    println!("{}", format!("[+] {}", msg).cyan());
}

pub fn success(msg: &str) {
    println!("{}", format!("[✓] {}", msg).green());
}

pub fn warn(msg: &str) {
    println!("{}", format!("[!] {}", msg).yellow());
}

pub fn error(msg: &str) {
    eprintln!("{}", format!("[✗] {}", msg).red().bold());
}

pub fn step(current: usize, total: usize, name: &str) {
    println!(
        "{} {}",
        format!("[{}/{}]", current, total).white().bold(),
        format!("Running {}...", name).cyan()
    );
}

/// Spinner shown while an external stage runs. Draws to stderr and stays
/// hidden when stderr is not a terminal.
pub fn stage_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg} [{elapsed}]") {
        pb.set_style(style);
    }
    pb.set_message(label.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

pub fn boxed(lines: &[String], ok: bool) {
    let top = "╔══════════════════════════════════════════════════════════════════════════════╗";
    let mid = "╠══════════════════════════════════════════════════════════════════════════════╣";
    let bottom = "╚══════════════════════════════════════════════════════════════════════════════╝";
    let paint = |s: &str| if ok { s.green().bold() } else { s.red().bold() };

    println!("{}", paint(top));
    for (i, line) in lines.iter().enumerate() {
        println!("{}", paint(&format!("║  {}", line)));
        if i == 0 && lines.len() > 1 {
            println!("{}", paint(mid));
        }
    }
    println!("{}", paint(bottom));
}
