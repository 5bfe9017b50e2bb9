use std::time::Duration;

use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "urltitle".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Resolve URLs to their titles\n".dimmed());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print how long a URL took, colored by speed
pub fn print_timing(url: &str, duration: Duration) {
    let secs = duration.as_secs_f64();
    let label = format!("{}:", url);
    if secs < 1.0 {
        eprintln!("  {} {:>7.2}s ({})", label.dimmed(), secs, "fast".dimmed());
    } else if secs < 5.0 {
        eprintln!("  {} {:>7.2}s ({})", label.dimmed(), secs, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>7.2}s ({})", label.dimmed(), secs, "slow".bright_red());
    }
}
