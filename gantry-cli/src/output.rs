// Output formatting helpers for CLI commands

/// Print a status line: "   Action message"
pub fn status(action: &str, message: &str) {
    eprintln!("\x1b[1;36m{:>10}\x1b[0m {}", action, message);
}

/// Print a passed check
pub fn check(message: &str) {
    eprintln!("\x1b[32m  \u{2713}\x1b[0m {}", message);
}

/// Print a warning
pub fn warning(message: &str) {
    eprintln!("\x1b[1;33mwarning:\x1b[0m {}", message);
}

/// Print an error
pub fn error(message: &str) {
    eprintln!("\x1b[1;31merror:\x1b[0m {}", message);
}

/// Print a dim detail line
pub fn detail(message: &str) {
    eprintln!("\x1b[2m    {}\x1b[0m", message);
}

/// Print a section header
pub fn header(message: &str) {
    eprintln!("\x1b[1m==> {}\x1b[0m", message);
}
