//! Minimal styled terminal output, in the same vein as the teacher
//! CLI's `output` module but trimmed to what this demo binary needs.

pub fn success(msg: impl std::fmt::Display) {
    println!("\u{2713} {msg}");
}

pub fn error(msg: impl std::fmt::Display) {
    eprintln!("\u{2717} {msg}");
}

pub fn label(name: impl std::fmt::Display, value: impl std::fmt::Display) {
    println!("  {name}: {value}");
}

pub fn dim(msg: impl std::fmt::Display) {
    println!("{msg}");
}
