use dirs;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

/// Retrieves a file path in the user's home directory.
///
/// Returns `None` if the home directory cannot be determined (e.g. no
/// `$HOME` in a minimal/sandboxed environment) — history is best-effort and
/// must never block REPL startup, so the caller treats `None` as "skip
/// history for this session" rather than a fatal condition.
///
/// # Arguments
/// * `filename` - The name of the file to create the path for
///
/// # Examples
/// ```
/// let path = get_home_file(".myapp_history".to_string());
/// ```
pub fn get_home_file(filename: String) -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(filename))
}

/// Appends a line to the history file.
///
/// # Arguments
/// * `line` - The line to append to the history file
/// * `path` - The path to the history file
///
/// # Returns
/// An `io::Result<()>` indicating success or failure of the write operation
///
/// # Errors
/// Returns an `io::Error` if the file cannot be opened or written to
pub fn append_history(line: &str, path: &PathBuf) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", line.trim())?;
    writer.flush()?;
    Ok(())
}

/// Loads the command history from a file.
///
/// # Arguments
/// * `path` - The path to the history file
///
/// # Returns
/// A vector of strings containing the history lines. Returns an empty vector if the file
/// cannot be opened or read.
///
/// # Examples
/// ```
/// if let Some(history_path) = get_home_file(".myapp_history".to_string()) {
///     let history = load_history(&history_path);
/// }
/// ```
pub fn load_history(path: &PathBuf) -> Vec<String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return Vec::new(),
    };

    let reader = BufReader::new(file);
    reader
        .lines()
        .filter_map(|line| {
            line.ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
        .collect()
}

/// Ensures the history file exists, creating it if necessary.
///
/// # Arguments
/// * `path` - The path to the history file
///
/// # Returns
/// An `io::Result<()>` indicating success or failure of the operation
///
/// # Errors
/// Returns an `io::Error` if the file cannot be created
pub fn ensure_history_file(path: &PathBuf) -> io::Result<()> {
    if !path.exists() {
        File::create(path)?;
    }
    Ok(())
}
