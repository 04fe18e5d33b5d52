//! Interactive picker for a long-format panel CSV.
//!
//! Used when `--source csv` is given without `--input`: list the `*.csv`
//! files under the working directory and let the user choose one.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Default directory recursion depth for finding CSV files.
const DEFAULT_SEARCH_DEPTH: usize = 4;

/// Prompt on stdin for a panel CSV from the current directory tree.
///
/// Accepts a number from the list or an explicit path; `q` cancels.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let files = discover_csv_files(Path::new("."));
    if files.is_empty() {
        return Err(AppError::new(
            2,
            "No .csv files found. Provide one with `--input <panel.csv>`.",
        ));
    }

    println!("Found {} panel CSV candidate(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(path));
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Select a file (1-{}), type a path, or q to quit: ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::new(2, format!("Failed to write prompt: {e}")))?;

        let Some(line) = lines.next() else {
            return Err(AppError::new(
                2,
                "No input received. Provide a CSV path with `--input <panel.csv>`.",
            ));
        };
        let line = line.map_err(|e| AppError::new(2, format!("Failed to read input: {e}")))?;

        match resolve_choice(line.trim(), &files) {
            Ok(Some(path)) => return Ok(path),
            Ok(None) => return Err(AppError::new(2, "Canceled.")),
            Err(err) => println!("{err}"),
        }
    }
}

/// Interpret one line of picker input. `Ok(None)` means the user quit.
fn resolve_choice(input: &str, files: &[PathBuf]) -> Result<Option<PathBuf>, AppError> {
    if input.eq_ignore_ascii_case("q") {
        return Ok(None);
    }
    if let Ok(choice) = input.parse::<usize>() {
        return match files.get(choice.wrapping_sub(1)) {
            Some(path) => validate_csv_path(path).map(Some),
            None => Err(AppError::new(
                2,
                format!("Invalid choice: {choice}. Enter a number between 1 and {}.", files.len()),
            )),
        };
    }
    validate_csv_path(Path::new(input)).map(Some)
}

/// Validate the provided path points to a `.csv` file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::new(
            2,
            format!("CSV file not found: {}", path.display()),
        ));
    }
    if path.is_dir() {
        return Err(AppError::new(
            2,
            format!("Expected a file, got a directory: {}", path.display()),
        ));
    }
    if !has_csv_extension(path) {
        return Err(AppError::new(
            2,
            format!("Expected a .csv file (got: {}).", path.display()),
        ));
    }
    Ok(path.to_path_buf())
}

/// `*.csv` files under `root`, sorted for a stable listing.
pub fn discover_csv_files(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk(root, 0, DEFAULT_SEARCH_DEPTH, &mut out);
    out.sort_by_key(|p| pretty_path(p));
    out
}

fn walk(dir: &Path, depth: usize, max_depth: usize, out: &mut Vec<PathBuf>) {
    if depth > max_depth {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if !should_skip_dir(&path) {
                walk(&path, depth + 1, max_depth, out);
            }
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn should_skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    matches!(name, ".git" | "target" | "node_modules" | "debug")
}

fn pretty_path(path: &Path) -> String {
    let stripped = path.strip_prefix("./").unwrap_or(path);
    stripped.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("fiscal_picker_{tag}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::create_dir_all(dir.join("target")).unwrap();
        dir
    }

    #[test]
    fn discovers_csv_files_and_skips_build_dirs() {
        let dir = scratch_dir("discover");
        fs::write(dir.join("b.csv"), "x").unwrap();
        fs::write(dir.join("nested").join("a.CSV"), "x").unwrap();
        fs::write(dir.join("target").join("skip.csv"), "x").unwrap();
        fs::write(dir.join("notes.txt"), "x").unwrap();

        let found = discover_csv_files(&dir);
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"b.csv".to_string()));
        assert!(names.contains(&"a.CSV".to_string()));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn resolve_choice_handles_numbers_quit_and_bad_input() {
        let dir = scratch_dir("choice");
        let file = dir.join("panel.csv");
        fs::write(&file, "x").unwrap();
        let files = vec![file.clone()];

        assert_eq!(resolve_choice("1", &files).unwrap(), Some(file.clone()));
        assert_eq!(resolve_choice("Q", &files).unwrap(), None);
        assert!(resolve_choice("0", &files).is_err());
        assert!(resolve_choice("2", &files).is_err());
        assert!(resolve_choice(dir.join("notes.txt").to_str().unwrap(), &files).is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
