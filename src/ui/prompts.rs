// Thin wrappers over dialoguer, indicatif, rfd and crossterm so the
// workflows read as a list of questions rather than widget setup.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::config::Config;

pub fn clear_screen() -> Result<()> {
    execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))?;
    Ok(())
}

/// Spinner shown while a listing or a batch of calls is in flight. Call
/// `finish_and_clear` when done.
pub fn spinner(message: &str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// Keyboard-driven single choice; returns the index picked.
pub fn select<T: ToString>(prompt: &str, items: &[T]) -> Result<usize> {
    let picked = Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact()?;
    debug!(prompt, picked, "selected");
    Ok(picked)
}

/// Multiple choice that insists on at least one pick (space to tick,
/// enter to confirm).
pub fn select_at_least_one<T: ToString>(prompt: &str, items: &[T]) -> Result<Vec<usize>> {
    loop {
        let picked = MultiSelect::new().with_prompt(prompt).items(items).interact()?;
        if !picked.is_empty() {
            debug!(prompt, count = picked.len(), "selected");
            return Ok(picked);
        }
        println!("Select at least one item (space to tick, enter to confirm).");
    }
}

/// On/off options; returns one flag per option, in order.
pub fn toggles(prompt: &str, options: &[&str]) -> Result<Vec<bool>> {
    let picked = MultiSelect::new().with_prompt(prompt).items(options).interact()?;
    let flags: Vec<bool> = (0..options.len()).map(|i| picked.contains(&i)).collect();
    debug!(prompt, ?flags, "options chosen");
    Ok(flags)
}

pub fn confirm(prompt: &str, default: bool) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(default).interact()?)
}

pub fn text(prompt: &str) -> io::Result<String> {
    Input::<String>::new().with_prompt(prompt).interact_text()
}

pub fn password(prompt: &str) -> io::Result<String> {
    Password::new().with_prompt(prompt).interact()
}

pub fn pause() -> Result<()> {
    Input::<String>::new()
        .with_prompt("Press enter to continue")
        .allow_empty(true)
        .interact_text()?;
    Ok(())
}

/// Let the operator pick files with extension `ext`. Uses the native file
/// dialog unless `file_dialog` is off in the config, in which case paths
/// are typed in comma-separated.
pub fn pick_files(config: &Config, title: &str, ext: &str, initial_dir: &Path) -> Result<Vec<PathBuf>> {
    if config.file_dialog {
        println!("Please select {} file(s) from the file dialog...", ext);
        let picked = rfd::FileDialog::new()
            .set_title(title)
            .add_filter(&format!("{} files", ext), &[ext])
            .set_directory(initial_dir)
            .pick_files()
            .unwrap_or_default();
        return Ok(picked);
    }

    let raw = Input::<String>::new()
        .with_prompt(format!("{} (comma-separated .{} paths)", title, ext))
        .allow_empty(true)
        .interact_text()?;
    Ok(split_paths(&raw, initial_dir))
}

/// Relative paths are resolved against `base`. Blank entries are dropped.
fn split_paths(raw: &str, base: &Path) -> Vec<PathBuf> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let path = PathBuf::from(p);
            if path.is_absolute() {
                path
            } else {
                base.join(path)
            }
        })
        .inspect(|p| {
            if !p.exists() {
                warn!(path = %p.display(), "selected path does not exist");
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_paths_are_split_and_resolved() {
        let base = Path::new("/exports");
        let paths = split_paths(" a.zip, ,/abs/b.zip,", base);
        assert_eq!(paths, vec![PathBuf::from("/exports/a.zip"), PathBuf::from("/abs/b.zip")]);
    }

    #[test]
    fn blank_input_selects_nothing() {
        assert!(split_paths("   ", Path::new(".")).is_empty());
    }
}
