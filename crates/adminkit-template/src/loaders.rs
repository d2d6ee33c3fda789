//! Template sources.
//!
//! The built-in templates are compiled into the binary. A [`FileSystemLoader`]
//! collects every file below a set of folders, named by its path relative to
//! the folder with `/` separators.

use std::path::{Path, PathBuf};

use adminkit_core::{AdminError, AdminResult};

macro_rules! builtin {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../templates/", $name)))),*]
    };
}

/// The templates shipped with the crate, as `(name, source)` pairs.
pub const BUILTIN_TEMPLATES: &[(&str, &str)] = builtin![
    "layout.html",
    "index.html",
    "list.html",
    "create.html",
    "update.html",
    "init.html",
    "providers/login/login.html",
    "providers/login/renew_password.html",
    "errors/error.html",
    "errors/401.html",
    "errors/403.html",
    "errors/404.html",
    "errors/500.html",
    "widgets/displays/boolean.html",
    "widgets/displays/image.html",
    "widgets/displays/json.html",
    "widgets/inputs/input.html",
    "widgets/inputs/select.html",
    "widgets/inputs/many_to_many.html",
    "widgets/inputs/json.html",
    "widgets/inputs/textarea.html",
    "widgets/inputs/editor.html",
    "widgets/inputs/datetime.html",
    "widgets/inputs/image.html",
    "widgets/inputs/radio.html",
    "widgets/inputs/switch.html",
    "widgets/inputs/color.html",
    "widgets/filters/search.html",
    "widgets/filters/datetime.html",
    "widgets/filters/select.html",
];

/// Loads templates from folders on disk.
#[derive(Debug, Clone, Default)]
pub struct FileSystemLoader {
    dirs: Vec<PathBuf>,
}

impl FileSystemLoader {
    /// Searches the given folders, later folders overriding earlier ones.
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// The configured folders.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Reads every template below every folder.
    pub fn load_all(&self) -> AdminResult<Vec<(String, String)>> {
        let mut templates = Vec::new();
        for dir in &self.dirs {
            if !dir.is_dir() {
                return Err(AdminError::Configuration(format!(
                    "Template folder '{}' does not exist",
                    dir.display()
                )));
            }
            collect(dir, dir, &mut templates)?;
        }
        Ok(templates)
    }
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<(String, String)>) -> AdminResult<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect(root, &path, out)?;
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let source = std::fs::read_to_string(&path).map_err(|e| {
            AdminError::Template(format!("Error reading template '{}': {e}", path.display()))
        })?;
        out.push((name, source));
    }
    Ok(())
}
