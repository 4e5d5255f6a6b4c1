use freedesktop_desktop_entry::DesktopEntry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::window::WindowInfo;

/// Maps windows to the icon named in their application's desktop entry.
pub struct IconResolver {
    search_dirs: Vec<PathBuf>,
    cache: HashMap<String, Option<String>>, // app_id or class -> icon name
    wm_class_index: Option<HashMap<String, String>>, // lowercased StartupWMClass -> icon name
}

impl IconResolver {
    /// Resolver over the standard XDG application directories
    pub fn new() -> Self {
        let mut search_dirs = Vec::new();
        if let Some(data) = dirs::data_local_dir() {
            search_dirs.push(data.join("applications"));
        }
        search_dirs.push(PathBuf::from("/usr/local/share/applications"));
        search_dirs.push(PathBuf::from("/usr/share/applications"));
        search_dirs.push(PathBuf::from("/var/lib/flatpak/exports/share/applications"));

        Self::with_search_dirs(search_dirs)
    }

    pub fn with_search_dirs(search_dirs: Vec<PathBuf>) -> Self {
        IconResolver {
            search_dirs,
            cache: HashMap::new(),
            wm_class_index: None,
        }
    }

    /// Icon name (or absolute path) for a window, trying its app id first
    /// and its X11 class second.
    pub fn resolve(&mut self, window: &WindowInfo) -> Option<String> {
        [window.app_id.as_deref(), window.window_class.as_deref()]
            .into_iter()
            .flatten()
            .find_map(|id| self.resolve_id(id))
    }

    fn resolve_id(&mut self, id: &str) -> Option<String> {
        if let Some(cached) = self.cache.get(id) {
            return cached.clone();
        }

        let icon = self
            .find_icon_from_desktop_file(id)
            .or_else(|| self.find_icon_by_wm_class(id));
        if icon.is_none() {
            debug!("No desktop entry found for {}", id);
        }

        self.cache.insert(id.to_string(), icon.clone());
        icon
    }

    fn find_icon_from_desktop_file(&self, id: &str) -> Option<String> {
        let file_name = format!("{}.desktop", id);

        // Exact match first: <id>.desktop
        for dir in &self.search_dirs {
            let path = dir.join(&file_name);
            if let Some(icon) = parse_desktop_icon(&path) {
                debug!("Found icon '{}' for '{}' in {}", icon, id, path.display());
                return Some(icon);
            }
        }

        let wanted = file_name.to_lowercase();
        for dir in &self.search_dirs {
            let Ok(entries) = std::fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let matches = path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().to_lowercase() == wanted);
                if matches && let Some(icon) = parse_desktop_icon(&path) {
                    debug!("Found icon '{}' for '{}' (case-insensitive) in {}", icon, id, path.display());
                    return Some(icon);
                }
            }
        }

        None
    }

    fn find_icon_by_wm_class(&mut self, id: &str) -> Option<String> {
        let search_dirs = &self.search_dirs;
        let index = self
            .wm_class_index
            .get_or_insert_with(|| build_wm_class_index(search_dirs));
        index.get(&id.to_lowercase()).cloned()
    }
}

impl Default for IconResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Index every desktop entry declaring a `StartupWMClass` by that class.
fn build_wm_class_index(search_dirs: &[PathBuf]) -> HashMap<String, String> {
    let mut index = HashMap::new();

    // Earlier directories take precedence
    for dir in search_dirs.iter().rev() {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "desktop") {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(&path) else {
                continue;
            };
            let Ok(entry) = DesktopEntry::decode(&path, &content) else {
                continue;
            };
            if let (Some(class), Some(icon)) = (entry.desktop_entry("StartupWMClass"), entry.icon()) {
                index.insert(class.to_lowercase(), icon.to_string());
            }
        }
    }

    debug!("Indexed {} desktop entries by WM class", index.len());
    index
}

fn parse_desktop_icon(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let entry = DesktopEntry::decode(path, &content).ok()?;

    entry.icon().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::make_window;
    use std::fs;

    fn write_entry(dir: &Path, file: &str, icon: &str, wm_class: Option<&str>) {
        let mut content = format!("[Desktop Entry]\nType=Application\nName={}\nExec=true\nIcon={}\n", file, icon);
        if let Some(class) = wm_class {
            content.push_str(&format!("StartupWMClass={}\n", class));
        }
        fs::write(dir.join(file), content).unwrap();
    }

    #[test]
    fn test_resolve_by_app_id() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(dir.path(), "org.example.Editor.desktop", "accessories-text-editor", None);

        let mut resolver = IconResolver::with_search_dirs(vec![dir.path().to_path_buf()]);
        let mut window = make_window(1, "Editor");
        window.app_id = Some("org.example.Editor".to_string());

        assert_eq!(resolver.resolve(&window).as_deref(), Some("accessories-text-editor"));
    }

    #[test]
    fn test_resolve_case_insensitive_file_name() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(dir.path(), "Firefox.desktop", "firefox", None);

        let mut resolver = IconResolver::with_search_dirs(vec![dir.path().to_path_buf()]);
        let mut window = make_window(1, "Browser");
        window.app_id = Some("firefox".to_string());

        assert_eq!(resolver.resolve(&window).as_deref(), Some("firefox"));
    }

    #[test]
    fn test_resolve_by_window_class() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(dir.path(), "com.valvesoftware.Steam.desktop", "steam", Some("Steam"));

        let mut resolver = IconResolver::with_search_dirs(vec![dir.path().to_path_buf()]);
        let mut window = make_window(1, "Steam");
        window.app_id = None;
        window.window_class = Some("steam".to_string());

        assert_eq!(resolver.resolve(&window).as_deref(), Some("steam"));
    }

    #[test]
    fn test_unknown_app_is_cached_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut resolver = IconResolver::with_search_dirs(vec![dir.path().to_path_buf()]);
        let window = make_window(1, "Nothing");

        assert_eq!(resolver.resolve(&window), None);

        // An entry added later is not picked up for an id already looked up
        write_entry(dir.path(), "app-1.desktop", "late", None);
        assert_eq!(resolver.resolve(&window), None);
    }
}
