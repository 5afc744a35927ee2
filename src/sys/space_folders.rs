//! A folder per desktop under `~/Spaces`, named after the desktop.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, bail};
use tracing::{debug, warn};

pub const SPACES_DIR: &str = "Spaces";

pub fn spaces_root() -> PathBuf { dirs::home_dir().unwrap_or_default().join(SPACES_DIR) }

/// Finder shows `:` in a file name as `/`, so a desktop called `Mail/Chat`
/// gets a folder that reads the same.
pub fn folder_name(desktop_name: &str) -> String { desktop_name.replace('/', ":") }

fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => bail!("{} exists and is not a folder", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            fs::create_dir(path).with_context(|| format!("creating {}", path.display()))?;
            debug!(path = %path.display(), "created folder");
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("inspecting {}", path.display())),
    }
}

/// Creates `root` and the folder for `desktop_name` inside it when missing,
/// returning the desktop's folder. Only `root` itself is created, never its
/// parents.
pub fn ensure_space_folder(root: &Path, desktop_name: &str) -> anyhow::Result<PathBuf> {
    let name = folder_name(desktop_name);
    if name.trim().is_empty() || name == "." || name == ".." {
        bail!("desktop name {desktop_name:?} cannot be used as a folder name");
    }
    ensure_dir(root)?;
    let folder = root.join(name);
    ensure_dir(&folder)?;
    Ok(folder)
}

/// Shows a folder to the user. Fire-and-forget like the switch actuator.
pub trait FolderOpener: Send {
    fn open(&mut self, path: &Path);
}

/// Brings Finder forward with the folder open.
pub struct FinderOpener;

impl FolderOpener for FinderOpener {
    fn open(&mut self, path: &Path) {
        let script = finder_script(path);
        debug!(%script, "opening desktop folder");

        let spawned = std::thread::Builder::new().name("finder".to_string()).spawn(move || {
            match Command::new("/usr/bin/osascript").arg("-e").arg(&script).output() {
                Ok(output) if output.status.success() => {}
                Ok(output) => warn!(
                    status = ?output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "Finder could not open desktop folder"
                ),
                Err(e) => warn!("failed to run osascript: {e}"),
            }
        });
        if let Err(e) = spawned {
            warn!("failed to spawn finder thread: {e}");
        }
    }
}

pub fn finder_script(path: &Path) -> String {
    let quoted = path.display().to_string().replace('\\', "\\\\").replace('"', "\\\"");
    format!("tell application \"Finder\"\n\tactivate\n\topen (\"{quoted}\" as POSIX file)\nend tell")
}

/// The folder root plus how folders get shown.
pub struct SpaceFolders {
    root: PathBuf,
    opener: Box<dyn FolderOpener>,
}

impl SpaceFolders {
    pub fn new(root: impl Into<PathBuf>, opener: Box<dyn FolderOpener>) -> Self {
        Self { root: root.into(), opener }
    }

    pub fn in_home() -> Self { Self::new(spaces_root(), Box::new(FinderOpener)) }

    pub fn root(&self) -> &Path { &self.root }

    /// Makes sure the folder for `desktop_name` exists and opens it.
    pub fn open(&mut self, desktop_name: &str) -> anyhow::Result<PathBuf> {
        let folder = ensure_space_folder(&self.root, desktop_name)?;
        self.opener.open(&folder);
        Ok(folder)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<PathBuf>>>);

    impl FolderOpener for Recorder {
        fn open(&mut self, path: &Path) { self.0.lock().push(path.to_path_buf()); }
    }

    #[test]
    fn slashes_become_colons() {
        assert_eq!("Mail:Chat", folder_name("Mail/Chat"));
        assert_eq!("a:b:c", folder_name("a/b/c"));
        assert_eq!("Desktop 1", folder_name("Desktop 1"));
    }

    #[test]
    fn creates_root_and_desktop_folder_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(SPACES_DIR);

        let folder = ensure_space_folder(&root, "Work/Mail").unwrap();

        assert_eq!(root.join("Work:Mail"), folder);
        assert!(folder.is_dir());
        // Existing folders are reused.
        assert_eq!(folder, ensure_space_folder(&root, "Work/Mail").unwrap());
    }

    #[test]
    fn root_parents_are_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("missing").join(SPACES_DIR);
        assert!(ensure_space_folder(&root, "Desktop 1").is_err());
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn file_in_the_way_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join(SPACES_DIR);
        fs::create_dir(&root).unwrap();
        fs::write(root.join("Code"), "not a folder").unwrap();

        let err = ensure_space_folder(&root, "Code").unwrap_err();
        assert!(err.to_string().contains("is not a folder"), "{err:#}");
        assert_eq!("not a folder", fs::read_to_string(root.join("Code")).unwrap());

        let blocked = dir.path().join("blocked");
        fs::write(&blocked, "").unwrap();
        assert!(ensure_space_folder(&blocked, "Code").is_err());
    }

    #[test]
    fn dot_names_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["", " ", ".", ".."] {
            assert!(ensure_space_folder(dir.path(), name).is_err(), "{name:?}");
        }
    }

    #[test]
    fn open_shows_the_folder_only_after_it_exists() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::default();
        let mut folders = SpaceFolders::new(dir.path().join(SPACES_DIR), Box::new(recorder.clone()));

        let opened = folders.open("Web").unwrap();
        assert_eq!(vec![opened], *recorder.0.lock());

        fs::write(folders.root().join("Notes"), "").unwrap();
        assert!(folders.open("Notes").is_err());
        assert_eq!(1, recorder.0.lock().len());
    }

    #[test]
    fn finder_script_quotes_the_path() {
        assert_eq!(
            "tell application \"Finder\"\n\tactivate\n\topen (\"/Users/me/Spaces/say \\\"hi\\\"\" as POSIX file)\nend tell",
            finder_script(Path::new("/Users/me/Spaces/say \"hi\""))
        );
    }
}
