use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "nationlauncher";

/// Every location the launcher touches, derived from one root directory.
///
/// The root defaults to `<platform data dir>/nationlauncher`; tests point it
/// at a temporary directory instead.
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    root: PathBuf,
}

impl LauncherPaths {
    pub fn from_system() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            root: base.join(APP_DIR_NAME),
        }
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn minecraft_dir(&self) -> PathBuf {
        self.root.join("minecraft")
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.minecraft_dir().join("mods")
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.minecraft_dir().join("versions")
    }

    pub fn runtime_dir(&self) -> PathBuf {
        self.root.join("runtime")
    }

    /// Working directory for the mod-loader installer artifact.
    pub fn loader_work_dir(&self) -> PathBuf {
        self.root.join("forge")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }

    pub fn install_state_file(&self) -> PathBuf {
        self.root.join("install_state.json")
    }

    pub fn java_binary(&self) -> PathBuf {
        if cfg!(target_os = "windows") {
            self.runtime_dir().join("bin").join("java.exe")
        } else {
            self.runtime_dir().join("bin").join("java")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_hang_off_the_root() {
        let paths = LauncherPaths::at("/tmp/launcher-root");
        assert_eq!(paths.mods_dir(), Path::new("/tmp/launcher-root/minecraft/mods"));
        assert_eq!(
            paths.versions_dir(),
            Path::new("/tmp/launcher-root/minecraft/versions")
        );
        assert!(paths.java_binary().starts_with(paths.runtime_dir()));
    }
}
