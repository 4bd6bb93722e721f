//! Input classification and variant output naming.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// The two container formats the toolkit understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// `.logicx` project bundle (directory tree).
    Project,
    /// `.scn` mixer scene (text file).
    Scene,
}

impl InputKind {
    pub fn extension(&self) -> &'static str {
        match self {
            InputKind::Project => "logicx",
            InputKind::Scene => "scn",
        }
    }
}

/// Matches `name.logicx` / `name.scn`, including hidden working copies like
/// `.name.scn.wip`.
fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\.?(?P<base>.+?)\.(?P<ext>logicx|scn)(?:\.wip)?$").expect("valid pattern")
    })
}

pub fn detect(path: &Path) -> Option<InputKind> {
    let name = path.file_name()?.to_str()?;
    let captures = name_pattern().captures(name)?;
    match &captures["ext"] {
        "logicx" => Some(InputKind::Project),
        "scn" => Some(InputKind::Scene),
        _ => None,
    }
}

/// The display prefix of an input: file name minus dot-prefix, container
/// extension, and any `.wip` suffix.
pub fn base_name(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Format(format!("invalid path: {}", path.display())))?;
    let captures = name_pattern()
        .captures(name)
        .ok_or_else(|| Error::Format(format!("{name} is not a project bundle or scene file")))?;
    Ok(captures["base"].to_string())
}

/// Output path for one variant: `{base}_{variant}.{ext}` inside `target_dir`.
pub fn variant_path(target_dir: &Path, base: &str, variant: &str, kind: InputKind) -> PathBuf {
    target_dir.join(format!("{}_{}.{}", base, variant, kind.extension()))
}

/// Create `target_dir` if needed; error if the path exists as a file.
pub fn ensure_dir(target_dir: &Path) -> Result<()> {
    if target_dir.exists() && !target_dir.is_dir() {
        return Err(Error::TargetExists(target_dir.to_path_buf()));
    }
    fs::create_dir_all(target_dir)?;
    Ok(())
}

/// Copy a bundle directory tree. Fails if `dst` already exists.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> Result<()> {
    if dst.exists() {
        return Err(Error::TargetExists(dst.to_path_buf()));
    }
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_container_kinds() {
        assert_eq!(detect(Path::new("show.logicx")), Some(InputKind::Project));
        assert_eq!(detect(Path::new("gig/night.scn")), Some(InputKind::Scene));
        assert_eq!(detect(Path::new(".night.scn.wip")), Some(InputKind::Scene));
        assert_eq!(detect(Path::new("notes.txt")), None);
    }

    #[test]
    fn base_name_strips_container_suffixes() {
        assert_eq!(base_name(Path::new("show.logicx")).unwrap(), "show");
        assert_eq!(base_name(Path::new(".night.scn.wip")).unwrap(), "night");
        assert!(base_name(Path::new("notes.txt")).is_err());
    }

    #[test]
    fn variant_path_preserves_extension() {
        let path = variant_path(Path::new("out"), "show", "Sat", InputKind::Scene);
        assert_eq!(path, Path::new("out/show_Sat.scn"));
    }

    #[test]
    fn copy_dir_recursive_copies_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("bundle.logicx");
        std::fs::create_dir_all(src.join("Alternatives/000")).unwrap();
        std::fs::write(src.join("Alternatives/000/ProjectData"), b"blob").unwrap();

        let dst = dir.path().join("copy.logicx");
        copy_dir_recursive(&src, &dst).unwrap();
        assert_eq!(
            std::fs::read(dst.join("Alternatives/000/ProjectData")).unwrap(),
            b"blob"
        );
    }

    #[test]
    fn copy_dir_recursive_refuses_existing_target() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&dst).unwrap();
        assert!(matches!(
            copy_dir_recursive(&src, &dst),
            Err(Error::TargetExists(_))
        ));
    }
}
