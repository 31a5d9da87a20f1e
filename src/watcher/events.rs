//! File system event types and translation from notify events.

use std::path::PathBuf;

use notify::event::{AccessKind, AccessMode, CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode};
use serde::Serialize;

/// What happened to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FsEventKind {
    /// The path appeared (created, copied or moved in).
    Created,
    /// The path disappeared (deleted or moved away).
    Deleted,
    /// A file was written and closed.
    ContentModified,
}

impl FsEventKind {
    /// Metric label of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Deleted => "deleted",
            Self::ContentModified => "content_modified",
        }
    }
}

/// One file system event, as consumed by the reactor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub is_dir: bool,
    pub path: PathBuf,
}

impl FsEvent {
    /// A path was created.
    pub fn created(path: impl Into<PathBuf>, is_dir: bool) -> Self {
        Self {
            kind: FsEventKind::Created,
            is_dir,
            path: path.into(),
        }
    }

    /// A path was deleted.
    pub fn deleted(path: impl Into<PathBuf>, is_dir: bool) -> Self {
        Self {
            kind: FsEventKind::Deleted,
            is_dir,
            path: path.into(),
        }
    }

    /// A file's content changed.
    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: FsEventKind::ContentModified,
            is_dir: false,
            path: path.into(),
        }
    }
}

/// Translate one notify event into reactor events, in path order.
///
/// Rename halves become delete and create. Removals the platform does not
/// flag as folders are reported as files; the reactor resolves them
/// against its watch table since the path can no longer be inspected.
#[must_use]
pub fn translate(event: &notify::Event) -> Vec<FsEvent> {
    let paths = &event.paths;

    match event.kind {
        EventKind::Create(kind) => paths
            .iter()
            .map(|path| {
                let is_dir = match kind {
                    CreateKind::Folder => true,
                    CreateKind::File => false,
                    _ => path.is_dir(),
                };
                FsEvent::created(path.clone(), is_dir)
            })
            .collect(),
        EventKind::Remove(kind) => paths
            .iter()
            .map(|path| FsEvent::deleted(path.clone(), kind == RemoveKind::Folder))
            .collect(),
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => {
            paths.iter().map(|path| FsEvent::modified(path.clone())).collect()
        }
        EventKind::Modify(ModifyKind::Name(mode)) => match (mode, paths.as_slice()) {
            (RenameMode::From, _) => paths
                .iter()
                .map(|path| FsEvent::deleted(path.clone(), false))
                .collect(),
            (RenameMode::To, _) => paths
                .iter()
                .map(|path| FsEvent::created(path.clone(), path.is_dir()))
                .collect(),
            (RenameMode::Both, [from, to]) => vec![
                FsEvent::deleted(from.clone(), false),
                FsEvent::created(to.clone(), to.is_dir()),
            ],
            _ => paths
                .iter()
                .map(|path| {
                    if path.exists() {
                        FsEvent::created(path.clone(), path.is_dir())
                    } else {
                        FsEvent::deleted(path.clone(), false)
                    }
                })
                .collect(),
        },
        // Platforms without close-after-write notifications.
        #[cfg(not(target_os = "linux"))]
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => paths
            .iter()
            .filter(|path| path.is_file())
            .map(|path| FsEvent::modified(path.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::Event;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_translate_create_folder_and_file() {
        let dir = Event::new(EventKind::Create(CreateKind::Folder)).add_path("/data/new".into());
        assert_eq!(translate(&dir), vec![FsEvent::created("/data/new", true)]);

        let file = Event::new(EventKind::Create(CreateKind::File)).add_path("/data/a.ttl".into());
        assert_eq!(translate(&file), vec![FsEvent::created("/data/a.ttl", false)]);
    }

    #[test]
    fn test_translate_create_any_inspects_path() {
        let tmp = TempDir::new().unwrap();
        let sub = tmp.path().join("sub");
        fs::create_dir(&sub).unwrap();

        let event = Event::new(EventKind::Create(CreateKind::Any)).add_path(sub.clone());
        assert_eq!(translate(&event), vec![FsEvent::created(sub, true)]);
    }

    #[test]
    fn test_translate_remove() {
        let dir = Event::new(EventKind::Remove(RemoveKind::Folder)).add_path("/data/old".into());
        assert_eq!(translate(&dir), vec![FsEvent::deleted("/data/old", true)]);

        let any = Event::new(EventKind::Remove(RemoveKind::Any)).add_path("/data/a.ttl".into());
        assert_eq!(translate(&any), vec![FsEvent::deleted("/data/a.ttl", false)]);
    }

    #[test]
    fn test_translate_close_write() {
        let event = Event::new(EventKind::Access(AccessKind::Close(AccessMode::Write)))
            .add_path("/data/a.ttl".into());
        assert_eq!(translate(&event), vec![FsEvent::modified("/data/a.ttl")]);
    }

    #[test]
    fn test_translate_rename_both() {
        let tmp = TempDir::new().unwrap();
        let to = tmp.path().join("b.ttl");
        fs::write(&to, "").unwrap();

        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(tmp.path().join("a.ttl"))
            .add_path(to.clone());

        assert_eq!(
            translate(&event),
            vec![
                FsEvent::deleted(tmp.path().join("a.ttl"), false),
                FsEvent::created(to, false),
            ]
        );
    }

    #[test]
    fn test_translate_rename_halves() {
        let from = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path("/data/a.ttl".into());
        assert_eq!(translate(&from), vec![FsEvent::deleted("/data/a.ttl", false)]);

        let tmp = TempDir::new().unwrap();
        let to = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::To)))
            .add_path(tmp.path().to_path_buf());
        assert_eq!(translate(&to), vec![FsEvent::created(tmp.path(), true)]);
    }

    #[test]
    fn test_translate_ignores_reads_and_metadata() {
        let read = Event::new(EventKind::Access(AccessKind::Read)).add_path("/data/a.ttl".into());
        assert!(translate(&read).is_empty());

        let meta = Event::new(EventKind::Modify(ModifyKind::Metadata(
            notify::event::MetadataKind::Permissions,
        )))
        .add_path("/data/a.ttl".into());
        assert!(translate(&meta).is_empty());
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(FsEventKind::Created.as_str(), "created");
        assert_eq!(FsEventKind::ContentModified.as_str(), "content_modified");
    }
}
