//! Opaque block-entity and entity payloads, keyed by name.
//!
//! Payloads are spliced into the container exactly as read. Their contents
//! are never rotated or mirrored, so a template holding orientation data
//! (a sign's text side, an item frame's facing) keeps the orientation it was
//! authored with.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use structgen_nbt::{Compound, NbtFile, Tag};
use tracing::debug;

use crate::error::{CompileError, Error};

const TEMPLATE_EXTENSIONS: [&str; 2] = ["bin", "nbt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TemplateKind {
    BlockEntity,
    Entity,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 2] = [TemplateKind::BlockEntity, TemplateKind::Entity];

    pub fn dir_name(self) -> &'static str {
        match self {
            TemplateKind::BlockEntity => "block_entities",
            TemplateKind::Entity => "entities",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::BlockEntity => write!(f, "block entity"),
            TemplateKind::Entity => write!(f, "entity"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateBlob {
    pub kind: TemplateKind,
    pub name: String,
    pub payload: Compound,
}

/// All templates of a run. Built once, then only read.
#[derive(Debug, Clone, Default)]
pub struct TemplateLibrary {
    templates: BTreeMap<(TemplateKind, String), TemplateBlob>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, blob: TemplateBlob) {
        self.templates.insert((blob.kind, blob.name.clone()), blob);
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn resolve(&self, name: &str, kind: TemplateKind) -> Result<&TemplateBlob, CompileError> {
        self.templates
            .get(&(kind, name.to_owned()))
            .ok_or_else(|| CompileError::TemplateNotFound {
                kind,
                name: name.to_owned(),
            })
    }

    /// Loads `<root>/block_entities/*` and `<root>/entities/*`.
    ///
    /// The root must be a readable directory; a kind directory that does not
    /// exist just contributes no templates.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let template_error = |path: &Path, message: String| Error::Template {
            path: path.to_path_buf(),
            message,
        };

        fs::read_dir(root).map_err(|e| template_error(root, e.to_string()))?;

        let mut library = TemplateLibrary::new();
        for kind in TemplateKind::ALL {
            let dir = root.join(kind.dir_name());
            if !dir.exists() {
                debug!("no {} templates under {}", kind, dir.display());
                continue;
            }

            let mut files: Vec<PathBuf> = fs::read_dir(&dir)
                .map_err(|e| template_error(&dir, e.to_string()))?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<Result<_, _>>()
                .map_err(|e| template_error(&dir, e.to_string()))?;
            files.retain(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
            });
            files.sort();

            for path in files {
                let name = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .ok_or_else(|| template_error(&path, "file name is not valid UTF-8".into()))?
                    .to_owned();
                if library.templates.contains_key(&(kind, name.clone())) {
                    return Err(template_error(
                        &path,
                        format!("duplicate {} template name '{}'", kind, name),
                    ));
                }
                let bytes = fs::read(&path).map_err(|e| template_error(&path, e.to_string()))?;
                let payload = decode_payload(&bytes).map_err(|message| template_error(&path, message))?;
                debug!("loaded {} template '{}' ({} keys)", kind, name, payload.len());
                library.insert(TemplateBlob {
                    kind,
                    name,
                    payload,
                });
            }
        }
        Ok(library)
    }
}

/// Decodes a template file into the compound that gets spliced.
///
/// A root holding nothing but a `template` compound is unwrapped.
pub fn decode_payload(bytes: &[u8]) -> Result<Compound, String> {
    let file = NbtFile::from_bytes(bytes).map_err(|e| format!("malformed NBT: {}", e))?;
    let Tag::Compound(root) = file.root else {
        return Err("root tag must be a compound".to_owned());
    };
    if root.len() == 1 {
        if let Some(Tag::Compound(inner)) = root.get("template") {
            return Ok(inner.clone());
        }
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn chest_payload() -> Compound {
        vec![
            ("id", Tag::String("minecraft:chest".into())),
            ("LootTable", Tag::String("acm:chests/pokecenter".into())),
        ]
        .into_iter()
        .collect()
    }

    fn encode(root: Compound, gzip: bool) -> Vec<u8> {
        let file = NbtFile::new(String::new(), Tag::Compound(root));
        if gzip {
            file.to_gzip_bytes().unwrap()
        } else {
            let mut raw = Vec::new();
            file.write(&mut raw).unwrap();
            raw
        }
    }

    #[test]
    fn test_decode_plain_and_gzip() {
        assert_eq!(decode_payload(&encode(chest_payload(), false)).unwrap(), chest_payload());
        assert_eq!(decode_payload(&encode(chest_payload(), true)).unwrap(), chest_payload());
    }

    #[test]
    fn test_decode_unwraps_template_key() {
        let wrapped: Compound = vec![("template", Tag::Compound(chest_payload()))]
            .into_iter()
            .collect();
        assert_eq!(decode_payload(&encode(wrapped, true)).unwrap(), chest_payload());
    }

    #[test]
    fn test_decode_rejects_non_compound_root() {
        let file = NbtFile::new(String::new(), Tag::Int(3));
        let mut raw = Vec::new();
        file.write(&mut raw).unwrap();
        assert!(decode_payload(&raw).is_err());
        assert!(decode_payload(b"not nbt at all").is_err());
    }

    #[test]
    fn test_load_library_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let block_dir = dir.path().join("block_entities");
        fs::create_dir_all(&block_dir).unwrap();
        fs::write(block_dir.join("loot_chest.bin"), encode(chest_payload(), true)).unwrap();
        fs::write(block_dir.join("README.txt"), "ignored").unwrap();

        let library = TemplateLibrary::load(dir.path()).unwrap();
        assert_eq!(library.len(), 1);
        let blob = library.resolve("loot_chest", TemplateKind::BlockEntity).unwrap();
        assert_eq!(blob.payload, chest_payload());

        assert_matches!(
            library.resolve("loot_chest", TemplateKind::Entity),
            Err(CompileError::TemplateNotFound { kind: TemplateKind::Entity, .. })
        );
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = TemplateLibrary::load(&dir.path().join("nope")).unwrap_err();
        assert_matches!(err, Error::Template { .. });
    }

    #[test]
    fn test_malformed_template_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let entity_dir = dir.path().join("entities");
        fs::create_dir_all(&entity_dir).unwrap();
        fs::write(entity_dir.join("broken.nbt"), [10u8, 0]).unwrap();

        assert_matches!(TemplateLibrary::load(dir.path()), Err(Error::Template { .. }));
    }
}
