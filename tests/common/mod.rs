#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use structgen::BatchConfig;
use structgen_nbt::{Compound, NbtFile, Tag};
use tempfile::TempDir;

pub const ALLOWLIST: &str = r#"{
    "mineral:brick": {},
    "minecraft:stone": {},
    "minecraft:air": {},
    "minecraft:sandstone": {},
    "minecraft:oak_planks": {},
    "minecraft:spruce_planks": {},
    "minecraft:oak_stairs": { "facing": ["north", "east", "south", "west"], "half": ["bottom", "top"] },
    "minecraft:chest": { "facing": ["north", "east", "south", "west"] },
    "minecraft:jigsaw": { "orientation": ["north_up", "east_up", "south_up", "west_up"] }
}"#;

/// A throwaway `plans/`, `templates/`, `allowlist.json` tree.
pub struct Fixture {
    dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Fixture {
            dir: tempfile::tempdir().unwrap(),
        };
        fs::create_dir_all(fixture.path("plans")).unwrap();
        fs::create_dir_all(fixture.path("templates/block_entities")).unwrap();
        fs::create_dir_all(fixture.path("templates/entities")).unwrap();
        fixture.write_allowlist(ALLOWLIST);
        fixture
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write_allowlist(&self, json: &str) {
        fs::write(self.path("allowlist.json"), json).unwrap();
    }

    pub fn write_plan(&self, relative: &str, json: &str) {
        let path = self.path("plans").join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, json).unwrap();
    }

    /// `kind_dir` is `block_entities` or `entities`.
    pub fn write_template(&self, kind_dir: &str, name: &str, payload: Compound) {
        let file = NbtFile::new(String::new(), Tag::Compound(payload));
        let path = self.path("templates").join(kind_dir).join(format!("{}.bin", name));
        fs::write(path, file.to_gzip_bytes().unwrap()).unwrap();
    }

    pub fn config(&self) -> BatchConfig {
        let mut config = BatchConfig::new(self.path("plans"), self.path("out"));
        config.templates = self.path("templates");
        config.allowlist = self.path("allowlist.json");
        config.jobs = 2;
        config
    }

    pub fn output(&self, relative: &str) -> PathBuf {
        self.path("out").join(relative)
    }

    pub fn read_output(&self, relative: &str) -> Compound {
        let bytes = fs::read(self.output(relative)).unwrap();
        let file = NbtFile::from_bytes(&bytes).unwrap();
        match file.root {
            Tag::Compound(root) => root,
            other => panic!("unexpected root {:?}", other),
        }
    }
}

pub fn compound(entries: Vec<(&str, Tag)>) -> Compound {
    entries.into_iter().collect()
}

pub fn list<'a>(root: &'a Compound, key: &str) -> &'a Vec<Tag> {
    root.get(key).and_then(Tag::as_list).unwrap()
}

pub fn ints(values: &[i32]) -> Vec<Tag> {
    values.iter().copied().map(Tag::Int).collect()
}

/// `(pos, Name)` of every block in a decoded container.
pub fn block_names(root: &Compound) -> Vec<([i32; 3], String)> {
    let palette = list(root, "palette");
    list(root, "blocks")
        .iter()
        .map(|block| {
            let block = block.as_compound().unwrap();
            let pos: Vec<i32> = list(block, "pos").iter().map(|t| t.as_i32().unwrap()).collect();
            let state = block.get("state").and_then(Tag::as_i32).unwrap() as usize;
            let name = palette[state]
                .as_compound()
                .and_then(|c| c.get("Name"))
                .and_then(Tag::as_string)
                .unwrap()
                .clone();
            ([pos[0], pos[1], pos[2]], name)
        })
        .collect()
}
