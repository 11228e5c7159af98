//! Serializes a compiled structure into the game's structure template layout.

use std::io;

use structgen_nbt::{Compound, NbtFile, Tag, TAG_COMPOUND, TAG_DOUBLE, TAG_INT};

use crate::compiler::{CompiledBlock, CompiledEntity, CompiledStructure, PaletteEntry};
use crate::plan::Pos;

fn int_list(values: [i32; 3]) -> Tag {
    Tag::typed_list(TAG_INT, values.into_iter().map(Tag::Int).collect())
}

fn pos_tag(pos: Pos) -> Tag {
    int_list([pos.x, pos.y, pos.z])
}

fn palette_tag(entry: &PaletteEntry) -> Tag {
    let mut compound = Compound::new();
    compound.insert("Name", Tag::String(entry.name.clone()));
    if !entry.properties.is_empty() {
        let properties: Compound = entry
            .properties
            .iter()
            .map(|(k, v)| (k.as_str(), Tag::String(v.clone())))
            .collect();
        compound.insert("Properties", Tag::Compound(properties));
    }
    Tag::Compound(compound)
}

fn block_tag(block: &CompiledBlock) -> io::Result<Tag> {
    let state = i32::try_from(block.palette_index).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("palette index {} overflows", block.palette_index),
        )
    })?;
    let mut compound = Compound::new();
    compound.insert("state", Tag::Int(state));
    compound.insert("pos", pos_tag(block.pos));
    if let Some(nbt) = &block.nbt {
        compound.insert("nbt", Tag::Compound(nbt.clone()));
    }
    Ok(Tag::Compound(compound))
}

fn entity_tag(entity: &CompiledEntity) -> Tag {
    let pos = Tag::typed_list(
        TAG_DOUBLE,
        entity.pos.iter().copied().map(Tag::Double).collect(),
    );
    let compound: Compound = vec![
        ("pos", pos),
        ("blockPos", pos_tag(entity.block_pos)),
        ("nbt", Tag::Compound(entity.nbt.clone())),
    ]
    .into_iter()
    .collect();
    Tag::Compound(compound)
}

/// Builds the root compound: `DataVersion`, `size`, `palette`, `blocks`, `entities`.
pub fn to_nbt(structure: &CompiledStructure) -> io::Result<NbtFile> {
    let size = structure.size;
    let blocks = structure
        .blocks
        .iter()
        .map(block_tag)
        .collect::<io::Result<Vec<_>>>()?;

    let root: Compound = vec![
        ("DataVersion", Tag::Int(structure.data_version)),
        ("size", int_list([size.w, size.h, size.l])),
        (
            "palette",
            Tag::typed_list(TAG_COMPOUND, structure.palette.iter().map(palette_tag).collect()),
        ),
        ("blocks", Tag::typed_list(TAG_COMPOUND, blocks)),
        (
            "entities",
            Tag::typed_list(TAG_COMPOUND, structure.entities.iter().map(entity_tag).collect()),
        ),
    ]
    .into_iter()
    .collect();

    Ok(NbtFile::new(String::new(), Tag::Compound(root)))
}

/// Gzip-compressed container bytes.
pub fn encode(structure: &CompiledStructure) -> io::Result<Vec<u8>> {
    to_nbt(structure)?.to_gzip_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::DATA_VERSION;
    use crate::plan::Size;
    use std::collections::BTreeMap;

    fn brick_structure() -> CompiledStructure {
        CompiledStructure {
            size: Size::new(3, 3, 3),
            palette: vec![PaletteEntry {
                name: "mineral:brick".into(),
                properties: BTreeMap::new(),
            }],
            blocks: vec![CompiledBlock {
                pos: Pos::new(1, 1, 1),
                palette_index: 0,
                nbt: None,
            }],
            entities: Vec::new(),
            data_version: DATA_VERSION,
        }
    }

    fn root(file: &NbtFile) -> &Compound {
        file.root.as_compound().unwrap()
    }

    #[test]
    fn test_root_layout() {
        let file = to_nbt(&brick_structure()).unwrap();
        let root = root(&file);
        let keys: Vec<&str> = root.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["DataVersion", "size", "palette", "blocks", "entities"]);
        assert_eq!(root.get("DataVersion"), Some(&Tag::Int(DATA_VERSION)));
        assert_eq!(
            root.get("size").and_then(Tag::as_list),
            Some(&vec![Tag::Int(3), Tag::Int(3), Tag::Int(3)])
        );

        let palette = root.get("palette").and_then(Tag::as_list).unwrap();
        let entry = palette[0].as_compound().unwrap();
        assert_eq!(entry.get("Name"), Some(&Tag::String("mineral:brick".into())));
        assert!(!entry.contains_key("Properties"));

        let blocks = root.get("blocks").and_then(Tag::as_list).unwrap();
        let block = blocks[0].as_compound().unwrap();
        assert_eq!(block.get("state"), Some(&Tag::Int(0)));
        assert!(!block.contains_key("nbt"));

        assert_matches::assert_matches!(
            root.get("entities"),
            Some(Tag::List(list)) if list.items.is_empty() && list.element_type == TAG_COMPOUND
        );
    }

    #[test]
    fn test_properties_and_block_nbt() {
        let mut structure = brick_structure();
        structure.palette[0].properties =
            BTreeMap::from([("facing".to_owned(), "north".to_owned())]);
        structure.blocks[0].nbt = Some(
            vec![("LootTable", Tag::String("acm:chests/pokecenter".into()))]
                .into_iter()
                .collect(),
        );

        let file = to_nbt(&structure).unwrap();
        let root = root(&file);
        let palette = root.get("palette").and_then(Tag::as_list).unwrap();
        let properties = palette[0]
            .as_compound()
            .and_then(|c| c.get("Properties"))
            .and_then(Tag::as_compound)
            .unwrap();
        assert_eq!(properties.get("facing"), Some(&Tag::String("north".into())));

        let blocks = root.get("blocks").and_then(Tag::as_list).unwrap();
        assert!(blocks[0].as_compound().unwrap().contains_key("nbt"));
    }

    #[test]
    fn test_entity_layout() {
        let mut structure = brick_structure();
        structure.entities.push(CompiledEntity {
            pos: [1.5, 1.0, 1.5],
            block_pos: Pos::new(1, 1, 1),
            nbt: vec![("id", Tag::String("acm:nurse".into()))].into_iter().collect(),
        });
        let file = to_nbt(&structure).unwrap();
        let entities = root(&file).get("entities").and_then(Tag::as_list).unwrap();
        let entity = entities[0].as_compound().unwrap();
        let keys: Vec<&str> = entity.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["pos", "blockPos", "nbt"]);
        assert_eq!(
            entity.get("pos").and_then(Tag::as_list),
            Some(&vec![Tag::Double(1.5), Tag::Double(1.0), Tag::Double(1.5)])
        );
    }

    #[test]
    fn test_encode_is_deterministic_and_readable() {
        let first = encode(&brick_structure()).unwrap();
        let second = encode(&brick_structure()).unwrap();
        assert_eq!(first, second);
        assert_eq!(&first[..2], &[0x1f, 0x8b]);

        let decoded = NbtFile::from_bytes(&first).unwrap();
        assert_eq!(decoded, to_nbt(&brick_structure()).unwrap());
    }
}
