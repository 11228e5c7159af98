//! Per-plan compilation pipeline.
//!
//! bind biome -> bounds -> validate -> transform -> bounds -> re-validate ->
//! resolve templates -> jigsaw policy -> palette.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use structgen_nbt::{Compound, Tag};
use tracing::debug;

use crate::allowlist::Allowlist;
use crate::error::CompileError;
use crate::geometry;
use crate::orientation::{Mirror, Rotation, JIGSAW_ORIENTATIONS};
use crate::plan::{BlockState, JigsawPolicy, Plan, Pos, Size, StateRef};
use crate::templates::{TemplateKind, TemplateLibrary};

/// DataVersion of game release 1.21.1.
pub const DATA_VERSION: i32 = 3955;
pub const DEFAULT_NAMESPACE: &str = "minecraft";
pub const JIGSAW_BLOCK: &str = "minecraft:jigsaw";
pub const JIGSAW_JOINTS: [&str; 2] = ["rollable", "aligned"];

static NAMESPACED_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9_.-]+:[a-z0-9_/.-]+$")
        .unwrap_or_else(|e| panic!("invalid namespaced id pattern: {}", e))
});

/// Shared, read-only inputs of a run.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    pub allowlist: Allowlist,
    pub templates: TemplateLibrary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub rotation: Rotation,
    pub mirror: Mirror,
    pub include_entities: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PaletteEntry {
    pub name: String,
    /// Property values in their string form, sorted by key.
    pub properties: BTreeMap<String, String>,
}

impl From<&BlockState> for PaletteEntry {
    fn from(state: &BlockState) -> Self {
        PaletteEntry {
            name: state.block_id.clone(),
            properties: state
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledBlock {
    pub pos: Pos,
    pub palette_index: usize,
    pub nbt: Option<Compound>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledEntity {
    pub pos: [f64; 3],
    pub block_pos: Pos,
    pub nbt: Compound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStructure {
    pub size: Size,
    pub palette: Vec<PaletteEntry>,
    pub blocks: Vec<CompiledBlock>,
    pub entities: Vec<CompiledEntity>,
    pub data_version: i32,
}

/// Applies the default namespace and checks the id syntax.
pub fn namespaced_id(id: &str) -> Option<String> {
    let id = id.trim();
    let full = if id.contains(':') {
        id.to_owned()
    } else {
        format!("{}:{}", DEFAULT_NAMESPACE, id)
    };
    NAMESPACED_ID.is_match(&full).then_some(full)
}

pub fn compile_plan(
    plan: &Plan,
    biome: Option<&str>,
    ctx: &CompileContext,
    options: &CompileOptions,
) -> Result<CompiledStructure, CompileError> {
    let bound = plan.bind_biome(biome)?;
    check_bounds(&bound)?;
    // a malformed connector is reported as such, not as an allowlist miss
    check_jigsaws(&bound)?;
    validate_plan(&bound, &ctx.allowlist)?;

    let transformed = if options.rotation == Rotation::None && options.mirror == Mirror::None {
        bound
    } else {
        debug!(
            "transforming: rotate={} mirror={}",
            options.rotation, options.mirror
        );
        let transformed = geometry::transform(&bound, options.rotation, options.mirror);
        check_bounds(&transformed)?;
        validate_plan(&transformed, &ctx.allowlist)?;
        transformed
    };

    let block_entities = resolve_block_entities(&transformed, &ctx.templates)?;
    let entities = resolve_entities(&transformed, &ctx.templates)?;
    let jigsaw_nbt = check_jigsaws(&transformed)?;

    let mut structure = build_palette(&transformed, block_entities, jigsaw_nbt)?;
    if options.include_entities {
        structure.entities = entities;
    }
    Ok(structure)
}

fn direct_state(state: &StateRef, pos: Pos) -> Result<&BlockState, CompileError> {
    match state {
        StateRef::Direct(state) => Ok(state),
        StateRef::Material(key) => Err(CompileError::schema(format!(
            "material_key '{}' at {} is not bound to a biome palette",
            key, pos
        ))),
    }
}

fn jigsaw_state(orientation: &str) -> BlockState {
    BlockState::new(JIGSAW_BLOCK).with_property("orientation", orientation)
}

pub fn check_bounds(plan: &Plan) -> Result<(), CompileError> {
    let size = plan.size;
    let positions = plan
        .blocks
        .iter()
        .map(|b| ("block", b.pos))
        .chain(plan.jigsaws.iter().map(|j| ("jigsaw", j.pos)))
        .chain(plan.entities.iter().map(|e| ("entity", e.block_pos)));

    for (what, pos) in positions {
        if !size.contains(pos) {
            return Err(CompileError::PositionOutOfBounds { what, pos, size });
        }
    }
    Ok(())
}

/// Checks every block state a plan would emit against the allowlist.
pub fn validate_plan(plan: &Plan, allowlist: &Allowlist) -> Result<(), CompileError> {
    for block in &plan.blocks {
        let state = direct_state(&block.state, block.pos)?;
        allowlist
            .validate_state(state)
            .map_err(|violation| CompileError::NotAllowed {
                pos: block.pos,
                violation,
            })?;
    }
    for jigsaw in &plan.jigsaws {
        for state in [&jigsaw_state(&jigsaw.orientation), &jigsaw.final_state] {
            allowlist
                .validate_state(state)
                .map_err(|violation| CompileError::NotAllowed {
                    pos: jigsaw.pos,
                    violation,
                })?;
        }
    }
    Ok(())
}

fn resolve_block_entities(
    plan: &Plan,
    templates: &TemplateLibrary,
) -> Result<BTreeMap<Pos, Compound>, CompileError> {
    let mut resolved = BTreeMap::new();
    for block in &plan.blocks {
        if let Some(name) = &block.block_entity_ref {
            let blob = templates.resolve(name, TemplateKind::BlockEntity)?;
            resolved.insert(block.pos, blob.payload.clone());
        }
    }
    Ok(resolved)
}

fn resolve_entities(
    plan: &Plan,
    templates: &TemplateLibrary,
) -> Result<Vec<CompiledEntity>, CompileError> {
    plan.entities
        .iter()
        .map(|entity| {
            let blob = templates.resolve(&entity.entity_ref, TemplateKind::Entity)?;
            Ok(CompiledEntity {
                pos: entity.pos(),
                block_pos: entity.block_pos,
                nbt: blob.payload.clone(),
            })
        })
        .collect()
}

/// Validates connectors and the plan's connector-count policy, returning
/// each jigsaw's block nbt keyed by position.
pub fn check_jigsaws(plan: &Plan) -> Result<BTreeMap<Pos, Compound>, CompileError> {
    let count = plan.jigsaws.len();
    match plan.jigsaw_policy {
        JigsawPolicy::SingleEntrance if count != 1 => {
            return Err(CompileError::jigsaw(format!(
                "plan requires exactly one entrance jigsaw, found {}",
                count
            )));
        }
        JigsawPolicy::AtLeastOne if count == 0 => {
            return Err(CompileError::jigsaw("plan requires at least one jigsaw"));
        }
        _ => {}
    }

    let mut nbt = BTreeMap::new();
    for (i, jigsaw) in plan.jigsaws.iter().enumerate() {
        let field = |label: &str, value: &str| {
            namespaced_id(value).ok_or_else(|| {
                CompileError::jigsaw(format!(
                    "jigsaws[{}] at {}: {} '{}' is not a namespaced id",
                    i, jigsaw.pos, label, value
                ))
            })
        };
        let name = field("name", &jigsaw.name)?;
        let pool = field("pool", &jigsaw.pool)?;
        let target_pool = field("target_pool", &jigsaw.target_pool)?;

        if !JIGSAW_JOINTS.contains(&jigsaw.joint.as_str()) {
            return Err(CompileError::jigsaw(format!(
                "jigsaws[{}] at {}: joint must be one of {}, got '{}'",
                i,
                jigsaw.pos,
                JIGSAW_JOINTS.join(", "),
                jigsaw.joint
            )));
        }
        if !JIGSAW_ORIENTATIONS.contains(&jigsaw.orientation.as_str()) {
            return Err(CompileError::jigsaw(format!(
                "jigsaws[{}] at {}: invalid orientation '{}'",
                i, jigsaw.pos, jigsaw.orientation
            )));
        }

        let compound: Compound = vec![
            ("name", Tag::String(name)),
            ("target", Tag::String(target_pool)),
            ("pool", Tag::String(pool)),
            ("final_state", Tag::String(jigsaw.final_state.to_string())),
            ("joint", Tag::String(jigsaw.joint.clone())),
        ]
        .into_iter()
        .collect();
        if nbt.insert(jigsaw.pos, compound).is_some() {
            return Err(CompileError::jigsaw(format!(
                "jigsaws[{}]: another jigsaw already sits at {}",
                i, jigsaw.pos
            )));
        }
    }
    Ok(nbt)
}

/// Lays blocks out in position order and interns their states.
fn build_palette(
    plan: &Plan,
    mut block_entities: BTreeMap<Pos, Compound>,
    mut jigsaw_nbt: BTreeMap<Pos, Compound>,
) -> Result<CompiledStructure, CompileError> {
    let mut placed: BTreeMap<Pos, (PaletteEntry, Option<Compound>)> = BTreeMap::new();
    for block in &plan.blocks {
        let state = direct_state(&block.state, block.pos)?;
        let nbt = block_entities.remove(&block.pos);
        placed.insert(block.pos, (PaletteEntry::from(state), nbt));
    }
    for jigsaw in &plan.jigsaws {
        let mut nbt = jigsaw_nbt.remove(&jigsaw.pos);
        if let Some((_, replaced)) = placed.get(&jigsaw.pos) {
            debug!("jigsaw replaces block at {}", jigsaw.pos);
            // the block's template entries win over the connector's
            if let (Some(merged), Some(template)) = (nbt.as_mut(), replaced) {
                for (key, tag) in template.iter() {
                    merged.insert(key, tag.clone());
                }
            }
        }
        placed.insert(
            jigsaw.pos,
            (PaletteEntry::from(&jigsaw_state(&jigsaw.orientation)), nbt),
        );
    }

    let mut palette: Vec<PaletteEntry> = Vec::new();
    let mut index: BTreeMap<PaletteEntry, usize> = BTreeMap::new();
    let mut blocks = Vec::with_capacity(placed.len());
    for (pos, (entry, nbt)) in placed {
        let palette_index = match index.get(&entry) {
            Some(i) => *i,
            None => {
                let i = palette.len();
                index.insert(entry.clone(), i);
                palette.push(entry);
                i
            }
        };
        blocks.push(CompiledBlock {
            pos,
            palette_index,
            nbt,
        });
    }

    Ok(CompiledStructure {
        size: plan.size,
        palette,
        blocks,
        entities: Vec::new(),
        data_version: DATA_VERSION,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::plan::parse_plan;
    use crate::templates::TemplateBlob;
    use assert_matches::assert_matches;

    const ALL_DIRECTIONS: &[&str] = &["north", "east", "south", "west"];

    fn context() -> CompileContext {
        let allowlist = Allowlist::default()
            .allow("mineral:brick", [])
            .allow("minecraft:air", [])
            .allow("minecraft:stone", [])
            .allow(
                "minecraft:oak_stairs",
                [("facing", ALL_DIRECTIONS), ("half", &["bottom", "top"][..])],
            )
            .allow("minecraft:ladder", [("facing", &["north", "south"][..])])
            .allow("minecraft:chest", [("facing", ALL_DIRECTIONS)])
            .allow("minecraft:jigsaw", [("orientation", &JIGSAW_ORIENTATIONS[..])]);

        let mut templates = TemplateLibrary::new();
        templates.insert(TemplateBlob {
            kind: TemplateKind::BlockEntity,
            name: "loot_chest".into(),
            payload: vec![("id", Tag::String("minecraft:chest".into()))]
                .into_iter()
                .collect(),
        });
        templates.insert(TemplateBlob {
            kind: TemplateKind::Entity,
            name: "nurse".into(),
            payload: vec![("id", Tag::String("acm:nurse".into()))]
                .into_iter()
                .collect(),
        });
        CompileContext {
            allowlist,
            templates,
        }
    }

    fn compile(text: &str, options: CompileOptions) -> Result<CompiledStructure, CompileError> {
        compile_plan(&parse_plan(text).unwrap(), None, &context(), &options)
    }

    #[test]
    fn test_single_brick() {
        let structure = compile(
            r#"{ "size": [3, 3, 3],
                 "blocks": [{ "pos": [1, 1, 1], "block_id": "mineral:brick", "properties": {} }] }"#,
            CompileOptions::default(),
        )
        .unwrap();

        assert_eq!(structure.size, Size::new(3, 3, 3));
        assert_eq!(
            structure.palette,
            vec![PaletteEntry {
                name: "mineral:brick".into(),
                properties: BTreeMap::new(),
            }]
        );
        assert_eq!(
            structure.blocks,
            vec![CompiledBlock {
                pos: Pos::new(1, 1, 1),
                palette_index: 0,
                nbt: None,
            }]
        );
        assert_eq!(structure.data_version, DATA_VERSION);
    }

    #[test]
    fn test_palette_dedups_in_first_seen_order() {
        let structure = compile(
            r#"{ "size": [3, 1, 1], "blocks": [
                 { "pos": [2, 0, 0], "block_id": "minecraft:stone" },
                 { "pos": [1, 0, 0], "block_id": "mineral:brick" },
                 { "pos": [0, 0, 0], "block_id": "minecraft:stone" } ] }"#,
            CompileOptions::default(),
        )
        .unwrap();

        let names: Vec<&str> = structure.palette.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["minecraft:stone", "mineral:brick"]);
        let indices: Vec<usize> = structure.blocks.iter().map(|b| b.palette_index).collect();
        assert_eq!(indices, vec![0, 1, 0]);
    }

    #[test]
    fn test_value_not_allowed() {
        let err = compile(
            r#"{ "size": [1, 1, 1], "blocks": [
                 { "pos": [0, 0, 0], "block_id": "minecraft:oak_stairs", "properties": { "half": "middle" } } ] }"#,
            CompileOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueNotAllowed);
    }

    #[test]
    fn test_block_and_property_not_allowed() {
        let err = compile(
            r#"{ "size": [1, 1, 1], "blocks": [{ "pos": [0, 0, 0], "block_id": "minecraft:tnt" }] }"#,
            CompileOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BlockNotAllowed);

        let err = compile(
            r#"{ "size": [1, 1, 1], "blocks": [
                 { "pos": [0, 0, 0], "block_id": "minecraft:stone", "properties": { "lit": true } } ] }"#,
            CompileOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PropertyNotAllowed);
    }

    #[test]
    fn test_rotation_can_invalidate_a_value() {
        let text = r#"{ "size": [1, 1, 1], "blocks": [
             { "pos": [0, 0, 0], "block_id": "minecraft:ladder", "properties": { "facing": "north" } } ] }"#;
        assert!(compile(text, CompileOptions::default()).is_ok());

        let options = CompileOptions {
            rotation: Rotation::Clockwise90,
            ..CompileOptions::default()
        };
        let err = compile(text, options).unwrap_err();
        assert_matches!(
            err,
            CompileError::NotAllowed { violation: crate::error::ValidationError::ValueNotAllowed { ref value, .. }, .. }
                if value == "east"
        );
    }

    #[test]
    fn test_position_out_of_bounds() {
        for pos in ["[3, 0, 0]", "[0, 3, 0]", "[0, 0, 3]", "[-1, 0, 0]"] {
            let text = format!(
                r#"{{ "size": [3, 3, 3], "blocks": [{{ "pos": {}, "block_id": "mineral:brick" }}] }}"#,
                pos
            );
            let err = compile(&text, CompileOptions::default()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::PositionOutOfBounds, "{}", pos);
        }
    }

    #[test]
    fn test_template_not_found() {
        let err = compile(
            r#"{ "size": [1, 1, 1], "blocks": [
                 { "pos": [0, 0, 0], "block_id": "minecraft:chest", "properties": { "facing": "north" },
                   "block_entity_ref": "missing" } ] }"#,
            CompileOptions::default(),
        )
        .unwrap_err();
        assert_matches!(err, CompileError::TemplateNotFound { kind: TemplateKind::BlockEntity, ref name } if name == "missing");
    }

    #[test]
    fn test_block_entity_spliced_at_final_position() {
        let options = CompileOptions {
            rotation: Rotation::Clockwise90,
            ..CompileOptions::default()
        };
        let structure = compile(
            r#"{ "size": [2, 1, 3], "blocks": [
                 { "pos": [0, 0, 0], "block_id": "minecraft:chest", "properties": { "facing": "north" },
                   "block_entity_ref": "loot_chest" } ] }"#,
            options,
        )
        .unwrap();
        assert_eq!(structure.size, Size::new(3, 1, 2));
        assert_eq!(structure.blocks[0].pos, Pos::new(2, 0, 0));
        let nbt = structure.blocks[0].nbt.as_ref().unwrap();
        assert_eq!(nbt.get("id"), Some(&Tag::String("minecraft:chest".into())));
    }

    #[test]
    fn test_entities_gated_by_flag() {
        let text = r#"{ "size": [2, 2, 2], "blocks": [],
             "entities": [{ "pos": [1.5, 0.0, 1.5], "block_pos": [1, 0, 1], "entity_ref": "nurse" }] }"#;
        assert!(compile(text, CompileOptions::default()).unwrap().entities.is_empty());

        let options = CompileOptions {
            include_entities: true,
            ..CompileOptions::default()
        };
        let structure = compile(text, options).unwrap();
        assert_eq!(structure.entities.len(), 1);
        assert_eq!(structure.entities[0].block_pos, Pos::new(1, 0, 1));
    }

    #[test]
    fn test_missing_entity_template_fails_even_when_excluded() {
        let err = compile(
            r#"{ "size": [2, 2, 2], "blocks": [],
                 "entities": [{ "pos": [0.5, 0.0, 0.5], "block_pos": [0, 0, 0], "entity_ref": "ghost" }] }"#,
            CompileOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TemplateNotFound);
    }

    fn jigsaw(pos: &str, pool: &str, joint: &str) -> String {
        format!(
            r#"{{ "pos": {}, "orientation": "north_up", "name": "entrance", "pool": "{}",
                 "target_pool": "minecraft:street", "joint": "{}" }}"#,
            pos, pool, joint
        )
    }

    #[test]
    fn test_single_entrance_policy() {
        let plan = |jigsaws: &[String]| {
            format!(
                r#"{{ "size": [3, 1, 3], "jigsaw_policy": "single_entrance", "blocks": [], "jigsaws": [{}] }}"#,
                jigsaws.join(",")
            )
        };

        let err = compile(&plan(&[]), CompileOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JigsawInvalid);

        let two = [jigsaw("[0, 0, 0]", "acm:streets", "aligned"), jigsaw("[2, 0, 0]", "acm:streets", "aligned")];
        let err = compile(&plan(&two), CompileOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JigsawInvalid);

        let one = [jigsaw("[1, 0, 0]", "acm:streets", "aligned")];
        let structure = compile(&plan(&one), CompileOptions::default()).unwrap();
        assert_eq!(structure.palette[0].name, JIGSAW_BLOCK);
        let nbt = structure.blocks[0].nbt.as_ref().unwrap();
        let keys: Vec<&str> = nbt.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "target", "pool", "final_state", "joint"]);
        assert_eq!(nbt.get("name"), Some(&Tag::String("minecraft:entrance".into())));
    }

    #[test]
    fn test_jigsaw_syntax() {
        let plan = |j: String| format!(r#"{{ "size": [3, 1, 3], "blocks": [], "jigsaws": [{}] }}"#, j);

        let err = compile(&plan(jigsaw("[0, 0, 0]", "Bad Pool!", "aligned")), CompileOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JigsawInvalid);

        let err = compile(&plan(jigsaw("[0, 0, 0]", "acm:streets", "sticky")), CompileOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JigsawInvalid);

        assert!(compile(&plan(jigsaw("[0, 0, 0]", "village/streets", "rollable")), CompileOptions::default()).is_ok());
    }

    #[test]
    fn test_jigsaw_replaces_block() {
        let structure = compile(
            &format!(
                r#"{{ "size": [3, 1, 3], "blocks": [{{ "pos": [1, 0, 0], "block_id": "minecraft:stone" }}],
                     "jigsaws": [{}] }}"#,
                jigsaw("[1, 0, 0]", "acm:streets", "aligned")
            ),
            CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(structure.blocks.len(), 1);
        assert_eq!(structure.palette.len(), 1);
        assert_eq!(structure.palette[0].name, JIGSAW_BLOCK);
    }

    #[test]
    fn test_jigsaw_keeps_block_entity_of_replaced_block() {
        let structure = compile(
            &format!(
                r#"{{ "size": [3, 1, 3], "blocks": [
                     {{ "pos": [1, 0, 0], "block_id": "minecraft:chest", "properties": {{ "facing": "north" }},
                        "block_entity_ref": "loot_chest" }} ],
                     "jigsaws": [{}] }}"#,
                jigsaw("[1, 0, 0]", "acm:streets", "aligned")
            ),
            CompileOptions::default(),
        )
        .unwrap();
        assert_eq!(structure.blocks.len(), 1);
        assert_eq!(structure.palette[0].name, JIGSAW_BLOCK);
        let nbt = structure.blocks[0].nbt.as_ref().unwrap();
        let keys: Vec<&str> = nbt.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["name", "target", "pool", "final_state", "joint", "id"]);
        assert_eq!(nbt.get("id"), Some(&Tag::String("minecraft:chest".into())));
        assert_eq!(nbt.get("pool"), Some(&Tag::String("acm:streets".into())));
    }

    #[test]
    fn test_bad_orientation_is_a_jigsaw_error() {
        let text = r#"{ "size": [3, 1, 3], "blocks": [],
             "jigsaws": [{ "pos": [0, 0, 0], "orientation": "sideways_up", "name": "entrance",
                           "pool": "acm:streets", "target_pool": "minecraft:street", "joint": "aligned" }] }"#;
        let err = compile(text, CompileOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JigsawInvalid);

        // same answer when the allowlist has no jigsaw entry at all
        let mut ctx = context();
        ctx.allowlist = Allowlist::default().allow("minecraft:stone", []);
        let err = compile_plan(&parse_plan(text).unwrap(), None, &ctx, &CompileOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::JigsawInvalid);
    }

    #[test]
    fn test_identity_transform_keeps_block_set() {
        let text = r#"{ "size": [2, 1, 2], "blocks": [
             { "pos": [1, 0, 1], "block_id": "minecraft:oak_stairs", "properties": { "facing": "west", "half": "top" } },
             { "pos": [0, 0, 0], "block_id": "mineral:brick" } ] }"#;
        let plan = parse_plan(text).unwrap();
        let structure = compile_plan(&plan, None, &context(), &CompileOptions::default()).unwrap();

        let mut expected: Vec<(Pos, PaletteEntry)> = plan
            .blocks
            .iter()
            .map(|b| match &b.state {
                StateRef::Direct(s) => (b.pos, PaletteEntry::from(s)),
                StateRef::Material(_) => unreachable!(),
            })
            .collect();
        expected.sort();
        let actual: Vec<(Pos, PaletteEntry)> = structure
            .blocks
            .iter()
            .map(|b| (b.pos, structure.palette[b.palette_index].clone()))
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_namespaced_id() {
        assert_eq!(namespaced_id("acm:village/streets"), Some("acm:village/streets".into()));
        assert_eq!(namespaced_id("street"), Some("minecraft:street".into()));
        assert_eq!(namespaced_id("ACM:Streets"), None);
        assert_eq!(namespaced_id("a:b:c"), None);
        assert_eq!(namespaced_id(""), None);
    }
}
