//! Plan model and loader.
//!
//! A plan file is parsed into raw documents first and then normalized into
//! [`Plan`]. JSON syntax problems surface as [`CompileError::Parse`]; missing
//! or mistyped fields and any semantic shape problem as
//! [`CompileError::Schema`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::error::Category;

use crate::error::CompileError;
use crate::geometry::Placement;

pub const SCHEMA_VERSION: u32 = 1;
pub const SUPPORTED_BIOMES: [&str; 5] = ["plains", "desert", "savanna", "snowy", "taiga"];

static STATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[a-z0-9_./-]+:[a-z0-9_./-]+)(?:\[(?P<props>.*)\])?$")
        .unwrap_or_else(|e| panic!("invalid block state pattern: {}", e))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Pos { x, y, z }
    }
}

impl From<[i32; 3]> for Pos {
    fn from([x, y, z]: [i32; 3]) -> Self {
        Pos { x, y, z }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Extent of a plan: `w` along x, `h` along y, `l` along z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub w: i32,
    pub h: i32,
    pub l: i32,
}

impl Size {
    pub const fn new(w: i32, h: i32, l: i32) -> Self {
        Size { w, h, l }
    }

    pub fn contains(&self, pos: Pos) -> bool {
        (0..self.w).contains(&pos.x) && (0..self.h).contains(&pos.y) && (0..self.l).contains(&pos.z)
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.w, self.h, self.l)
    }
}

/// A block property value as written in a plan.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    String(String),
}

/// The string form used for allowlist comparison and in the container.
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Int(i) => write!(f, "{}", i),
            PropertyValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    pub block_id: String,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl BlockState {
    pub fn new(block_id: impl Into<String>) -> Self {
        BlockState {
            block_id: block_id.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Parses `namespace:id[key=value,...]`.
    pub fn parse(state: &str) -> Result<Self, String> {
        let caps = STATE_RE
            .captures(state.trim())
            .ok_or_else(|| format!("invalid block state syntax: {}", state))?;
        let mut parsed = BlockState::new(&caps["name"]);

        if let Some(props) = caps.name("props") {
            for segment in props.as_str().split(',').map(str::trim) {
                if segment.is_empty() {
                    continue;
                }
                let (key, value) = segment
                    .split_once('=')
                    .map(|(k, v)| (k.trim(), v.trim()))
                    .filter(|(k, v)| !k.is_empty() && !v.is_empty())
                    .ok_or_else(|| {
                        format!("invalid property segment '{}' in state '{}'", segment, state)
                    })?;
                if parsed.properties.contains_key(key) {
                    return Err(format!("duplicate property '{}' in state '{}'", key, state));
                }
                parsed.properties.insert(key.to_owned(), PropertyValue::from(value));
            }
        }
        Ok(parsed)
    }
}

/// Canonical `id[k=v,...]` form with keys sorted.
impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.block_id)?;
        if !self.properties.is_empty() {
            let props: Vec<String> = self
                .properties
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "[{}]", props.join(","))?;
        }
        Ok(())
    }
}

/// Where a block gets its state from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateRef {
    Direct(BlockState),
    /// Resolved through the plan's biome palettes.
    Material(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub pos: Pos,
    pub state: StateRef,
    pub block_entity_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Jigsaw {
    pub pos: Pos,
    pub orientation: String,
    pub name: String,
    pub pool: String,
    pub target_pool: String,
    pub joint: String,
    pub final_state: BlockState,
}

/// An entity keeps the point it was authored at plus the transform applied
/// so far, so that its placed position is computed once from the original
/// coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRef {
    pub authored_pos: [f64; 3],
    pub placement: Placement,
    pub block_pos: Pos,
    pub entity_ref: String,
}

impl EntityRef {
    pub fn pos(&self) -> [f64; 3] {
        self.placement.apply(self.authored_pos)
    }
}

/// How many jigsaw connectors a plan must carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JigsawPolicy {
    #[default]
    Unrestricted,
    AtLeastOne,
    SingleEntrance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub id: Option<String>,
    pub size: Size,
    pub blocks: Vec<Block>,
    pub entities: Vec<EntityRef>,
    pub jigsaws: Vec<Jigsaw>,
    pub jigsaw_policy: JigsawPolicy,
    /// biome -> material key -> state
    pub palettes: BTreeMap<String, BTreeMap<String, BlockState>>,
    pub tags: Vec<String>,
}

impl Plan {
    pub fn new(size: Size) -> Self {
        Plan {
            id: None,
            size,
            blocks: Vec::new(),
            entities: Vec::new(),
            jigsaws: Vec::new(),
            jigsaw_policy: JigsawPolicy::default(),
            palettes: BTreeMap::new(),
            tags: Vec::new(),
        }
    }

    pub fn has_palettes(&self) -> bool {
        !self.palettes.is_empty()
    }

    /// Replaces every material reference with the state the given biome maps it to.
    pub fn bind_biome(&self, biome: Option<&str>) -> Result<Plan, CompileError> {
        let palette = match biome {
            Some(biome) => Some(self.palettes.get(biome).ok_or_else(|| {
                CompileError::schema(format!("no palette defined for biome '{}'", biome))
            })?),
            None => None,
        };

        let mut bound = self.clone();
        for block in &mut bound.blocks {
            if let StateRef::Material(key) = &block.state {
                let state = palette
                    .and_then(|p| p.get(key))
                    .ok_or_else(|| {
                        CompileError::schema(format!(
                            "material_key '{}' at {} has no mapping{}",
                            key,
                            block.pos,
                            biome.map(|b| format!(" in biome '{}'", b)).unwrap_or_default()
                        ))
                    })?
                    .clone();
                block.state = StateRef::Direct(state);
            }
        }
        Ok(bound)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanDocument {
    #[serde(default)]
    schema_version: Option<u32>,
    #[serde(default)]
    id: Option<String>,
    size: [i32; 3],
    blocks: Vec<BlockDocument>,
    #[serde(default)]
    jigsaws: Vec<JigsawDocument>,
    #[serde(default)]
    entities: Vec<EntityDocument>,
    #[serde(default)]
    jigsaw_policy: JigsawPolicy,
    #[serde(default)]
    palettes: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct BlockDocument {
    pos: [i32; 3],
    #[serde(default)]
    block_id: Option<String>,
    #[serde(default)]
    properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    material_key: Option<String>,
    #[serde(default)]
    block_entity_ref: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct JigsawDocument {
    pos: [i32; 3],
    orientation: String,
    name: String,
    pool: String,
    target_pool: String,
    joint: String,
    #[serde(default = "default_final_state")]
    final_state: String,
}

fn default_final_state() -> String {
    "minecraft:air".to_owned()
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityDocument {
    pos: [f64; 3],
    block_pos: [i32; 3],
    entity_ref: String,
}

/// Reads and normalizes a plan file.
pub fn load_plan(path: &Path) -> Result<Plan, CompileError> {
    let text = fs::read_to_string(path).map_err(|e| CompileError::io(path, e))?;
    parse_plan(&text)
}

pub fn parse_plan(text: &str) -> Result<Plan, CompileError> {
    let document: PlanDocument = serde_json::from_str(text).map_err(|e| match e.classify() {
        Category::Data => CompileError::schema(e.to_string()),
        Category::Syntax | Category::Eof | Category::Io => CompileError::Parse { source: e },
    })?;
    normalize(document)
}

fn non_empty(value: &str, context: &str) -> Result<(), CompileError> {
    if value.trim().is_empty() {
        return Err(CompileError::schema(format!("{} must be a non-empty string", context)));
    }
    Ok(())
}

fn normalize(document: PlanDocument) -> Result<Plan, CompileError> {
    if let Some(version) = document.schema_version {
        if version != SCHEMA_VERSION {
            return Err(CompileError::schema(format!(
                "schema_version must be {}, got {}",
                SCHEMA_VERSION, version
            )));
        }
    }
    if let Some(id) = &document.id {
        non_empty(id, "id")?;
    }

    let [w, h, l] = document.size;
    if w <= 0 || h <= 0 || l <= 0 {
        return Err(CompileError::schema(format!(
            "size must be three integers > 0, got [{}, {}, {}]",
            w, h, l
        )));
    }

    let palettes = normalize_palettes(document.palettes)?;

    let mut seen = BTreeSet::new();
    let mut blocks = Vec::with_capacity(document.blocks.len());
    for (i, raw) in document.blocks.into_iter().enumerate() {
        let pos = Pos::from(raw.pos);
        if !seen.insert(pos) {
            return Err(CompileError::schema(format!(
                "blocks[{}]: duplicate position {}",
                i, pos
            )));
        }

        let state = match (raw.block_id, raw.material_key) {
            (Some(block_id), None) => {
                non_empty(&block_id, &format!("blocks[{}].block_id", i))?;
                StateRef::Direct(BlockState {
                    block_id,
                    properties: raw.properties,
                })
            }
            (None, Some(key)) => {
                if !raw.properties.is_empty() {
                    return Err(CompileError::schema(format!(
                        "blocks[{}]: properties cannot be combined with material_key",
                        i
                    )));
                }
                if !palettes.is_empty() {
                    if let Some((biome, _)) = palettes.iter().find(|(_, p)| !p.contains_key(&key)) {
                        return Err(CompileError::schema(format!(
                            "blocks[{}]: material_key '{}' missing in palettes.{}",
                            i, key, biome
                        )));
                    }
                }
                StateRef::Material(key)
            }
            (Some(_), Some(_)) => {
                return Err(CompileError::schema(format!(
                    "blocks[{}]: block_id and material_key are mutually exclusive",
                    i
                )))
            }
            (None, None) => {
                return Err(CompileError::schema(format!(
                    "blocks[{}]: one of block_id or material_key is required",
                    i
                )))
            }
        };

        if let Some(name) = &raw.block_entity_ref {
            non_empty(name, &format!("blocks[{}].block_entity_ref", i))?;
        }

        blocks.push(Block {
            pos,
            state,
            block_entity_ref: raw.block_entity_ref,
        });
    }

    let jigsaws = document
        .jigsaws
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let final_state = BlockState::parse(&raw.final_state)
                .map_err(|e| CompileError::schema(format!("jigsaws[{}].final_state: {}", i, e)))?;
            Ok(Jigsaw {
                pos: Pos::from(raw.pos),
                orientation: raw.orientation,
                name: raw.name,
                pool: raw.pool,
                target_pool: raw.target_pool,
                joint: raw.joint,
                final_state,
            })
        })
        .collect::<Result<Vec<_>, CompileError>>()?;

    let entities = document
        .entities
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            non_empty(&raw.entity_ref, &format!("entities[{}].entity_ref", i))?;
            if raw.pos.iter().any(|c| !c.is_finite()) {
                return Err(CompileError::schema(format!("entities[{}].pos must be finite", i)));
            }
            Ok(EntityRef {
                authored_pos: raw.pos,
                placement: Placement::identity(Size::new(w, h, l)),
                block_pos: Pos::from(raw.block_pos),
                entity_ref: raw.entity_ref,
            })
        })
        .collect::<Result<Vec<_>, CompileError>>()?;

    Ok(Plan {
        id: document.id,
        size: Size::new(w, h, l),
        blocks,
        entities,
        jigsaws,
        jigsaw_policy: document.jigsaw_policy,
        palettes,
        tags: document.tags,
    })
}

fn normalize_palettes(
    raw: BTreeMap<String, BTreeMap<String, String>>,
) -> Result<BTreeMap<String, BTreeMap<String, BlockState>>, CompileError> {
    if raw.is_empty() {
        return Ok(BTreeMap::new());
    }

    let keys: BTreeSet<&str> = raw.keys().map(String::as_str).collect();
    let expected: BTreeSet<&str> = SUPPORTED_BIOMES.into_iter().collect();
    if keys != expected {
        let missing: Vec<&str> = expected.difference(&keys).copied().collect();
        let unknown: Vec<&str> = keys.difference(&expected).copied().collect();
        return Err(CompileError::schema(format!(
            "palettes must define exactly {} (missing: [{}], unknown: [{}])",
            SUPPORTED_BIOMES.join(", "),
            missing.join(", "),
            unknown.join(", ")
        )));
    }

    let mut palettes = BTreeMap::new();
    for (biome, materials) in raw {
        let mut parsed = BTreeMap::new();
        for (key, state) in materials {
            non_empty(&key, &format!("palettes.{} material key", biome))?;
            let state = BlockState::parse(&state)
                .map_err(|e| CompileError::schema(format!("palettes.{}.{}: {}", biome, key, e)))?;
            parsed.insert(key, state);
        }
        palettes.insert(biome, parsed);
    }
    Ok(palettes)
}
