//! OBJ geometry parser.
//!
//! The file is read line by line into append-only attribute pools. Faces are
//! fan-triangulated and every distinct (position, texcoord, normal, color)
//! reference tuple becomes one emitted vertex of the geometry that is open at
//! that point. `usemtl`, `o` and `g` close the open geometry if it already
//! has faces; the next face opens a fresh one.

use std::{
    collections::HashMap,
    fs,
    io::{BufRead, Read},
    path::Path,
};

use anyhow::{Context, Result};

use crate::error::{FaceError, ParseError, ReferenceError};
use crate::index::parse_reference;
use crate::mesh::{DEFAULT_COLOR, DEFAULT_NORMAL, DEFAULT_TEXCOORD, Geometry, VertexAttribute};

pub const DEFAULT_OBJECT: &str = "default";
pub const DEFAULT_GROUP: &str = "default";

/// Geometries and referenced material libraries of one OBJ source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjData {
    pub geometries: Vec<Geometry>,
    /// `mtllib` filenames in declaration order, duplicates kept.
    pub material_libraries: Vec<String>,
}

/// Shape of a single face reference: which optional slash-separated slots
/// carry an index. The position slot is always filled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FaceLayout {
    pub texcoord: bool,
    pub normal: bool,
    pub color: bool,
}

impl FaceLayout {
    /// `p`, `p/` or `p//`
    pub const POSITION: Self = Self::new(false, false, false);
    /// `p/t`
    pub const POSITION_TEXCOORD: Self = Self::new(true, false, false);
    /// `p//n`
    pub const POSITION_NORMAL: Self = Self::new(false, true, false);
    /// `p/t/n`
    pub const POSITION_TEXCOORD_NORMAL: Self = Self::new(true, true, false);
    /// `p/t/n/c`
    pub const POSITION_TEXCOORD_NORMAL_COLOR: Self = Self::new(true, true, true);

    pub const fn new(texcoord: bool, normal: bool, color: bool) -> Self {
        Self {
            texcoord,
            normal,
            color,
        }
    }
}

/// Load and parse an OBJ file.
pub fn load_obj_from_path(path: impl AsRef<Path>) -> Result<ObjData> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    log::info!("Parsing OBJ file {}", path.display());
    parse_obj(&contents).with_context(|| format!("Failed to parse OBJ file: {}", path.display()))
}

/// Load an OBJ source from a [`BufRead`] implementation.
pub fn load_obj_from_reader<R: BufRead>(mut reader: R) -> Result<ObjData> {
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .context("Failed to read OBJ data")?;
    Ok(parse_obj(&contents)?)
}

/// Parse OBJ text. Empty input yields no geometries.
pub fn parse_obj(text: &str) -> Result<ObjData, ParseError> {
    let mut parser = ObjParser::default();
    for (line_no, line) in text.lines().enumerate() {
        parser.parse_line(line_no + 1, line)?;
    }
    Ok(parser.finish())
}

#[derive(Default)]
struct Pools {
    positions: Vec<[f32; 3]>,
    /// Aligned with `positions`; `None` where the `v` line had no color.
    colors: Vec<Option<[f32; 3]>>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
}

impl Pools {
    fn resolve(&self, raw: &RawReference<'_>) -> Result<VertexKey, ReferenceError> {
        let position = parse_reference(raw.position, self.positions.len())?;
        let texcoord = raw
            .texcoord
            .map(|t| parse_reference(t, self.texcoords.len()))
            .transpose()?;
        let normal = raw
            .normal
            .map(|n| parse_reference(n, self.normals.len()))
            .transpose()?;
        let color_index = match raw.color {
            Some(c) => parse_reference(c, self.colors.len())?,
            None => position,
        };
        let color = self.colors[color_index].map(|_| color_index);

        Ok(VertexKey {
            position,
            texcoord,
            normal,
            color,
        })
    }
}

struct RawReference<'a> {
    position: &'a str,
    texcoord: Option<&'a str>,
    normal: Option<&'a str>,
    color: Option<&'a str>,
}

fn split_reference(token: &str) -> Option<(FaceLayout, RawReference<'_>)> {
    let mut parts = token.split('/');
    let position = parts.next().filter(|p| !p.is_empty())?;
    let texcoord = non_empty(parts.next());
    let normal = non_empty(parts.next());
    let color = non_empty(parts.next());
    if parts.next().is_some() {
        return None;
    }

    let layout = FaceLayout::new(texcoord.is_some(), normal.is_some(), color.is_some());
    Some((
        layout,
        RawReference {
            position,
            texcoord,
            normal,
            color,
        },
    ))
}

fn non_empty(part: Option<&str>) -> Option<&str> {
    part.filter(|p| !p.is_empty())
}

/// Resolved pool indices of one face reference; the deduplication key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
struct VertexKey {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
    color: Option<usize>,
}

#[derive(Clone, Debug, PartialEq)]
struct Selection {
    object: String,
    groups: Vec<String>,
    material: Option<String>,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            object: DEFAULT_OBJECT.to_string(),
            groups: vec![DEFAULT_GROUP.to_string()],
            material: None,
        }
    }
}

/// Geometry being filled. Attribute vectors are parallel and indexed by slot.
struct GeometryBuilder {
    selection: Selection,
    slots: HashMap<VertexKey, u32>,
    positions: Vec<[f32; 3]>,
    texcoords: Vec<Option<[f32; 2]>>,
    normals: Vec<Option<[f32; 3]>>,
    colors: Vec<Option<[f32; 3]>>,
    indices: Vec<u32>,
}

impl GeometryBuilder {
    fn new(selection: Selection) -> Self {
        Self {
            selection,
            slots: HashMap::new(),
            positions: Vec::new(),
            texcoords: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn has_faces(&self) -> bool {
        !self.indices.is_empty()
    }

    fn slot(&mut self, key: VertexKey, pools: &Pools) -> Result<u32, FaceError> {
        if let Some(&slot) = self.slots.get(&key) {
            return Ok(slot);
        }

        let slot = u32::try_from(self.positions.len()).map_err(|_| FaceError::TooManyVertices)?;
        self.positions.push(pools.positions[key.position]);
        self.texcoords.push(key.texcoord.map(|i| pools.texcoords[i]));
        self.normals.push(key.normal.map(|i| pools.normals[i]));
        self.colors.push(key.color.and_then(|i| pools.colors[i]));
        self.slots.insert(key, slot);
        Ok(slot)
    }

    /// Fan-triangulate around the first slot: `(v0, vi, vi+1)`.
    fn push_polygon(&mut self, slots: &[u32]) {
        for i in 1..slots.len() - 1 {
            self.indices.extend_from_slice(&[slots[0], slots[i], slots[i + 1]]);
        }
    }

    fn finish(self) -> Geometry {
        let Selection {
            object,
            groups,
            material,
        } = self.selection;

        Geometry {
            object,
            groups,
            material,
            positions: self.positions,
            texcoords: VertexAttribute::from_optional(self.texcoords, DEFAULT_TEXCOORD),
            normals: VertexAttribute::from_optional(self.normals, DEFAULT_NORMAL),
            colors: VertexAttribute::from_optional(self.colors, DEFAULT_COLOR),
            tangents: None,
            indices: self.indices,
        }
    }
}

enum Declaration {
    Object(String),
    Groups(Vec<String>),
    Material(String),
}

/// Current object/group/material selection plus the geometry being filled.
#[derive(Default)]
struct ParseContext {
    selection: Selection,
    open: Option<GeometryBuilder>,
}

impl ParseContext {
    /// Apply a declaration, returning the geometry it closed, if any.
    fn declare(self, declaration: Declaration) -> (Option<Geometry>, Self) {
        let Self {
            mut selection,
            open,
        } = self;

        match declaration {
            Declaration::Object(name) => selection.object = name,
            Declaration::Groups(names) => selection.groups = names,
            Declaration::Material(name) => selection.material = Some(name),
        }

        let closed = open
            .filter(GeometryBuilder::has_faces)
            .map(GeometryBuilder::finish);
        (
            closed,
            Self {
                selection,
                open: None,
            },
        )
    }

    fn geometry(&mut self) -> &mut GeometryBuilder {
        let selection = &self.selection;
        self.open
            .get_or_insert_with(|| GeometryBuilder::new(selection.clone()))
    }

    fn finish(self) -> Option<Geometry> {
        self.open
            .filter(GeometryBuilder::has_faces)
            .map(GeometryBuilder::finish)
    }
}

#[derive(Default)]
struct ObjParser {
    pools: Pools,
    /// Inferred from the first face reference of the file.
    layout: Option<FaceLayout>,
    context: ParseContext,
    output: ObjData,
}

impl ObjParser {
    fn parse_line(&mut self, line_no: usize, line: &str) -> Result<(), ParseError> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(());
        }

        let (keyword, rest) = split_keyword(trimmed);
        match keyword {
            "v" => {
                let values = parse_floats(rest, line_no, line)?;
                let (position, color) = match values.as_slice() {
                    [x, y, z, r, g, b, ..] => ([*x, *y, *z], Some([*r, *g, *b])),
                    [x, y, z, ..] => ([*x, *y, *z], None),
                    _ => return Err(malformed_number(line_no, line)),
                };
                self.pools.positions.push(position);
                self.pools.colors.push(color);
            }
            "vt" => {
                let values = parse_floats(rest, line_no, line)?;
                let texcoord = match values.as_slice() {
                    [u] => [*u, 0.0],
                    [u, v, ..] => [*u, *v],
                    [] => return Err(malformed_number(line_no, line)),
                };
                self.pools.texcoords.push(texcoord);
            }
            "vn" => {
                let values = parse_floats(rest, line_no, line)?;
                let normal = match values.as_slice() {
                    [x, y, z, ..] => [*x, *y, *z],
                    _ => return Err(malformed_number(line_no, line)),
                };
                self.pools.normals.push(normal);
            }
            "f" => self.parse_face(rest, line_no, line)?,
            "mtllib" => self
                .output
                .material_libraries
                .extend(rest.split_whitespace().map(str::to_string)),
            "usemtl" => self.declare(Declaration::Material(rest.to_string())),
            "o" => {
                let name = if rest.is_empty() { DEFAULT_OBJECT } else { rest };
                self.declare(Declaration::Object(name.to_string()));
            }
            "g" => {
                let mut groups: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
                if groups.is_empty() {
                    groups.push(DEFAULT_GROUP.to_string());
                }
                self.declare(Declaration::Groups(groups));
            }
            other => {
                log::debug!("Skipping unsupported OBJ record '{}' on line {}", other, line_no);
            }
        }

        Ok(())
    }

    fn declare(&mut self, declaration: Declaration) {
        let (closed, context) = std::mem::take(&mut self.context).declare(declaration);
        self.context = context;
        self.output.geometries.extend(closed);
    }

    fn parse_face(&mut self, rest: &str, line_no: usize, line: &str) -> Result<(), ParseError> {
        let face_error = |reason: FaceError| ParseError::MalformedFace {
            line: line_no,
            text: line.to_string(),
            reason,
        };

        let tokens: Vec<&str> = rest.split_whitespace().collect();
        if tokens.len() < 3 {
            return Err(face_error(FaceError::TooFewReferences(tokens.len())));
        }

        let mut keys = Vec::with_capacity(tokens.len());
        for token in tokens {
            let (layout, raw) = split_reference(token)
                .ok_or_else(|| face_error(FaceError::UnrecognizedReference(token.to_string())))?;
            let expected = *self.layout.get_or_insert(layout);
            if layout != expected {
                return Err(face_error(FaceError::LayoutMismatch {
                    expected,
                    found: layout,
                }));
            }
            let key = self
                .pools
                .resolve(&raw)
                .map_err(|source| ParseError::MalformedReference {
                    line: line_no,
                    text: line.to_string(),
                    source,
                })?;
            keys.push(key);
        }

        let pools = &self.pools;
        let geometry = self.context.geometry();
        let slots = keys
            .into_iter()
            .map(|key| geometry.slot(key, pools))
            .collect::<Result<Vec<_>, _>>()
            .map_err(face_error)?;
        geometry.push_polygon(&slots);
        Ok(())
    }

    fn finish(self) -> ObjData {
        let Self {
            pools,
            context,
            mut output,
            ..
        } = self;
        output.geometries.extend(context.finish());

        log::debug!(
            "Parsed OBJ: {} positions, {} texcoords, {} normals into {} geometries",
            pools.positions.len(),
            pools.texcoords.len(),
            pools.normals.len(),
            output.geometries.len()
        );
        output
    }
}

fn split_keyword(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (line, ""),
    }
}

fn parse_floats(rest: &str, line_no: usize, line: &str) -> Result<Vec<f32>, ParseError> {
    rest.split_whitespace()
        .map(|token| token.parse::<f32>().map_err(|_| malformed_number(line_no, line)))
        .collect()
}

fn malformed_number(line_no: usize, line: &str) -> ParseError {
    ParseError::MalformedNumber {
        line: line_no,
        text: line.to_string(),
    }
}
