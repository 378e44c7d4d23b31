//! MTL material parser and renderer-side material defaults.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::Path,
};

use anyhow::{Context, Result};

use crate::error::ParseError;

/// Materials by name.
pub type MaterialLibrary = HashMap<String, Material>;

pub const DEFAULT_DIFFUSE: [f32; 3] = [1.0, 1.0, 1.0];
pub const DEFAULT_AMBIENT: [f32; 3] = [0.0, 0.0, 0.0];
pub const DEFAULT_SPECULAR: [f32; 3] = [1.0, 1.0, 1.0];
pub const DEFAULT_EMISSIVE: [f32; 3] = [0.0, 0.0, 0.0];
pub const DEFAULT_SHININESS: f32 = 400.0;
pub const DEFAULT_OPACITY: f32 = 1.0;

/// Named texture-map slot of a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TextureSlot {
    Diffuse,
    Ambient,
    Specular,
    Normal,
    Opacity,
}

impl TextureSlot {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "map_Kd" => Some(TextureSlot::Diffuse),
            "map_Ka" => Some(TextureSlot::Ambient),
            "map_Ks" | "map_Ns" => Some(TextureSlot::Specular),
            "map_Bump" | "map_bump" | "bump" | "norm" => Some(TextureSlot::Normal),
            "map_d" => Some(TextureSlot::Opacity),
            _ => None,
        }
    }
}

/// A material as declared in the file; unset fields stay `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Option<[f32; 3]>,
    pub diffuse: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub emissive: Option<[f32; 3]>,
    pub shininess: Option<f32>,
    pub opacity: Option<f32>,
    pub optical_density: Option<f32>,
    pub illumination: Option<u32>,
    /// Texture filenames exactly as written, unresolved.
    pub maps: BTreeMap<TextureSlot, String>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn texture_map(&self, slot: TextureSlot) -> Option<&str> {
        self.maps.get(&slot).map(String::as_str)
    }

    /// Set texture slots in slot order.
    pub fn texture_maps(&self) -> impl Iterator<Item = (TextureSlot, &str)> + '_ {
        self.maps.iter().map(|(slot, file)| (*slot, file.as_str()))
    }

    fn apply(&mut self, property: Property) {
        match property {
            Property::Ambient(c) => self.ambient = Some(c),
            Property::Diffuse(c) => self.diffuse = Some(c),
            Property::Specular(c) => self.specular = Some(c),
            Property::Emissive(c) => self.emissive = Some(c),
            Property::Shininess(v) => self.shininess = Some(v),
            Property::Opacity(v) => self.opacity = Some(v),
            Property::Transparency(v) => self.opacity = Some(1.0 - v),
            Property::OpticalDensity(v) => self.optical_density = Some(v),
            Property::Illumination(v) => self.illumination = Some(v),
            Property::Map(slot, file) => {
                self.maps.insert(slot, file);
            }
        }
    }
}

/// A material with every renderer-facing field filled in.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedMaterial {
    pub name: Option<String>,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub emissive: [f32; 3],
    pub shininess: f32,
    pub opacity: f32,
    pub maps: BTreeMap<TextureSlot, String>,
}

impl Default for ResolvedMaterial {
    fn default() -> Self {
        Self {
            name: None,
            ambient: DEFAULT_AMBIENT,
            diffuse: DEFAULT_DIFFUSE,
            specular: DEFAULT_SPECULAR,
            emissive: DEFAULT_EMISSIVE,
            shininess: DEFAULT_SHININESS,
            opacity: DEFAULT_OPACITY,
            maps: BTreeMap::new(),
        }
    }
}

impl From<&Material> for ResolvedMaterial {
    fn from(m: &Material) -> Self {
        Self {
            name: Some(m.name.clone()),
            ambient: m.ambient.unwrap_or(DEFAULT_AMBIENT),
            diffuse: m.diffuse.unwrap_or(DEFAULT_DIFFUSE),
            specular: m.specular.unwrap_or(DEFAULT_SPECULAR),
            emissive: m.emissive.unwrap_or(DEFAULT_EMISSIVE),
            shininess: m.shininess.unwrap_or(DEFAULT_SHININESS),
            opacity: m.opacity.unwrap_or(DEFAULT_OPACITY),
            maps: m.maps.clone(),
        }
    }
}

impl ResolvedMaterial {
    /// Resolve `name` against `library`; absent or unknown names get the default.
    pub fn lookup(library: &MaterialLibrary, name: Option<&str>) -> Self {
        name.and_then(|n| library.get(n))
            .map(Self::from)
            .unwrap_or_default()
    }

    pub fn texture_map(&self, slot: TextureSlot) -> Option<&str> {
        self.maps.get(&slot).map(String::as_str)
    }
}

/// Load and parse an MTL file.
pub fn load_mtl_from_path(path: impl AsRef<Path>) -> Result<MaterialLibrary> {
    let mut library = MaterialLibrary::new();
    load_mtl_into(path, &mut library)?;
    Ok(library)
}

/// Load and parse an MTL file into `library`, see [`parse_mtl_into`].
/// A file that cannot be read fails with an [`std::io::Error`] in the chain.
pub fn load_mtl_into(path: impl AsRef<Path>, library: &mut MaterialLibrary) -> Result<()> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to open MTL file: {}", path.display()))?;
    log::info!("Parsing MTL file {}", path.display());
    parse_mtl_into(&contents, library)
        .with_context(|| format!("Failed to parse MTL file: {}", path.display()))
}

/// Parse MTL text into a fresh library.
pub fn parse_mtl(text: &str) -> Result<MaterialLibrary, ParseError> {
    let mut library = MaterialLibrary::new();
    parse_mtl_into(text, &mut library)?;
    Ok(library)
}

/// Parse MTL text into `library`. A name declared again replaces the
/// earlier material, including one from a previous call.
pub fn parse_mtl_into(text: &str, library: &mut MaterialLibrary) -> Result<(), ParseError> {
    let mut current: Option<Material> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((keyword, rest)) => (keyword, rest.trim()),
            None => (trimmed, ""),
        };

        if keyword == "newmtl" {
            if let Some(done) = current.replace(Material::new(rest)) {
                library.insert(done.name.clone(), done);
            }
            continue;
        }

        let Some(property) = parse_property(keyword, rest).ok_or_else(|| {
            ParseError::MalformedNumber {
                line: line_no,
                text: line.to_string(),
            }
        })?
        else {
            log::debug!("Skipping unsupported MTL record '{}' on line {}", keyword, line_no);
            continue;
        };

        let material = current
            .as_mut()
            .ok_or_else(|| ParseError::MaterialBeforeDeclaration {
                line: line_no,
                text: line.to_string(),
            })?;
        material.apply(property);
    }

    if let Some(done) = current {
        library.insert(done.name.clone(), done);
    }
    log::debug!("Parsed MTL: {} materials in library", library.len());
    Ok(())
}

enum Property {
    Ambient([f32; 3]),
    Diffuse([f32; 3]),
    Specular([f32; 3]),
    Emissive([f32; 3]),
    Shininess(f32),
    Opacity(f32),
    Transparency(f32),
    OpticalDensity(f32),
    Illumination(u32),
    Map(TextureSlot, String),
}

/// `None` when a value fails to parse; `Some(None)` for records that are
/// skipped.
fn parse_property(keyword: &str, rest: &str) -> Option<Option<Property>> {
    let property = match keyword {
        "Ka" | "Kd" | "Ks" | "Ke" if rest.starts_with("spectral") => return Some(None),
        "Ka" => Property::Ambient(parse_color(rest)?),
        "Kd" => Property::Diffuse(parse_color(rest)?),
        "Ks" => Property::Specular(parse_color(rest)?),
        "Ke" => Property::Emissive(parse_color(rest)?),
        "Ns" => Property::Shininess(parse_scalar(rest)?),
        "d" => Property::Opacity(parse_scalar(rest)?),
        "Tr" => Property::Transparency(parse_scalar(rest)?),
        "Ni" => Property::OpticalDensity(parse_scalar(rest)?),
        "illum" => Property::Illumination(rest.split_whitespace().next()?.parse().ok()?),
        other => match TextureSlot::from_keyword(other) {
            Some(slot) if !rest.is_empty() => Property::Map(slot, rest.to_string()),
            _ => return Some(None),
        },
    };
    Some(Some(property))
}

/// `r g b`, or a single value for grey. An `xyz` prefix is accepted and
/// the values are taken as-is.
fn parse_color(rest: &str) -> Option<[f32; 3]> {
    let rest = rest.strip_prefix("xyz").map_or(rest, str::trim_start);
    let values = rest
        .split_whitespace()
        .map(str::parse::<f32>)
        .collect::<Result<Vec<_>, _>>()
        .ok()?;
    match values.as_slice() {
        [grey] => Some([*grey; 3]),
        [r, g, b, ..] => Some([*r, *g, *b]),
        _ => None,
    }
}

fn parse_scalar(rest: &str) -> Option<f32> {
    rest.split_whitespace().next()?.parse().ok()
}
