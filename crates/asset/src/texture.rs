//! Texture data referenced by materials.
//! Maps are decoded to RGBA8; slots without a usable image fall back to 1x1
//! solid textures.

use std::{collections::HashMap, path::Path};

use crate::mtl::{MaterialLibrary, ResolvedMaterial, TextureSlot};

pub const DEFAULT_WHITE: [u8; 4] = [255, 255, 255, 255];
pub const DEFAULT_NORMAL: [u8; 4] = [127, 127, 255, 0];

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Wrap RGBA8 pixels; `None` if `data` does not hold `width * height` pixels.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        (data.len() == expected).then_some(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        })
    }

    /// Single-pixel texture of one color.
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            data: rgba.to_vec(),
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8,
        }
    }

    /// Load texture from an image file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {:?}", path);

        let img = image::open(path)
            .map_err(|e| anyhow::anyhow!("Failed to open image {:?}: {}", path, e))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();

        log::info!("Loaded texture {}x{} with {} bytes", width, height, data.len());

        Self::from_rgba8(width, height, data)
            .ok_or_else(|| anyhow::anyhow!("Decoded image {:?} has an unexpected size", path))
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size =
            (self.width as usize) * (self.height as usize) * (self.bytes_per_pixel() as usize);
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}

/// Filename part of a texture map statement: its last token, after any
/// `-option value` pairs.
pub fn map_filename(map: &str) -> &str {
    map.split_whitespace().next_back().unwrap_or(map)
}

/// Decoded texture maps keyed by the map string written in the material.
#[derive(Clone, Debug)]
pub struct TextureCache {
    textures: HashMap<String, TextureData>,
    white: TextureData,
    flat_normal: TextureData,
}

impl Default for TextureCache {
    fn default() -> Self {
        Self {
            textures: HashMap::new(),
            white: TextureData::solid(DEFAULT_WHITE),
            flat_normal: TextureData::solid(DEFAULT_NORMAL),
        }
    }
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every distinct map in `materials`, resolved against
    /// `base_dir`. Entries are keyed by the map string as written, options
    /// included. Files that fail to load are skipped with a warning.
    pub fn load_for(materials: &MaterialLibrary, base_dir: &Path) -> Self {
        let mut cache = Self::new();
        for material in materials.values() {
            for (_, map) in material.texture_maps() {
                if cache.textures.contains_key(map) {
                    continue;
                }
                match TextureData::load(base_dir.join(map_filename(map))) {
                    Ok(texture) => cache.insert(map, texture),
                    Err(err) => log::warn!(
                        "Skipping texture '{}' of material '{}': {:#}",
                        map,
                        material.name,
                        err
                    ),
                }
            }
        }
        cache
    }

    pub fn insert(&mut self, filename: impl Into<String>, texture: TextureData) {
        self.textures.insert(filename.into(), texture);
    }

    pub fn get(&self, filename: &str) -> Option<&TextureData> {
        self.textures.get(filename)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Texture bound to `slot` of `material`, or the solid fallback for that
    /// slot: flat normal for normal maps, white for everything else.
    pub fn texture_for(&self, material: &ResolvedMaterial, slot: TextureSlot) -> &TextureData {
        material
            .texture_map(slot)
            .and_then(|filename| self.get(filename))
            .unwrap_or(match slot {
                TextureSlot::Normal => &self.flat_normal,
                _ => &self.white,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mtl::{Material, parse_mtl};

    #[test]
    fn solid_textures_are_valid() {
        let white = TextureData::solid(DEFAULT_WHITE);
        assert!(white.is_valid());
        assert_eq!(white.width, 1);
        assert_eq!(white.data, vec![255, 255, 255, 255]);
    }

    #[test]
    fn rgba8_size_is_checked() {
        assert!(TextureData::from_rgba8(2, 2, vec![0; 16]).is_some());
        assert!(TextureData::from_rgba8(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn fallbacks_per_slot() {
        let cache = TextureCache::new();
        let material = ResolvedMaterial::default();
        assert_eq!(
            cache.texture_for(&material, TextureSlot::Diffuse).data,
            DEFAULT_WHITE.to_vec()
        );
        assert_eq!(
            cache.texture_for(&material, TextureSlot::Normal).data,
            DEFAULT_NORMAL.to_vec()
        );
    }

    #[test]
    fn cached_map_is_returned() {
        let lib = parse_mtl("newmtl M\nmap_Kd wood.png\n").unwrap();
        let mut cache = TextureCache::new();
        let texture = TextureData::from_rgba8(1, 1, vec![10, 20, 30, 255]).unwrap();
        cache.insert("wood.png", texture.clone());

        let resolved = ResolvedMaterial::from(&lib["M"]);
        assert_eq!(cache.texture_for(&resolved, TextureSlot::Diffuse), &texture);
        assert_eq!(
            cache.texture_for(&resolved, TextureSlot::Specular).data,
            DEFAULT_WHITE.to_vec()
        );
    }

    #[test]
    fn map_options_are_not_part_of_the_path() {
        assert_eq!(map_filename("wood.png"), "wood.png");
        assert_eq!(map_filename("-bm 0.5 body_normal.png"), "body_normal.png");
        assert_eq!(map_filename("-s 2 2 1 -o 0 0 0  tiles.png "), "tiles.png");
    }

    #[test]
    fn map_with_options_loads_from_disk() {
        let dir = std::env::temp_dir().join(format!("texture-options-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        image::RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 255]))
            .save(dir.join("body_normal.png"))
            .unwrap();

        let lib = parse_mtl("newmtl Body\nmap_Bump -bm 0.5 body_normal.png\n").unwrap();
        let cache = TextureCache::load_for(&lib, &dir);
        assert_eq!(cache.len(), 1);
        let normal = cache.get("-bm 0.5 body_normal.png").unwrap();
        assert_eq!(normal.data, vec![1, 2, 3, 255]);

        let resolved = ResolvedMaterial::from(&lib["Body"]);
        assert_eq!(cache.texture_for(&resolved, TextureSlot::Normal), normal);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_files_are_skipped() {
        let mut lib = MaterialLibrary::new();
        let mut m = Material::new("M");
        m.maps.insert(TextureSlot::Diffuse, "no_such_texture.png".to_string());
        lib.insert(m.name.clone(), m);

        let cache = TextureCache::load_for(&lib, Path::new("definitely/not/here"));
        assert!(cache.is_empty());
    }
}
