//! Whole-model loading: geometry file, its material libraries, tangents and
//! extents in one step.

use std::{fs, io, path::Path};

use anyhow::{Context, Result};

use crate::extents::{Extents, compute_extents};
use crate::mesh::Geometry;
use crate::mtl::{MaterialLibrary, ResolvedMaterial, load_mtl_into, parse_mtl_into};
use crate::obj::parse_obj;

/// Knobs for [`load_model_from_path`] and [`Model::from_sources`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadOptions {
    pub generate_tangents: bool,
    pub load_materials: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            generate_tangents: true,
            load_materials: true,
        }
    }
}

/// A parsed model ready for upload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub geometries: Vec<Geometry>,
    pub materials: MaterialLibrary,
    /// `mtllib` filenames as written in the geometry file.
    pub material_libraries: Vec<String>,
    pub extents: Extents,
}

impl Model {
    /// Build a model from in-memory texts. `mtl_texts` are parsed in order
    /// into one library.
    pub fn from_sources(obj_text: &str, mtl_texts: &[&str], options: &LoadOptions) -> Result<Self> {
        let obj = parse_obj(obj_text).context("Failed to parse OBJ data")?;

        let mut materials = MaterialLibrary::new();
        if options.load_materials {
            for (i, text) in mtl_texts.iter().enumerate() {
                parse_mtl_into(text, &mut materials)
                    .with_context(|| format!("Failed to parse MTL source #{}", i))?;
            }
        }

        Self::assemble(obj.geometries, materials, obj.material_libraries, options)
    }

    fn assemble(
        mut geometries: Vec<Geometry>,
        materials: MaterialLibrary,
        material_libraries: Vec<String>,
        options: &LoadOptions,
    ) -> Result<Self> {
        if options.generate_tangents {
            for geometry in &mut geometries {
                geometry
                    .generate_tangents()
                    .with_context(|| format!("Failed to generate tangents for '{}'", geometry.name()))?;
            }
        }

        let extents = compute_extents(&geometries);
        let model = Self {
            geometries,
            materials,
            material_libraries,
            extents,
        };
        log::debug!(
            "Model: {} geometries, {} vertices, {} triangles, {} materials, extents {:?}",
            model.geometries.len(),
            model.vertex_count(),
            model.triangle_count(),
            model.materials.len(),
            model.extents
        );
        Ok(model)
    }

    /// Material the geometry renders with; unknown or missing names resolve
    /// to the default material.
    pub fn material_for(&self, geometry: &Geometry) -> ResolvedMaterial {
        ResolvedMaterial::lookup(&self.materials, geometry.material.as_deref())
    }

    pub fn vertex_count(&self) -> usize {
        self.geometries.iter().map(Geometry::vertex_count).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.geometries.iter().map(Geometry::triangle_count).sum()
    }
}

/// Load a geometry file together with the material libraries it references.
/// Libraries are looked up next to the geometry file; unreadable ones are
/// skipped with a warning.
pub fn load_model_from_path(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Model> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    log::info!("Loading model {}", path.display());
    let obj = parse_obj(&contents)
        .with_context(|| format!("Failed to parse OBJ file: {}", path.display()))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let mut materials = MaterialLibrary::new();
    if options.load_materials {
        for name in &obj.material_libraries {
            let mtl_path = base_dir.join(name);
            match load_mtl_into(&mtl_path, &mut materials) {
                Ok(()) => {}
                Err(err) if err.downcast_ref::<io::Error>().is_some() => {
                    log::warn!("Skipping material library: {:#}", err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    Model::assemble(obj.geometries, materials, obj.material_libraries, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::VertexAttribute;
    use crate::mtl::DEFAULT_SHININESS;
    use corelib::{Bounds, Vec3, vec3};

    const QUAD: &str = r#"
        mtllib quad.mtl
        v 0 0 0
        v 1 0 0
        v 1 1 0
        v 0 1 0
        vt 0 0
        vt 1 0
        vt 1 1
        vt 0 1
        vn 0 0 1
        usemtl red
        f 1/1/1 2/2/1 3/3/1
        usemtl missing
        f 1/1/1 3/3/1 4/4/1
    "#;

    const RED: &str = "newmtl red\nKd 1 0 0\nNs 10\n";

    #[test]
    fn default_options_enable_everything() {
        let o = LoadOptions::default();
        assert!(o.generate_tangents);
        assert!(o.load_materials);
    }

    #[test]
    fn builds_model_from_sources() {
        let model = Model::from_sources(QUAD, &[RED], &LoadOptions::default()).unwrap();
        assert_eq!(model.geometries.len(), 2);
        assert_eq!(model.material_libraries, vec!["quad.mtl".to_string()]);
        assert_eq!(model.vertex_count(), 6);
        assert_eq!(model.triangle_count(), 2);
        assert_eq!(
            model.extents,
            Extents::Bounded(Bounds::new(Vec3::ZERO, vec3(1.0, 1.0, 0.0)))
        );

        for g in &model.geometries {
            let tangents = g.tangents.as_ref().unwrap();
            assert_eq!(tangents.get(0), Some([1.0, 0.0, 0.0]));
        }

        let red = model.material_for(&model.geometries[0]);
        assert_eq!(red.diffuse, [1.0, 0.0, 0.0]);
        assert_eq!(red.shininess, 10.0);

        let fallback = model.material_for(&model.geometries[1]);
        assert_eq!(fallback, ResolvedMaterial::default());
        assert_eq!(fallback.shininess, DEFAULT_SHININESS);
    }

    #[test]
    fn options_turn_off_tangents_and_materials() {
        let options = LoadOptions {
            generate_tangents: false,
            load_materials: false,
        };
        let model = Model::from_sources(QUAD, &[RED], &options).unwrap();
        assert!(model.geometries.iter().all(|g| g.tangents.is_none()));
        assert!(model.materials.is_empty());
        assert_eq!(
            model.material_for(&model.geometries[0]),
            ResolvedMaterial::default()
        );
    }

    #[test]
    fn tangents_fall_back_without_texcoords() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let model = Model::from_sources(src, &[], &LoadOptions::default()).unwrap();
        assert_eq!(
            model.geometries[0].tangents,
            Some(VertexAttribute::Constant([1.0, 0.0, 0.0]))
        );
    }

    #[test]
    fn later_library_replaces_material() {
        let second = "newmtl red\nKd 0 0 1\n";
        let model = Model::from_sources(QUAD, &[RED, second], &LoadOptions::default()).unwrap();
        let red = model.material_for(&model.geometries[0]);
        assert_eq!(red.diffuse, [0.0, 0.0, 1.0]);
        assert_eq!(red.shininess, DEFAULT_SHININESS);
    }

    #[test]
    fn empty_source_has_empty_extents() {
        let model = Model::from_sources("", &[], &LoadOptions::default()).unwrap();
        assert!(model.geometries.is_empty());
        assert!(model.extents.is_empty());
    }

    #[test]
    fn parse_errors_are_reported() {
        let err = Model::from_sources("f 1 2 3\n", &[], &LoadOptions::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse OBJ data"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_model_from_path("no/such/model.obj", &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to open OBJ file"));
    }
}
