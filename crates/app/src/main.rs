//! Entry point for wavemesh-info.
//! Loads an OBJ model (plus its MTL libraries) and logs what the renderer
//! would receive: geometries, materials, textures and camera framing.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use asset::{
    LoadOptions, Model, TextureCache, TextureSlot, VertexAttribute, load_model_from_path,
};

fn parse_switch(args: &[String], flag: &str, default: bool) -> bool {
    // --flag[=on|off]
    let prefix = format!("{}=", flag);
    for arg in args {
        if arg == flag {
            return true;
        }
        if let Some(val) = arg.strip_prefix(&prefix) {
            return match val.to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" => true,
                "0" | "false" | "off" | "no" => false,
                other => {
                    log::warn!("Unknown value '{}' for {}, using {}.", other, flag, default);
                    default
                }
            };
        }
    }
    default
}

fn parse_options(args: &[String]) -> LoadOptions {
    let defaults = LoadOptions::default();
    LoadOptions {
        generate_tangents: parse_switch(args, "--tangents", defaults.generate_tangents),
        load_materials: parse_switch(args, "--materials", defaults.load_materials),
    }
}

fn parse_model_path(args: &[String]) -> Option<PathBuf> {
    args.iter().find(|a| !a.starts_with("--")).map(PathBuf::from)
}

fn attribute_kind<const N: usize>(attribute: Option<&VertexAttribute<N>>) -> &'static str {
    match attribute {
        None => "off",
        Some(a) if a.is_constant() => "constant",
        Some(_) => "per-vertex",
    }
}

fn log_summary(model: &Model) {
    for (i, geometry) in model.geometries.iter().enumerate() {
        log::info!(
            "Geometry #{} '{}' groups={:?} material={} vertices={} triangles={} normals={} tangents={}",
            i,
            geometry.name(),
            geometry.groups,
            geometry.material.as_deref().unwrap_or("<none>"),
            geometry.vertex_count(),
            geometry.triangle_count(),
            attribute_kind(Some(&geometry.normals)),
            attribute_kind(geometry.tangents.as_ref())
        );
    }

    let mut names: Vec<&str> = model.materials.keys().map(String::as_str).collect();
    names.sort_unstable();
    log::info!("Materials ({}): {:?}", names.len(), names);

    match model.extents.bounds() {
        Some(bounds) => {
            let radius = bounds.radius();
            log::info!(
                "Extents min={:?} max={:?} center={:?} radius={:.4}",
                bounds.min,
                bounds.max,
                bounds.center(),
                radius
            );
            log::info!(
                "Framing: recenter by {:?}, near={:.4}, far={:.4}",
                bounds.recenter_offset(),
                radius / 100.0,
                radius * 3.0
            );
        }
        None => log::info!("Extents: empty (nothing to frame)"),
    }
}

fn log_textures(model: &Model, base_dir: &Path) {
    let cache = TextureCache::load_for(&model.materials, base_dir);
    log::info!("Decoded {} texture map(s)", cache.len());
    for geometry in &model.geometries {
        let material = model.material_for(geometry);
        let diffuse = cache.texture_for(&material, TextureSlot::Diffuse);
        let normal = cache.texture_for(&material, TextureSlot::Normal);
        log::info!(
            "'{}': diffuse {}x{}, normal {}x{}",
            geometry.name(),
            diffuse.width,
            diffuse.height,
            normal.width,
            normal.height
        );
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = parse_options(&args);
    let with_textures = parse_switch(&args, "--textures", false);
    let Some(path) = parse_model_path(&args) else {
        bail!("Usage: wavemesh-info <model.obj> [--tangents=on|off] [--materials=on|off] [--textures]");
    };

    log::info!(
        "Loading {} (tangents={}, materials={}, textures={})",
        path.display(),
        options.generate_tangents,
        options.load_materials,
        with_textures
    );

    let model = load_model_from_path(&path, &options)?;
    log::info!(
        "Loaded {} geometries, {} vertices, {} triangles",
        model.geometries.len(),
        model.vertex_count(),
        model.triangle_count()
    );
    log_summary(&model);

    if with_textures {
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        log_textures(&model, base_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn switches_default_and_override() {
        let a = args(&["model.obj", "--tangents=off", "--textures"]);
        let o = parse_options(&a);
        assert!(!o.generate_tangents);
        assert!(o.load_materials);
        assert!(parse_switch(&a, "--textures", false));
        assert!(!parse_switch(&args(&[]), "--textures", false));
    }

    #[test]
    fn unknown_switch_value_keeps_default() {
        let a = args(&["--materials=maybe"]);
        assert!(parse_options(&a).load_materials);
    }

    #[test]
    fn attribute_kinds() {
        let constant = VertexAttribute::Constant([1.0, 0.0, 0.0]);
        let per_vertex = VertexAttribute::PerVertex(vec![[0.0, 0.0, 1.0]]);
        assert_eq!(attribute_kind::<3>(None), "off");
        assert_eq!(attribute_kind(Some(&constant)), "constant");
        assert_eq!(attribute_kind(Some(&per_vertex)), "per-vertex");
    }

    #[test]
    fn model_path_is_first_positional() {
        let a = args(&["--tangents=on", "scene.obj", "other.obj"]);
        assert_eq!(parse_model_path(&a), Some(PathBuf::from("scene.obj")));
        assert_eq!(parse_model_path(&args(&["--textures"])), None);
    }
}
