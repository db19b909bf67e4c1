//! Binary glTF decoding into a thread-safe model tree.
//!
//! Materials become [`PhysicalMaterial`] values indexed by the document's
//! material list; [`ModelData::into_node`] turns the tree into scene nodes on
//! the main thread.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Mat4;

use crate::color::Color;
use crate::scene::{compute_vertex_normals, Geometry, Mesh, Node, PhysicalMaterial, Vertex};

use super::error::AssetError;

/// One drawable primitive.
#[derive(Debug, Clone)]
pub struct MeshData {
    pub geometry: Arc<Geometry>,
    /// Index into [`ModelData::materials`]; `None` uses the default material.
    pub material: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct ModelNode {
    pub name: String,
    pub transform: Mat4,
    pub mesh: Option<MeshData>,
    pub children: Vec<ModelNode>,
}

/// Decoded model, ready to cross threads.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub root: ModelNode,
    pub materials: Vec<PhysicalMaterial>,
}

impl ModelData {
    pub fn mesh_count(&self) -> usize {
        fn count(n: &ModelNode) -> usize {
            n.mesh.is_some() as usize + n.children.iter().map(count).sum::<usize>()
        }
        count(&self.root)
    }

    /// Builds scene nodes. Primitives sharing a material index share one
    /// material handle.
    pub fn into_node(self) -> Node {
        let mut shared = HashMap::new();
        let materials = self.materials;
        convert(self.root, &materials, &mut shared)
    }
}

fn convert(
    node: ModelNode,
    materials: &[PhysicalMaterial],
    shared: &mut HashMap<Option<usize>, crate::scene::MaterialRef>,
) -> Node {
    let mesh = node.mesh.map(|m| {
        let material = shared
            .entry(m.material)
            .or_insert_with(|| {
                m.material
                    .and_then(|i| materials.get(i).cloned())
                    .unwrap_or_default()
                    .into_shared()
            })
            .clone();
        Mesh::new(m.geometry, material)
    });

    Node {
        name: node.name,
        transform: node.transform,
        mesh,
        children: node
            .children
            .into_iter()
            .map(|c| convert(c, materials, shared))
            .collect(),
    }
}

/// Decodes a `.glb` (or self-contained `.gltf`) byte buffer.
///
/// Only triangle-list primitives are kept. Missing normals are computed.
pub fn decode_glb(bytes: &[u8], location: &str) -> Result<ModelData, AssetError> {
    let gltf_err = |source| AssetError::Gltf { location: location.to_string(), source };

    let ::gltf::Gltf { document, blob } = ::gltf::Gltf::from_slice(bytes).map_err(gltf_err)?;
    let buffers = ::gltf::import_buffers(&document, None, blob).map_err(gltf_err)?;

    let materials = document.materials().map(|m| read_material(&m)).collect();

    let scene = document.default_scene().or_else(|| document.scenes().next());
    let mut root = ModelNode { name: "model".to_string(), transform: Mat4::IDENTITY, ..ModelNode::default() };
    if let Some(scene) = scene {
        for node in scene.nodes() {
            root.children.push(read_node(&node, &buffers));
        }
    }

    let model = ModelData { root, materials };
    let meshes = model.mesh_count();
    if meshes == 0 {
        return Err(AssetError::NoMesh { location: location.to_string() });
    }

    log::debug!("decoded model {location}: {meshes} meshes");
    Ok(model)
}

fn read_node(node: &::gltf::Node<'_>, buffers: &[::gltf::buffer::Data]) -> ModelNode {
    let name = node.name().map(str::to_string).unwrap_or_else(|| format!("node_{}", node.index()));
    let mut out = ModelNode {
        name,
        transform: Mat4::from_cols_array_2d(&node.transform().matrix()),
        mesh: None,
        children: Vec::new(),
    };

    if let Some(mesh) = node.mesh() {
        let mut prims: Vec<MeshData> = mesh.primitives().filter_map(|p| read_primitive(&p, buffers)).collect();
        if prims.len() == 1 {
            out.mesh = prims.pop();
        } else {
            // One child per primitive so each keeps its own material slot.
            for (i, prim) in prims.into_iter().enumerate() {
                out.children.push(ModelNode {
                    name: format!("{}_{i}", out.name),
                    transform: Mat4::IDENTITY,
                    mesh: Some(prim),
                    children: Vec::new(),
                });
            }
        }
    }

    for child in node.children() {
        out.children.push(read_node(&child, buffers));
    }
    out
}

fn read_primitive(prim: &::gltf::Primitive<'_>, buffers: &[::gltf::buffer::Data]) -> Option<MeshData> {
    if prim.mode() != ::gltf::mesh::Mode::Triangles {
        log::debug!("skipping non-triangle primitive ({:?})", prim.mode());
        return None;
    }

    let reader = prim.reader(|b| buffers.get(b.index()).map(|d| d.0.as_slice()));
    let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(Iterator::collect);
    let uvs: Option<Vec<[f32; 2]>> = reader.read_tex_coords(0).map(|t| t.into_f32().collect());
    let indices: Vec<u32> = reader
        .read_indices()
        .map(|i| i.into_u32().collect())
        .unwrap_or_default();

    let mut vertices: Vec<Vertex> = positions
        .iter()
        .enumerate()
        .map(|(i, p)| Vertex {
            position: *p,
            normal: normals.as_ref().and_then(|n| n.get(i).copied()).unwrap_or([0.0, 1.0, 0.0]),
            uv: uvs.as_ref().and_then(|u| u.get(i).copied()).unwrap_or([0.0, 0.0]),
        })
        .collect();

    let geometry_indices = if indices.is_empty() {
        (0..vertices.len() as u32).collect::<Vec<_>>()
    } else {
        indices
    };
    if normals.is_none() {
        compute_vertex_normals(&mut vertices, &geometry_indices);
    }

    Some(MeshData {
        geometry: Arc::new(Geometry::new(vertices, geometry_indices)),
        material: prim.material().index(),
    })
}

fn read_material(m: &::gltf::Material<'_>) -> PhysicalMaterial {
    let pbr = m.pbr_metallic_roughness();
    let [r, g, b, _] = pbr.base_color_factor();
    let [er, eg, eb] = m.emissive_factor();
    PhysicalMaterial {
        color: Color::linear(r, g, b),
        metalness: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        emissive: Color::linear(er, eg, eb),
        ..PhysicalMaterial::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    /// Packs a JSON document and binary chunk into a GLB container.
    fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
        let mut json = json.as_bytes().to_vec();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }
        let mut bin = bin.to_vec();
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let bin_chunk = if bin.is_empty() { 0 } else { 8 + bin.len() };
        let total = 12 + 8 + json.len() + bin_chunk;
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json);
        if !bin.is_empty() {
            out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
            out.extend_from_slice(b"BIN\0");
            out.extend_from_slice(&bin);
        }
        out
    }

    fn triangle_bin() -> Vec<u8> {
        let mut bin = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bin.extend_from_slice(&v.to_le_bytes());
        }
        for i in [0u16, 1, 2] {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        bin
    }

    const BUFFERS: &str = r#""buffers":[{"byteLength":44}],
        "bufferViews":[{"buffer":0,"byteOffset":0,"byteLength":36},{"buffer":0,"byteOffset":36,"byteLength":6}],
        "accessors":[
            {"bufferView":0,"componentType":5126,"count":3,"type":"VEC3","min":[0,0,0],"max":[1,1,0]},
            {"bufferView":1,"componentType":5123,"count":3,"type":"SCALAR"}]"#;

    fn triangle_glb() -> Vec<u8> {
        let json = format!(
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],
            "nodes":[{{"name":"Logo","mesh":0,"translation":[1,0,0]}}],
            "materials":[{{"pbrMetallicRoughness":{{"metallicFactor":0.25}}}}],
            "meshes":[{{"primitives":[{{"attributes":{{"POSITION":0}},"indices":1,"material":0}}]}}],
            {BUFFERS}}}"#
        );
        glb(&json, &triangle_bin())
    }

    // ── decode ───────────────────────────────────────────────────────────

    #[test]
    fn decodes_in_memory_triangle() {
        let model = decode_glb(&triangle_glb(), "mem.glb").unwrap();
        assert_eq!(model.mesh_count(), 1);
        assert_eq!(model.materials.len(), 1);
        assert_eq!(model.materials[0].metalness, 0.25);

        let logo = &model.root.children[0];
        assert_eq!(logo.name, "Logo");
        assert_eq!(logo.transform.w_axis.x, 1.0);

        let mesh = logo.mesh.as_ref().unwrap();
        assert_eq!(mesh.geometry.indices(), &[0, 1, 2]);
        assert_eq!(mesh.material, Some(0));
        // computed, since the file has no NORMAL attribute
        assert_eq!(mesh.geometry.vertices()[0].normal, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn scene_without_meshes_is_rejected() {
        let json = r#"{"asset":{"version":"2.0"},"scenes":[{"nodes":[0]}],"nodes":[{"name":"empty"}]}"#;
        let bytes = glb(json, &[]);
        let err = decode_glb(&bytes, "empty.glb").unwrap_err();
        assert!(matches!(err, AssetError::NoMesh { .. }));
    }

    #[test]
    fn garbage_is_a_gltf_error() {
        let err = decode_glb(b"definitely not a model", "junk.glb").unwrap_err();
        assert!(matches!(err, AssetError::Gltf { .. }));
    }

    // ── conversion ───────────────────────────────────────────────────────

    #[test]
    fn primitives_with_one_material_share_a_handle() {
        let json = format!(
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"nodes":[0]}}],
            "nodes":[{{"name":"Logo","mesh":0}}],
            "materials":[{{}}],
            "meshes":[{{"primitives":[
                {{"attributes":{{"POSITION":0}},"indices":1,"material":0}},
                {{"attributes":{{"POSITION":0}},"indices":1,"material":0}}]}}],
            {BUFFERS}}}"#
        );
        let model = decode_glb(&glb(&json, &triangle_bin()), "two.glb").unwrap();
        assert_eq!(model.mesh_count(), 2);

        let node = model.into_node();
        let mut handles = Vec::new();
        node.traverse(&mut |n| {
            if let Some(m) = &n.mesh {
                handles.push(m.material.clone());
            }
        });
        assert_eq!(handles.len(), 2);
        assert!(Rc::ptr_eq(&handles[0], &handles[1]));
    }
}
