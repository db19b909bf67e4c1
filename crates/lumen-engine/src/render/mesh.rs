use std::collections::HashMap;

use wgpu::util::DeviceExt;

use crate::scene::{Geometry, GeometryId};

pub(super) struct GpuMesh {
    pub vbo: wgpu::Buffer,
    pub ibo: wgpu::Buffer,
    pub index_count: u32,
}

/// Vertex/index buffers keyed by geometry identity. Entries not touched in a
/// frame are released by [`MeshCache::retain_used`].
#[derive(Default)]
pub(super) struct MeshCache {
    meshes: HashMap<GeometryId, GpuMesh>,
    used: Vec<GeometryId>,
}

impl MeshCache {
    pub fn begin_frame(&mut self) {
        self.used.clear();
    }

    pub fn prepare(&mut self, device: &wgpu::Device, geometry: &Geometry) {
        let id = geometry.id();
        self.used.push(id);
        if self.meshes.contains_key(&id) {
            return;
        }

        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen mesh vbo"),
            contents: bytemuck::cast_slice(geometry.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ibo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("lumen mesh ibo"),
            contents: bytemuck::cast_slice(geometry.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!(
            "uploaded geometry {:?}: {} vertices, {} triangles",
            id,
            geometry.vertices().len(),
            geometry.triangle_count()
        );
        self.meshes.insert(id, GpuMesh { vbo, ibo, index_count: geometry.indices().len() as u32 });
    }

    pub fn get(&self, id: GeometryId) -> Option<&GpuMesh> {
        self.meshes.get(&id)
    }

    pub fn retain_used(&mut self) {
        let used = &self.used;
        self.meshes.retain(|id, _| used.contains(id));
    }
}
