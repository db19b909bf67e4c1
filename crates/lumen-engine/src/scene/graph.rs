use std::rc::Rc;
use std::sync::Arc;

use glam::Mat4;

use super::geometry::Geometry;
use super::material::MaterialRef;

/// Drawable leaf payload of a [`Node`].
#[derive(Debug, Clone)]
pub struct Mesh {
    pub geometry: Arc<Geometry>,
    pub material: MaterialRef,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Mesh {
    pub fn new(geometry: Arc<Geometry>, material: MaterialRef) -> Self {
        Self {
            geometry,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn uses_material(&self, material: &MaterialRef) -> bool {
        Rc::ptr_eq(&self.material, material)
    }
}

/// Scene graph node. Children are owned; transforms are local to the parent.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Mat4,
    pub mesh: Option<Mesh>,
    pub children: Vec<Node>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Mat4::IDENTITY,
            mesh: None,
            children: Vec::new(),
        }
    }
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_mesh(mut self, mesh: Mesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    pub fn add_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Depth-first, parent before children.
    pub fn traverse<F: FnMut(&Node)>(&self, f: &mut F) {
        f(self);
        for child in &self.children {
            child.traverse(f);
        }
    }

    pub fn traverse_mut<F: FnMut(&mut Node)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            child.traverse_mut(f);
        }
    }

    /// Visits every mesh with its accumulated world transform.
    pub fn visit_meshes<F: FnMut(Mat4, &Mesh)>(&self, parent: Mat4, f: &mut F) {
        let world = parent * self.transform;
        if let Some(mesh) = &self.mesh {
            f(world, mesh);
        }
        for child in &self.children {
            child.visit_meshes(world, f);
        }
    }

    pub fn mesh_count(&self) -> usize {
        let mut n = 0;
        self.traverse(&mut |node| {
            if node.mesh.is_some() {
                n += 1;
            }
        });
        n
    }

    /// First node named `name`, depth-first.
    pub fn find(&self, name: &str) -> Option<&Node> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{PhysicalMaterial, Vertex};
    use glam::Vec3;

    fn mesh(material: &MaterialRef) -> Mesh {
        let verts = vec![Vertex::default(); 3];
        Mesh::new(Arc::new(Geometry::new(verts, vec![])), material.clone())
    }

    #[test]
    fn traverse_visits_parent_first() {
        let mut root = Node::new("a");
        let mut b = Node::new("b");
        b.add_child(Node::new("c"));
        root.add_child(b);
        root.add_child(Node::new("d"));

        let mut names = Vec::new();
        root.traverse(&mut |n| names.push(n.name.clone()));
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn world_transforms_accumulate() {
        let mat = PhysicalMaterial::default().into_shared();
        let child = Node::new("leaf")
            .with_transform(Mat4::from_translation(Vec3::Y))
            .with_mesh(mesh(&mat));
        let mut parent = Node::new("p").with_transform(Mat4::from_translation(Vec3::X));
        parent.add_child(child);

        let mut seen = Vec::new();
        parent.visit_meshes(Mat4::IDENTITY, &mut |world, _| seen.push(world.w_axis.truncate()));
        assert_eq!(seen, [Vec3::new(1.0, 1.0, 0.0)]);
    }

    #[test]
    fn find_and_count() {
        let mat = PhysicalMaterial::default().into_shared();
        let mut root = Node::new("root");
        root.add_child(Node::new("x").with_mesh(mesh(&mat)));
        root.add_child(Node::new("y"));
        assert_eq!(root.mesh_count(), 1);
        assert!(root.find("y").is_some());
        assert!(root.find("z").is_none());
    }
}
