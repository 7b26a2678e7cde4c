pub mod dom_scene;
pub mod memory_scene;

pub use dom_scene::DomScene;
pub use memory_scene::MemoryScene;
