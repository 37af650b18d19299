pub mod turbovidplay;
pub mod vidoza;
pub mod vk;
