pub mod global_button;
pub mod sidebar;
pub mod timeline;
