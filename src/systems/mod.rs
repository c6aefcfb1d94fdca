pub mod conditioning;
pub mod kriging_system;
pub mod matrix;
pub mod modifiers;
pub mod solved_systems;
pub mod system_builder;
