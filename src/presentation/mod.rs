// Presentation layer - Controller surface for a UI or headless renderer
pub mod chart_controller;
pub mod commands;
pub mod console_renderer;
