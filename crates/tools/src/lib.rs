//! Built-in tool implementations for AdMuse.
//!
//! Four tools, matching what the creative agent advertises to the model:
//! the current time, a restricted calculator, and Fal-backed image and
//! video generation. The generation tools take their credential by
//! injection at startup; a missing key is a per-call error the model can
//! see and react to, never a startup failure.

pub mod calculator;
pub mod current_time;
pub mod generate_image;
pub mod generate_video;

mod fal;

use admuse_core::tool::ToolRegistry;

/// Create the default tool registry with all built-in tools.
///
/// `fal_key` is the credential for the generation backends; `None` leaves
/// the tools registered but failing per-call with a configuration error.
pub fn default_registry(fal_key: Option<String>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(current_time::CurrentTimeTool));
    registry.register(Box::new(calculator::CalculatorTool));
    registry.register(Box::new(generate_image::GenerateImageTool::new(
        fal_key.clone(),
    )));
    registry.register(Box::new(generate_video::GenerateVideoTool::new(fal_key)));
    registry
}
