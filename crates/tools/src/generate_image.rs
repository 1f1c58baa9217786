//! Image generation and editing via Fal's nano-banana-pro model.

use std::time::Duration;

use admuse_core::error::ToolError;
use admuse_core::tool::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use crate::fal::FalClient;

const GENERATE_ENDPOINT: &str = "https://fal.run/fal-ai/nano-banana-pro";
const EDIT_ENDPOINT: &str = "https://fal.run/fal-ai/nano-banana-pro/edit";
const TIMEOUT: Duration = Duration::from_secs(120);

/// Maps the model-facing aspect ratio names onto what Fal expects.
fn map_aspect_ratio(name: Option<&str>) -> &'static str {
    match name {
        Some("landscape") => "16:9",
        Some("portrait") => "9:16",
        _ => "1:1",
    }
}

pub struct GenerateImageTool {
    fal: FalClient,
}

impl GenerateImageTool {
    pub fn new(fal_key: Option<String>) -> Self {
        Self {
            fal: FalClient::new(fal_key),
        }
    }

    fn build_request(&self, arguments: &Value) -> Result<(&'static str, Value), ToolError> {
        let prompt = arguments["prompt"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'prompt' argument".into()))?;
        let aspect_ratio = map_aspect_ratio(arguments["aspect_ratio"].as_str());

        let image_urls: Vec<&str> = arguments["image_urls"]
            .as_array()
            .map(|urls| urls.iter().filter_map(Value::as_str).take(3).collect())
            .unwrap_or_default();

        // Editing and text-to-image are separate endpoints upstream.
        if image_urls.is_empty() {
            Ok((
                GENERATE_ENDPOINT,
                json!({
                    "prompt": prompt,
                    "num_images": 1,
                    "aspect_ratio": aspect_ratio,
                    "output_format": "png",
                }),
            ))
        } else {
            Ok((
                EDIT_ENDPOINT,
                json!({
                    "prompt": prompt,
                    "image_urls": image_urls,
                    "num_images": 1,
                    "aspect_ratio": aspect_ratio,
                    "output_format": "png",
                }),
            ))
        }
    }
}

#[async_trait]
impl Tool for GenerateImageTool {
    fn name(&self) -> &str {
        "generate_image"
    }

    fn description(&self) -> &str {
        "Generate or edit images using AI. Can create new images from text prompts, \
         or edit/transform existing images. When editing, pass the image URLs provided \
         by the system. Returns the URL of the generated image."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Text description of the image to generate, or instructions for how to edit/transform the input images"
                },
                "image_urls": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Optional. URLs of 1-3 existing images to edit or use as reference. Use the URLs provided by the system when the user uploads images."
                },
                "aspect_ratio": {
                    "type": "string",
                    "enum": ["square", "landscape", "portrait"],
                    "description": "Aspect ratio for the output image. Defaults to 'square'. Use 'landscape' for 16:9, 'portrait' for 9:16."
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<String, ToolError> {
        let (endpoint, payload) = self.build_request(&arguments)?;

        info!(endpoint, "generating image");
        let data = self
            .fal
            .post(endpoint, &payload, TIMEOUT, "Image generation", "120s")
            .await?;

        data["images"][0]["url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ToolError::ExecutionFailed("No image URL in response".into()))
    }
}
