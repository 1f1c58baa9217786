//! Video generation via Fal's Veo 3.1 first/last-frame model.

use std::time::Duration;

use admuse_core::error::ToolError;
use admuse_core::tool::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::info;

use crate::fal::FalClient;

const ENDPOINT: &str = "https://fal.run/fal-ai/veo3.1/fast/first-last-frame-to-video";
const TIMEOUT: Duration = Duration::from_secs(300);

fn map_aspect_ratio(name: Option<&str>) -> &'static str {
    match name {
        Some("landscape") => "16:9",
        Some("portrait") => "9:16",
        _ => "auto",
    }
}

fn map_duration(name: Option<&str>) -> &'static str {
    match name {
        Some("4s") => "4s",
        Some("6s") => "6s",
        _ => "8s",
    }
}

pub struct GenerateVideoTool {
    fal: FalClient,
}

impl GenerateVideoTool {
    pub fn new(fal_key: Option<String>) -> Self {
        Self {
            fal: FalClient::new(fal_key),
        }
    }

    fn build_payload(&self, arguments: &Value) -> Result<Value, ToolError> {
        let first_frame = arguments["first_frame_url"].as_str().unwrap_or_default();
        let last_frame = arguments["last_frame_url"].as_str().unwrap_or_default();
        if first_frame.is_empty() || last_frame.is_empty() {
            return Err(ToolError::InvalidArguments(
                "Both first_frame_url and last_frame_url are required".into(),
            ));
        }

        Ok(json!({
            "prompt": arguments["prompt"].as_str().unwrap_or_default(),
            "first_frame_url": first_frame,
            "last_frame_url": last_frame,
            "aspect_ratio": map_aspect_ratio(arguments["aspect_ratio"].as_str()),
            "duration": map_duration(arguments["duration"].as_str()),
            "generate_audio": true,
        }))
    }
}

#[async_trait]
impl Tool for GenerateVideoTool {
    fn name(&self) -> &str {
        "generate_video"
    }

    fn description(&self) -> &str {
        "Generate a video from start and end frame images using AI (Veo 3.1). Takes \
         two image URLs (first frame and last frame) and creates a smooth video \
         transition between them. Use this after generating start/end frame images \
         with generate_image. Returns the URL of the generated video."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "Text describing the video motion/transition between the start and end frames"
                },
                "first_frame_url": {
                    "type": "string",
                    "description": "URL of the video's opening frame image"
                },
                "last_frame_url": {
                    "type": "string",
                    "description": "URL of the video's closing frame image"
                },
                "aspect_ratio": {
                    "type": "string",
                    "enum": ["auto", "landscape", "portrait"],
                    "description": "Video aspect ratio. 'landscape' = 16:9, 'portrait' = 9:16. Defaults to 'auto'."
                },
                "duration": {
                    "type": "string",
                    "enum": ["4s", "6s", "8s"],
                    "description": "Video duration. Defaults to '8s'."
                }
            },
            "required": ["prompt", "first_frame_url", "last_frame_url"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<String, ToolError> {
        let payload = self.build_payload(&arguments)?;

        info!("generating video");
        let data = self
            .fal
            .post(ENDPOINT, &payload, TIMEOUT, "Video generation", "5 min")
            .await?;

        data["video"]["url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ToolError::ExecutionFailed("No video URL in response".into()))
    }
}
