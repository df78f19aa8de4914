//! Directive text sent to the model

use serde_json::{json, Value};
use studio_core::{Settings, IDEA_COUNT};

pub fn text_ideas_prompt(description: &str) -> String {
    format!(
        "Based on the description \"{}\", generate {} creative, detailed, and visually rich \
         scene descriptions for a product photoshoot.",
        description, IDEA_COUNT
    )
}

pub fn image_ideas_prompt() -> String {
    format!(
        "Based on the style, mood, and environment of this image, generate {} creative, \
         detailed, and visually rich scene descriptions for a product photoshoot.",
        IDEA_COUNT
    )
}

/// Response schema constraining idea calls to a JSON array of strings
pub fn ideas_schema(item_description: &str) -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "STRING",
            "description": item_description,
        }
    })
}

/// Background replacement directive
///
/// The aspect ratio is stated twice: once as the canvas to fill and once as
/// a constraint on the final output. Models crop or pad otherwise.
pub fn background_directive(prompt: &str, settings: &Settings) -> String {
    format!(
        "You are a professional product photographer's assistant. Replace the background of \
         the given image. Fill the entire canvas, at an aspect ratio of {ratio}, with a new, \
         photorealistic background based on this description: \"{prompt}\". The lighting of \
         the new background should be {lighting}, and the camera perspective should be \
         {camera}. The original product must be preserved exactly, untouched, and seamlessly \
         integrated into the new background. Do not alter the product itself in any way. \
         The final image MUST have an aspect ratio of {ratio}.",
        ratio = settings.aspect_ratio,
        prompt = prompt,
        lighting = settings.lighting,
        camera = settings.camera_perspective,
    )
}

pub fn edit_directive(edit_prompt: &str) -> String {
    format!(
        "Apply the following edit to the image based on the user's request: \"{}\". The edit \
         should be seamless and maintain the original image's photorealism and style.",
        edit_prompt
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use studio_core::{AspectRatio, CameraPerspective, Lighting};

    #[test]
    fn test_background_directive_states_ratio_twice() {
        let settings = Settings {
            lighting: Lighting::GoldenHour,
            aspect_ratio: AspectRatio::Vertical,
            camera_perspective: CameraPerspective::LowAngle,
        };
        let directive = background_directive("marble pedestal", &settings);

        assert_eq!(directive.matches("9:16").count(), 2);
        assert!(directive.contains("\"marble pedestal\""));
        assert!(directive.contains("Golden Hour"));
        assert!(directive.contains("Low Angle"));
        assert!(directive.ends_with("MUST have an aspect ratio of 9:16."));
    }

    #[test]
    fn test_edit_directive_has_no_ratio() {
        let directive = edit_directive("add a shadow");
        assert!(directive.contains("\"add a shadow\""));
        assert!(!directive.contains("aspect ratio"));
    }

    #[test]
    fn test_idea_prompts_ask_for_five() {
        assert!(text_ideas_prompt("a serene zen garden").contains("generate 5 creative"));
        assert!(image_ideas_prompt().contains("generate 5 creative"));
        assert_eq!(ideas_schema("x")["items"]["type"], "STRING");
    }
}
