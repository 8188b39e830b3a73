// Instruction text sent alongside the image for each operation.

use crate::Operation;

pub fn build_prompt(operation: &Operation) -> String {
    match operation {
        Operation::Retouch { instruction, focus } => format!(
            "Perform a natural, localized edit on the provided image. \
             Edit request: \"{instruction}\". \
             Focus the edit around pixel coordinate (x: {}, y: {}) and blend it seamlessly. \
             Leave the rest of the image unchanged. Return only the edited image.",
            focus.x.round(),
            focus.y.round()
        ),
        Operation::Filter { style } => format!(
            "Apply a stylistic filter to the entire image. Filter request: \"{style}\". \
             Do not change composition or content. Return only the filtered image."
        ),
        Operation::Adjust { instruction } => format!(
            "Perform a natural, global adjustment to the entire image. \
             Adjustment request: \"{instruction}\". \
             The result must stay photorealistic. Return only the adjusted image."
        ),
        Operation::Upscale { tier } => match tier.dimensions() {
            Some((w, h)) => format!(
                "Upscale the image to {w}x{h} pixels ({tier}). \
                 Enhance detail and sharpness without altering content. Return only the upscaled image."
            ),
            None => "Return the image at its original resolution, unchanged.".to_string(),
        },
    }
}
