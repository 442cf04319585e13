//! Prompt text for the designer, critic, and judge.

use cardsmith_core::bundle::{Orientation, ThreadBundle};

/// System instruction for drafting.
pub const DRAFT_SYSTEM: &str = "You do text-only SVG business cards. Only include text which is \
requested. Do not add colors. Do large text.";

/// System instruction for critiquing.
pub const CRITIQUE_SYSTEM: &str = "You improve SVG business card text layout and text style. All \
text must sit neatly within the card edge. Do not suggest resizing the card. Do not suggest adding \
a logo.";

/// System instruction for judging.
pub const JUDGE_SYSTEM: &str = "You are a designer";

/// Name of the function the judge must call.
pub const JUDGE_FUNCTION: &str = "record_best_image";

/// Font placeholders the draft must use; renderers substitute real families.
pub const FONT_PLACEHOLDERS: [&str; 2] = ["font1", "font2"];

/// Opening user turn: canvas, fonts, alignment, and the text lines.
pub fn draft_prompt(bundle: &ThreadBundle) -> String {
    let canvas = match bundle.layout_orientation() {
        Orientation::Wide => r#"width="350" and height="200""#,
        Orientation::Tall => r#"width="200" and height="350" (tall)"#,
    };
    let [font1, font2] = FONT_PLACEHOLDERS;
    let fonts = if bundle.texts.len() >= 2 {
        format!(r#"Use "{font1}" and "{font2}""#)
    } else {
        format!(r#"Use font-family="{font1}""#)
    };
    let align = if bundle.centered() {
        "Center align"
    } else {
        "Left align"
    };
    let lines = bundle
        .texts
        .values()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Create an SVG with {canvas}. The SVG is a business card with black text and no bg. \
         {fonts}. Do not add a border. Do not use the SVG style tag. {align} this text:\n{lines}"
    )
}

/// Model turn echoing a draft back into the conversation.
pub fn svg_turn(svg: &str) -> String {
    format!("The SVG:\n{svg}")
}

/// Request for critique of the latest draft.
pub fn critique_prompt(centered: bool) -> String {
    let knobs = if centered {
        "font-style, text-anchor and coordinates"
    } else {
        "font-style and coordinates"
    };
    format!(
        "Write at most one sentence for each line of the SVG with suggestions on how to make the \
         SVG better. Must suggest at least one change. May use font-size, font-weight, {knobs}."
    )
}

/// User turn feeding critique back to the designer.
pub fn guidance_turn(guidance: &str) -> String {
    format!("Use this guidance to return the improved SVG:\n{guidance}")
}

/// Question put to the judge after both candidates.
pub fn judge_prompt(first: &str, second: &str) -> String {
    format!(
        "image_1:\n{first}\n\nimage_2:\n{second}\n\nWhich image is most harmonious?"
    )
}

/// Function declaration forcing a categorical verdict.
pub fn judge_function() -> serde_json::Value {
    serde_json::json!({
        "name": JUDGE_FUNCTION,
        "description": "Record best image",
        "parameters": {
            "type": "OBJECT",
            "properties": {
                "image_1_thoughts": {"type": "STRING"},
                "image_2_thoughts": {"type": "STRING"},
                "best": {"type": "STRING", "enum": ["image_1", "image_2"]}
            },
            "required": ["image_1_thoughts", "image_2_thoughts", "best"]
        }
    })
}
