/// Rendered width of a run of text
pub trait TextMeasure {
    fn width(&self, text: &str) -> f32;
}

/// Fixed advance per character, as in a terminal
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMeasure {
    pub char_width: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { char_width: 1.0 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.char_width
    }
}

/// Bounding box of the text input, in the same units as the measure
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputGeometry {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub padding_left: f32,
    pub scroll_y: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AnchorPosition {
    pub left: f32,
    pub top: f32,
}

/// Popover anchor under the cursor, kept inside the input's right edge
pub fn anchor(
    input: &InputGeometry,
    before_cursor: &str,
    measure: &dyn TextMeasure,
    popover_width: f32,
) -> AnchorPosition {
    let caret = input.left + input.padding_left + measure.width(before_cursor);
    AnchorPosition {
        left: caret.min(input.right - popover_width),
        top: input.bottom + input.scroll_y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_follows_caret_then_clamps() {
        let input = InputGeometry {
            left: 10.0,
            right: 610.0,
            bottom: 40.0,
            padding_left: 12.0,
            scroll_y: 100.0,
        };
        let measure = MonospaceMeasure { char_width: 8.0 };

        let pos = anchor(&input, "find @", &measure, 300.0);
        assert_eq!(pos.left, 10.0 + 12.0 + 48.0);
        assert_eq!(pos.top, 140.0);

        let long = "x".repeat(60);
        let pos = anchor(&input, &long, &measure, 300.0);
        assert_eq!(pos.left, 310.0);
    }
}
