//! Handles parsing of slide styling and drawing of slide content.
//!
//! This module extracts colors from a `Slide` model and paints the slide's
//! headings, body text and optional image into the display region.

use egui::{Align2, Color32, Painter, Rect, Shape, TextureHandle, pos2, vec2};
use crate::model::{FontAssets, Slide};
use log::{debug, warn};

const DEFAULT_TEXT_COLOR: Color32 = Color32::WHITE;
const DEFAULT_BACKGROUND_COLOR: Color32 = Color32::from_rgb(24, 26, 32);
const SLIDE_PADDING: f32 = 32.0;
const LINE_GAP: f32 = 12.0;

/// Colors a slide is painted with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideStyle {
    pub text_color: Color32,
    pub background_color: Color32,
}

fn parse_color(hex: Option<&str>, field: &str, slide_index: usize, default: Color32) -> Color32 {
    match hex.map(str::trim).filter(|h| !h.is_empty()) {
        None => default,
        Some(h) => Color32::from_hex(h).unwrap_or_else(|e| {
            warn!("Invalid {} '{}' for slide {}, using default. Error: {:?}", field, h, slide_index, e);
            default
        }),
    }
}

/// Parses the color properties of a slide, falling back to defaults for missing or invalid values.
pub fn parse_slide_style(slide: &Slide, slide_index: usize) -> SlideStyle {
    let style = SlideStyle {
        text_color: parse_color(slide.text_color.as_deref(), "text_color", slide_index, DEFAULT_TEXT_COLOR),
        background_color: parse_color(
            slide.background_color.as_deref(),
            "background_color",
            slide_index,
            DEFAULT_BACKGROUND_COLOR,
        ),
    };
    debug!("Parsed style for slide {}: {:?}", slide_index, style);
    style
}

/// Largest rect with the media's aspect ratio that fits in `available`, centered.
pub fn fit_rect(media_width: f32, media_height: f32, available: Rect) -> Rect {
    if media_width <= 0.0 || media_height <= 0.0 {
        return Rect::from_center_size(available.center(), vec2(0.0, 0.0));
    }
    let aspect_ratio = media_width / media_height;
    let mut draw_width = available.width();
    let mut draw_height = available.width() / aspect_ratio;
    if draw_height > available.height() {
        draw_height = available.height();
        draw_width = available.height() * aspect_ratio;
    }
    Rect::from_center_size(available.center(), vec2(draw_width, draw_height))
}

/// Paints one slide into `rect`.
pub fn draw_slide(
    painter: &Painter,
    rect: Rect,
    slide: &Slide,
    style: &SlideStyle,
    fonts: &FontAssets,
    image: Option<&TextureHandle>,
) {
    painter.add(Shape::rect_filled(rect, 8.0, style.background_color));

    let inner = rect.shrink(SLIDE_PADDING);
    let wrap_width = inner.width().max(1.0);
    let mut cursor_y = inner.top();

    let blocks = [
        (slide.title.as_deref(), &fonts.title),
        (slide.subtitle.as_deref(), &fonts.subtitle),
        (slide.body.as_deref(), &fonts.body),
    ];
    for (text, font) in blocks {
        let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) else {
            continue;
        };
        let galley = painter.layout(text.to_string(), font.clone(), style.text_color, wrap_width);
        let height = galley.size().y;
        painter.galley(pos2(inner.left(), cursor_y), galley, style.text_color);
        cursor_y += height + LINE_GAP;
    }

    let image_area = Rect::from_min_max(pos2(inner.left(), cursor_y), inner.max);
    if image_area.height() <= 0.0 {
        return;
    }
    if let Some(texture) = image {
        let [w, h] = texture.size();
        let target = fit_rect(w as f32, h as f32, image_area);
        painter.image(texture.id(), target, Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)), Color32::WHITE);
    } else if slide.image.is_some() {
        painter.text(image_area.center(), Align2::CENTER_CENTER, "Loading image...", fonts.body.clone(), style.text_color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_defaults_and_overrides() {
        let plain = parse_slide_style(&Slide::default(), 0);
        assert_eq!(plain.text_color, DEFAULT_TEXT_COLOR);
        assert_eq!(plain.background_color, DEFAULT_BACKGROUND_COLOR);

        let styled = Slide {
            text_color: Some("#ff0000".into()),
            background_color: Some("#00000080".into()),
            ..Default::default()
        };
        let style = parse_slide_style(&styled, 1);
        assert_eq!(style.text_color, Color32::from_rgb(255, 0, 0));
        assert_eq!(style.background_color, Color32::from_rgba_unmultiplied(0, 0, 0, 0x80));
    }

    #[test]
    fn invalid_colors_fall_back() {
        let slide = Slide { text_color: Some("chartreuse".into()), ..Default::default() };
        assert_eq!(parse_slide_style(&slide, 2).text_color, DEFAULT_TEXT_COLOR);
    }

    #[test]
    fn fit_rect_keeps_aspect_ratio() {
        let area = Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 100.0));
        let fitted = fit_rect(200.0, 100.0, area);
        assert_eq!(fitted.size(), vec2(200.0, 100.0));
        assert_eq!(fitted.center(), area.center());

        let wide = fit_rect(800.0, 100.0, area);
        assert_eq!(wide.size(), vec2(400.0, 50.0));
    }

    #[test]
    fn fit_rect_tolerates_degenerate_media() {
        let area = Rect::from_min_size(pos2(0.0, 0.0), vec2(10.0, 10.0));
        assert_eq!(fit_rect(0.0, 5.0, area).size(), vec2(0.0, 0.0));
    }
}
