use std::fmt::{self, Display};

use rgb::{RGB8, RGBA};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Color {
    #[default]
    None,
    Named(String),
    Rgb(RGB8),
    Rgba(RGBA<u8, f64>),
}

impl Color {
    pub fn named(name: &str) -> Self {
        Color::Named(name.to_owned())
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Rgb(RGB8 { r, g, b })
    }

    pub fn rgba(r: u8, g: u8, b: u8, opacity: f64) -> Self {
        Color::Rgba(RGBA { r, g, b, a: opacity })
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::None => write!(f, "none"),
            Color::Named(name) => write!(f, "{}", name),
            Color::Rgb(RGB8 { r, g, b }) => write!(f, "rgb({},{},{})", r, g, b),
            Color::Rgba(RGBA { r, g, b, a }) => write!(f, "rgba({},{},{},{})", r, g, b, a),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Presentation attributes shared by all shapes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathProps {
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f64>,
    /// Round line caps and joins.
    pub rounded: bool,
}

impl PathProps {
    pub fn filled(color: Color) -> Self {
        Self { fill: Some(color), ..Self::default() }
    }

    fn fmt_attrs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(fill) = &self.fill {
            write!(f, " fill=\"{}\"", fill)?;
        }
        if let Some(stroke) = &self.stroke {
            write!(f, " stroke=\"{}\"", stroke)?;
        }
        if let Some(stroke_width) = self.stroke_width {
            write!(f, " stroke-width=\"{}\"", stroke_width)?;
        }
        if self.rounded {
            write!(f, " stroke-linecap=\"round\" stroke-linejoin=\"round\"")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Text {
    pub position: Point,
    pub offset: Point,
    pub font_size: u32,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub data: String,
    pub props: PathProps,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Circle { center: Point, radius: f64, props: PathProps },
    Polyline { points: Vec<Point>, props: PathProps },
    Text(Text),
}

impl Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Circle { center, radius, props } => {
                write!(f, "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"", center.x, center.y, radius)?;
                props.fmt_attrs(f)?;
                write!(f, "/>")
            }
            Object::Polyline { points, props } => {
                write!(f, "<polyline points=\"")?;
                for (i, point) in points.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{},{}", point.x, point.y)?;
                }
                write!(f, "\"")?;
                props.fmt_attrs(f)?;
                write!(f, "/>")
            }
            Object::Text(text) => {
                write!(f, "<text")?;
                text.props.fmt_attrs(f)?;
                write!(
                    f,
                    " x=\"{}\" y=\"{}\" dx=\"{}\" dy=\"{}\" font-size=\"{}\"",
                    text.position.x, text.position.y, text.offset.x, text.offset.y, text.font_size
                )?;
                if let Some(font_family) = &text.font_family {
                    write!(f, " font-family=\"{}\"", font_family)?;
                }
                if let Some(font_weight) = &text.font_weight {
                    write!(f, " font-weight=\"{}\"", font_weight)?;
                }
                write!(f, ">{}</text>", escape(&text.data))
            }
        }
    }
}

fn escape(data: &str) -> String {
    let mut escaped = String::with_capacity(data.len());
    for letter in data.chars() {
        match letter {
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            _ => escaped.push(letter),
        }
    }
    escaped
}

/// An SVG image, rendered in insertion order.
#[derive(Clone, Debug, Default)]
pub struct Document {
    objects: Vec<Object>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: Object) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<?xml version=\"1.0\" encoding=\"UTF-8\" ?>")?;
        writeln!(f, "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\">")?;
        for object in self.objects.iter() {
            writeln!(f, "  {}", object)?;
        }
        write!(f, "</svg>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors() {
        assert_eq!(Color::None.to_string(), "none");
        assert_eq!(Color::named("red").to_string(), "red");
        assert_eq!(Color::rgb(255, 16, 12).to_string(), "rgb(255,16,12)");
        assert_eq!(Color::rgba(255, 200, 23, 0.85).to_string(), "rgba(255,200,23,0.85)");
    }

    #[test]
    fn shapes() {
        let circle = Object::Circle {
            center: Point::new(20.0, 20.0),
            radius: 10.0,
            props: PathProps::filled(Color::named("white")),
        };
        assert_eq!(circle.to_string(), r#"<circle cx="20" cy="20" r="10" fill="white"/>"#);

        let polyline = Object::Polyline {
            points: vec![Point::new(0.0, 0.0), Point::new(1.5, 2.0)],
            props: PathProps {
                fill: Some(Color::None),
                stroke: Some(Color::rgb(1, 2, 3)),
                stroke_width: Some(14.0),
                rounded: true,
            },
        };
        assert_eq!(
            polyline.to_string(),
            r#"<polyline points="0,0 1.5,2" fill="none" stroke="rgb(1,2,3)" stroke-width="14" stroke-linecap="round" stroke-linejoin="round"/>"#
        );
    }

    #[test]
    fn text_is_escaped() {
        let text = Object::Text(Text {
            position: Point::new(1.0, 2.0),
            offset: Point::new(7.0, -3.0),
            font_size: 20,
            font_family: Some("Verdana".to_owned()),
            font_weight: Some("bold".to_owned()),
            data: "A&B <\"x'>".to_owned(),
            props: PathProps::filled(Color::named("black")),
        });
        assert_eq!(
            text.to_string(),
            r#"<text fill="black" x="1" y="2" dx="7" dy="-3" font-size="20" font-family="Verdana" font-weight="bold">A&amp;B &lt;&quot;x&apos;&gt;</text>"#
        );
    }

    #[test]
    fn document_frame() {
        let mut document = Document::new();
        document.add(Object::Circle { center: Point::new(1.0, 1.0), radius: 1.0, props: PathProps::default() });
        let svg = document.to_string();
        assert!(svg.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n<svg "));
        assert!(svg.contains("\n  <circle cx=\"1\" cy=\"1\" r=\"1\"/>\n"));
        assert!(svg.ends_with("</svg>"));
    }
}
