use std::path::PathBuf;

use ttf_parser::OutlineBuilder;

use crate::error::LayerFontError;
use crate::tools::run_tool;

/// Name FontForge gives the glyph created at codepoint 0.
pub const PLACEHOLDER_GLYPH: &str = "uni0000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlinePoint {
    pub x: i16,
    pub y: i16,
    pub on_curve: bool,
}

/// TrueType-style contours in font units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphOutline {
    pub contours: Vec<Vec<OutlinePoint>>,
}

impl GlyphOutline {
    /// `(x_min, y_min, x_max, y_max)` over all points.
    pub fn bounds(&self) -> Option<(i16, i16, i16, i16)> {
        let mut points = self.contours.iter().flatten();
        let first = points.next()?;
        let init = (first.x, first.y, first.x, first.y);
        Some(points.fold(init, |(x0, y0, x1, y1), p| {
            (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))
        }))
    }
}

/// Output of one outline-compiler invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledLayer {
    pub outline: GlyphOutline,
    pub lsb: i16,
}

/// Turns one flattened single-color layer (SVG markup) into glyph geometry.
pub trait OutlineCompiler {
    fn compile_layer(&mut self, svg: &str) -> Result<CompiledLayer, LayerFontError>;
}

/// Imports layers through FontForge's Python interface.
#[derive(Debug, Clone)]
pub struct FontForgeCompiler {
    program: String,
    build_dir: PathBuf,
}

impl FontForgeCompiler {
    pub fn new(program: impl Into<String>, build_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            build_dir: build_dir.into(),
        }
    }

    fn script(&self) -> String {
        let svg = self.build_dir.join("glyph.svg");
        let ttf = self.build_dir.join("glyph.ttf");
        format!(
            "import fontforge\n\
             import psMat\n\
             font = fontforge.font()\n\
             font.ascent = 512\n\
             font.descent = 0\n\
             glyph = font.createChar(0)\n\
             glyph.importOutlines('{}')\n\
             glyph.correctDirection()\n\
             glyph.transform(psMat.translate(0.0, -92.0))\n\
             font.generate('{}')\n",
            python_literal(&svg.to_string_lossy()),
            python_literal(&ttf.to_string_lossy()),
        )
    }
}

impl OutlineCompiler for FontForgeCompiler {
    fn compile_layer(&mut self, svg: &str) -> Result<CompiledLayer, LayerFontError> {
        std::fs::write(self.build_dir.join("glyph.svg"), svg)?;
        let script = self.script();
        run_tool(&self.program, ["-quiet", "-lang=py", "-c", script.as_str()])?;
        let data = std::fs::read(self.build_dir.join("glyph.ttf"))?;
        read_placeholder_glyph(&data)
    }
}

fn python_literal(path: &str) -> String {
    path.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Reads the placeholder glyph's contours and left side bearing from a
/// compiled TrueType font.
pub fn read_placeholder_glyph(data: &[u8]) -> Result<CompiledLayer, LayerFontError> {
    let face = ttf_parser::Face::parse(data, 0)
        .map_err(|err| LayerFontError::Outline(format!("unreadable font: {}", err)))?;
    let glyph = face
        .glyph_index_by_name(PLACEHOLDER_GLYPH)
        .or_else(|| face.glyph_index('\0'))
        .ok_or_else(|| LayerFontError::Outline(format!("{} not found", PLACEHOLDER_GLYPH)))?;

    let mut collector = ContourCollector::default();
    // Blank layers have no outline at all.
    let _ = face.outline_glyph(glyph, &mut collector);
    collector.finish();

    Ok(CompiledLayer {
        outline: GlyphOutline {
            contours: collector.contours,
        },
        lsb: face.glyph_hor_side_bearing(glyph).unwrap_or(0),
    })
}

#[derive(Default)]
struct ContourCollector {
    contours: Vec<Vec<OutlinePoint>>,
    current: Vec<OutlinePoint>,
    last: (f32, f32),
}

impl ContourCollector {
    fn push(&mut self, x: f32, y: f32, on_curve: bool) {
        self.current.push(OutlinePoint {
            x: to_unit(x),
            y: to_unit(y),
            on_curve,
        });
    }

    fn finish(&mut self) {
        if self.current.len() > 1 {
            let first = self.current[0];
            if self.current.last() == Some(&first) {
                self.current.pop();
            }
        }
        if !self.current.is_empty() {
            self.contours.push(std::mem::take(&mut self.current));
        }
    }
}

impl OutlineBuilder for ContourCollector {
    fn move_to(&mut self, x: f32, y: f32) {
        self.finish();
        self.push(x, y, true);
        self.last = (x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.push(x, y, true);
        self.last = (x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.push(x1, y1, false);
        self.push(x, y, true);
        self.last = (x, y);
    }

    // CFF input only; approximated with a single quadratic segment.
    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x0, y0) = self.last;
        let cx = (3.0 * (x1 + x2) - x0 - x) / 4.0;
        let cy = (3.0 * (y1 + y2) - y0 - y) / 4.0;
        self.quad_to(cx, cy, x, y);
    }

    fn close(&mut self) {
        self.finish();
    }
}

fn to_unit(v: f32) -> i16 {
    v.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
