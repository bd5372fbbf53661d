mod color;
mod decompose;
mod dedup;
mod error;
mod font_data;
mod info;
mod merge;
mod metrics;
mod outline;
mod palette;
mod path;
mod report;
mod scene;
mod style;
mod tables;
mod tools;
mod types;
mod xml;

use std::path::{Path, PathBuf};

use log::{info, warn};

pub use color::{composite_opacity, normalize, resolve_gradient};
pub use decompose::{PaintState, StrokeFilter, Sublayer, decompose};
pub use dedup::{LayerCache, LayerComponent, canonical_key};
pub use error::LayerFontError;
pub use font_data::{Character, FontData, GlyphLayer};
pub use info::{FontInfo, INFO_FILE};
pub use merge::{ColorLayer, add_or_merge, merge_layers, shape_bbox};
pub use metrics::{CharacterMetrics, RunMetrics};
pub use outline::{
    CompiledLayer, FontForgeCompiler, GlyphOutline, OutlineCompiler, OutlinePoint,
    read_placeholder_glyph,
};
pub use palette::Palette;
pub use path::{Point, sample_path};
pub use report::{PaintReport, UnresolvedPaint};
pub use scene::{NodeKind, Presentation, SceneNode, SvgDocument};
pub use tables::{assemble, format_timestamp, glyph_names};
pub use tools::{TableCompiler, TtxCompiler};
pub use types::{BBox, Color, Paint};
pub use xml::Element;

/// Converts a directory of per-codepoint SVG files into a COLR/CPAL font.
#[derive(Debug, Clone)]
pub struct Layerizer {
    build_dir: PathBuf,
    fontforge: String,
    ttx: String,
    stroke_filter: StrokeFilter,
    compile_font: bool,
}

pub struct LayerizerBuilder {
    build_dir: PathBuf,
    fontforge: String,
    ttx: String,
    stroke_filter: StrokeFilter,
    compile_font: bool,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub font: FontData,
    pub ttx_path: PathBuf,
    /// `None` when font compilation was skipped.
    pub font_path: Option<PathBuf>,
    pub report: PaintReport,
    pub metrics: RunMetrics,
}

/// An input illustration: `<hex codepoint>.svg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub ident: String,
    pub codepoint: u32,
    pub path: PathBuf,
}

impl Default for LayerizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LayerizerBuilder {
    pub fn new() -> Self {
        Self {
            build_dir: PathBuf::from("build"),
            fontforge: "fontforge".to_string(),
            ttx: "ttx".to_string(),
            stroke_filter: StrokeFilter::default(),
            compile_font: true,
        }
    }

    /// Directory for intermediate files and the output font.
    pub fn build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = dir.into();
        self
    }

    pub fn fontforge(mut self, program: impl Into<String>) -> Self {
        self.fontforge = program.into();
        self
    }

    pub fn ttx(mut self, program: impl Into<String>) -> Self {
        self.ttx = program.into();
        self
    }

    pub fn stroke_filter(mut self, filter: StrokeFilter) -> Self {
        self.stroke_filter = filter;
        self
    }

    // When disabled the run stops after writing out.ttx.
    pub fn compile_font(mut self, enabled: bool) -> Self {
        self.compile_font = enabled;
        self
    }

    pub fn build(self) -> Result<Layerizer, LayerFontError> {
        if self.build_dir.as_os_str().is_empty() {
            return Err(LayerFontError::InvalidConfiguration(
                "build_dir must not be empty".to_string(),
            ));
        }
        if self.fontforge.trim().is_empty() || self.ttx.trim().is_empty() {
            return Err(LayerFontError::InvalidConfiguration(
                "external tool names must not be empty".to_string(),
            ));
        }
        let f = &self.stroke_filter;
        if !(f.drop_width.is_finite() && f.drop_width >= 0.0)
            || !(f.hairline_width.is_finite() && f.hairline_width >= 0.0)
        {
            return Err(LayerFontError::InvalidConfiguration(
                "stroke filter widths must be finite and non-negative".to_string(),
            ));
        }
        Ok(Layerizer {
            build_dir: self.build_dir,
            fontforge: self.fontforge,
            ttx: self.ttx,
            stroke_filter: self.stroke_filter,
            compile_font: self.compile_font,
        })
    }
}

impl Layerizer {
    pub fn builder() -> LayerizerBuilder {
        LayerizerBuilder::new()
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn stroke_filter(&self) -> &StrokeFilter {
        &self.stroke_filter
    }

    /// Runs with FontForge and ttx as the external compilers.
    pub fn run(&self, source_dir: &Path) -> Result<RunOutput, LayerFontError> {
        let mut outlines = FontForgeCompiler::new(&self.fontforge, &self.build_dir);
        let mut tables = TtxCompiler::new(&self.ttx);
        self.run_with(source_dir, &mut outlines, &mut tables)
    }

    pub fn run_with(
        &self,
        source_dir: &Path,
        outlines: &mut dyn OutlineCompiler,
        tables: &mut dyn TableCompiler,
    ) -> Result<RunOutput, LayerFontError> {
        let started = std::time::Instant::now();
        let info = FontInfo::load(source_dir)?;
        std::fs::create_dir_all(&self.build_dir)?;

        let mut font = FontData::new(info);
        let mut report = PaintReport::default();
        let mut metrics = RunMetrics::default();

        for source in source_files(source_dir)? {
            if font.contains(source.codepoint) {
                warn!(
                    "{}: codepoint U+{:04X} already defined, skipping",
                    source.path.display(),
                    source.codepoint
                );
                continue;
            }
            let text = std::fs::read_to_string(&source.path)?;
            let character = self
                .process_document(&mut font, &source, &text, outlines, &mut report)
                .map_err(|err| match err {
                    LayerFontError::Xml(message) => {
                        LayerFontError::Xml(format!("{}: {}", source.path.display(), message))
                    }
                    LayerFontError::InvalidColor(value) => LayerFontError::InvalidColor(format!(
                        "{} in {}",
                        value,
                        source.path.display()
                    )),
                    other => other,
                })?;
            metrics.characters.push(character);
        }

        let root = assemble(&font, chrono::Utc::now())?;
        let ttx_path = self.build_dir.join("out.ttx");
        std::fs::write(&ttx_path, root.to_pretty_string())?;
        info!("wrote {}", ttx_path.display());

        let font_path = if self.compile_font {
            let path = self.build_dir.join(format!("{}.ttf", font.info.font_name));
            tables.compile_tables(&ttx_path, &path)?;
            info!("wrote {}", path.display());
            Some(path)
        } else {
            None
        };

        metrics.component_count = font.components.len();
        metrics.reused_count = font.components.reused();
        metrics.palette_size = font.palette.len();
        metrics.total_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!("{}", metrics.summary());

        Ok(RunOutput {
            font,
            ttx_path,
            font_path,
            report,
            metrics,
        })
    }

    /// Decomposes, merges and deduplicates one illustration into `font`.
    pub fn process_document(
        &self,
        font: &mut FontData,
        source: &SourceFile,
        svg: &str,
        outlines: &mut dyn OutlineCompiler,
        report: &mut PaintReport,
    ) -> Result<CharacterMetrics, LayerFontError> {
        let started = std::time::Instant::now();
        let doc = SvgDocument::parse(svg)?;
        let sublayers = decompose(&doc, &source.ident, &self.stroke_filter, report)?;
        let sublayer_count = sublayers.len();
        let layers = merge_layers(sublayers);
        let before = font.components.len();
        font.add_character(
            &source.ident,
            source.codepoint,
            &doc.root_attributes,
            &layers,
            outlines,
        )?;
        let compiled_count = font.components.len() - before;
        info!(
            "u{}: {} sublayers, {} layers, {} new components",
            source.ident,
            sublayer_count,
            layers.len(),
            compiled_count
        );
        Ok(CharacterMetrics {
            ident: source.ident.clone(),
            process_ms: started.elapsed().as_secs_f64() * 1000.0,
            sublayer_count,
            layer_count: layers.len(),
            compiled_count,
        })
    }
}

/// Lists `<hex>.svg` files in `dir`, sorted by file name. Other names are
/// skipped with a warning.
pub fn source_files(dir: &Path) -> Result<Vec<SourceFile>, LayerFontError> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "svg") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(ident) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match u32::from_str_radix(ident, 16) {
            Ok(codepoint) if codepoint > 0 => files.push(SourceFile {
                ident: ident.to_string(),
                codepoint,
                path: path.clone(),
            }),
            _ => warn!("{}: not a hex codepoint name, skipping", path.display()),
        }
    }
    Ok(files)
}
