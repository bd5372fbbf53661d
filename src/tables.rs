use chrono::{DateTime, Utc};

use crate::dedup::LayerComponent;
use crate::error::LayerFontError;
use crate::font_data::FontData;
use crate::xml::Element;

pub const UNITS_PER_EM: u16 = 512;
pub const ADVANCE_WIDTH: u16 = 512;

const HEAD: &[(&str, &str)] = &[
    ("tableVersion", "1.0"),
    ("fontRevision", "1.0"),
    ("checkSumAdjustment", "0x0"),
    ("magicNumber", "0x5f0f3cf5"),
    ("flags", "00000000 00001011"),
];

const HEAD_TAIL: &[(&str, &str)] = &[
    ("xMin", "0"),
    ("yMin", "0"),
    ("xMax", "512"),
    ("yMax", "512"),
    ("macStyle", "00000000 00000000"),
    ("lowestRecPPEM", "16"),
    ("fontDirectionHint", "0"),
    ("indexToLocFormat", "0"),
    ("glyphDataFormat", "0"),
];

const HHEA: &[(&str, &str)] = &[
    ("tableVersion", "0x00010000"),
    ("ascent", "466"),
    ("descent", "-46"),
    ("lineGap", "46"),
    ("advanceWidthMax", "512"),
    ("minLeftSideBearing", "0"),
    ("minRightSideBearing", "0"),
    ("xMaxExtent", "512"),
    ("caretSlopeRise", "1"),
    ("caretSlopeRun", "0"),
    ("caretOffset", "0"),
    ("reserved0", "0"),
    ("reserved1", "0"),
    ("reserved2", "0"),
    ("reserved3", "0"),
    ("metricDataFormat", "0"),
    ("numberOfHMetrics", "1"),
];

const MAXP: &[(&str, &str)] = &[
    ("tableVersion", "0x10000"),
    ("maxZones", "2"),
    ("maxTwilightPoints", "0"),
    ("maxStorage", "1"),
    ("maxFunctionDefs", "1"),
    ("maxInstructionDefs", "0"),
    ("maxStackElements", "64"),
    ("maxSizeOfInstructions", "0"),
];

const ZERO_RANGE: &str = "00000000 00000000 00000000 00000000";

const OS2_HEAD: &[(&str, &str)] = &[
    ("version", "4"),
    ("xAvgCharWidth", "512"),
    ("usWeightClass", "400"),
    ("usWidthClass", "5"),
    ("fsType", "00000000 00000000"),
    ("ySubscriptXSize", "512"),
    ("ySubscriptYSize", "512"),
    ("ySubscriptXOffset", "0"),
    ("ySubscriptYOffset", "0"),
    ("ySuperscriptXSize", "512"),
    ("ySuperscriptYSize", "512"),
    ("ySuperscriptXOffset", "0"),
    ("ySuperscriptYOffset", "0"),
    ("yStrikeoutSize", "5"),
    ("yStrikeoutPosition", "251"),
    ("sFamilyClass", "0"),
    ("ulUnicodeRange1", ZERO_RANGE),
    ("ulUnicodeRange2", ZERO_RANGE),
    ("ulUnicodeRange3", ZERO_RANGE),
    ("ulUnicodeRange4", ZERO_RANGE),
];

const OS2_TAIL: &[(&str, &str)] = &[
    ("fsSelection", "00000000 01000000"),
    ("sTypoAscender", "512"),
    ("sTypoDescender", "0"),
    ("sTypoLineGap", "46"),
    ("usWinAscent", "466"),
    ("usWinDescent", "46"),
    ("ulCodePageRange1", ZERO_RANGE),
    ("ulCodePageRange2", ZERO_RANGE),
    ("sxHeight", "0"),
    ("sCapHeight", "0"),
    ("usDefaultChar", "0"),
    ("usBreakChar", "0x0"),
    ("usMaxContext", "0"),
];

const PANOSE: &[(&str, &str)] = &[
    ("bFamilyType", "2"),
    ("bSerifStyle", "0"),
    ("bWeight", "5"),
    ("bProportion", "9"),
    ("bContrast", "0"),
    ("bStrokeVariation", "0"),
    ("bArmStyle", "0"),
    ("bLetterForm", "0"),
    ("bMidline", "0"),
    ("bXHeight", "0"),
];

const POST: &[(&str, &str)] = &[
    ("formatType", "2.0"),
    ("italicAngle", "0.0"),
    ("underlinePosition", "0"),
    ("underlineThickness", "0"),
    ("isFixedPitch", "1"),
    ("minMemType42", "0"),
    ("maxMemType42", "0"),
    ("minMemType1", "0"),
    ("maxMemType1", "0"),
];

// (platformID, platEncID, langID) for every name record.
const NAME_PLATFORMS: &[(&str, &str, &str)] =
    &[("0", "0", "0x0"), ("1", "0", "0x0"), ("3", "1", "0x0409")];

fn values(mut table: Element, entries: &[(&str, &str)]) -> Element {
    for (name, value) in entries {
        table = table.value(name, value);
    }
    table
}

/// `head.created` as TTX writes it, e.g. `Tue Mar  5 09:04:00 2024`.
pub fn format_timestamp(created: DateTime<Utc>) -> String {
    created.format("%a %b %e %H:%M:%S %Y").to_string()
}

/// Builds the complete TTX document for a finished run.
pub fn assemble(font: &FontData, created: DateTime<Utc>) -> Result<Element, LayerFontError> {
    let head = values(Element::new("head"), HEAD)
        .value("created", format_timestamp(created))
        .value("unitsPerEm", UNITS_PER_EM);
    let tables = [
        glyph_order(font),
        name_table(font)?,
        values(head, HEAD_TAIL),
        values(Element::new("hhea"), HHEA),
        values(Element::new("maxp"), MAXP),
        os2_table(font),
        Element::new("loca"),
        hmtx_table(font),
        cmap_table(font),
        glyf_table(font),
        post_table(font),
        Element::new("gasp").child(
            Element::new("gaspRange")
                .attr("rangeMaxPPEM", 65535)
                .attr("rangeGaspBehavior", 2),
        ),
        colr_table(font),
        cpal_table(font),
        gdef_table(font),
    ];
    let mut root = Element::new("ttFont")
        .attr("sfntVersion", "\\x00\\x01\\x00\\x00")
        .attr("ttLibVersion", "4.13");
    for table in tables {
        root.push(table);
    }
    Ok(root)
}

/// Glyph names in font order: `.notdef`, characters, components.
pub fn glyph_names(font: &FontData) -> Vec<&str> {
    std::iter::once(".notdef")
        .chain(font.characters.iter().map(|c| c.name.as_str()))
        .chain(font.components.components().iter().map(|c| c.name.as_str()))
        .collect()
}

fn glyph_order(font: &FontData) -> Element {
    let mut order = Element::new("GlyphOrder");
    for (id, name) in glyph_names(font).into_iter().enumerate() {
        order.push(Element::new("GlyphID").attr("id", id).attr("name", name));
    }
    order
}

fn name_table(font: &FontData) -> Result<Element, LayerFontError> {
    let mut name = Element::new("name");
    for (id, text) in font.info.name_records()? {
        for (platform, encoding, lang) in NAME_PLATFORMS {
            name.push(
                Element::new("namerecord")
                    .attr("nameID", id)
                    .attr("platformID", platform)
                    .attr("platEncID", encoding)
                    .attr("langID", lang)
                    .cdata(text.as_str()),
            );
        }
    }
    Ok(name)
}

fn os2_table(font: &FontData) -> Element {
    let os2 = values(Element::new("OS_2"), OS2_HEAD).value("achVendID", &font.info.vendor);
    values(os2, OS2_TAIL).child(values(Element::new("panose"), PANOSE))
}

fn hmtx_table(font: &FontData) -> Element {
    let metric = |name: &str, lsb: i16| {
        Element::new("mtx")
            .attr("name", name)
            .attr("width", ADVANCE_WIDTH)
            .attr("lsb", lsb)
    };
    let mut hmtx = Element::new("hmtx").child(metric(".notdef", 0));
    for character in &font.characters {
        hmtx.push(metric(character.name.as_str(), 0));
    }
    for component in font.components.components() {
        hmtx.push(metric(component.name.as_str(), component.lsb));
    }
    hmtx
}

fn cmap_table(font: &FontData) -> Element {
    let count = font.characters.len();
    let mut format12 = Element::new("cmap_format_12")
        .attr("platformID", 0)
        .attr("platEncID", 4)
        .attr("language", 0)
        .attr("format", 12)
        .attr("reserved", 0)
        .attr("length", count * 12)
        .attr("nGroups", count);
    for character in &font.characters {
        format12.push(
            Element::new("map")
                .attr("code", format!("0x{}", character.ident))
                .attr("name", &character.name),
        );
    }
    Element::new("cmap")
        .child(Element::new("tableVersion").attr("version", 0))
        .child(format12)
}

fn glyf_table(font: &FontData) -> Element {
    let mut glyf = Element::new("glyf").child(Element::new("TTGlyph").attr("name", ".notdef"));
    for character in &font.characters {
        glyf.push(Element::new("TTGlyph").attr("name", &character.name));
    }
    for component in font.components.components() {
        glyf.push(component_glyph(component));
    }
    glyf
}

fn component_glyph(component: &LayerComponent) -> Element {
    let mut glyph = Element::new("TTGlyph").attr("name", &component.name);
    let Some((x_min, y_min, x_max, y_max)) = component.outline.bounds() else {
        return glyph;
    };
    glyph = glyph
        .attr("xMin", x_min)
        .attr("yMin", y_min)
        .attr("xMax", x_max)
        .attr("yMax", y_max);
    for contour in &component.outline.contours {
        let mut c = Element::new("contour");
        for p in contour {
            c.push(
                Element::new("pt")
                    .attr("x", p.x)
                    .attr("y", p.y)
                    .attr("on", u8::from(p.on_curve)),
            );
        }
        glyph.push(c);
    }
    glyph.child(Element::new("instructions"))
}

fn post_table(font: &FontData) -> Element {
    let mut extra = Element::new("extraNames");
    for character in font.characters.iter().filter(|c| !c.is_null()) {
        extra.push(Element::new("psName").attr("name", &character.name));
    }
    for component in font.components.components() {
        extra.push(Element::new("psName").attr("name", &component.name));
    }
    values(Element::new("post"), POST)
        .child(Element::new("psNames"))
        .child(extra)
}

fn colr_table(font: &FontData) -> Element {
    let mut colr = Element::new("COLR").value("version", 0);
    for character in font.characters.iter().filter(|c| !c.is_null()) {
        let mut glyph = Element::new("ColorGlyph").attr("name", &character.name);
        for layer in &character.layers {
            let name = font
                .components
                .get(layer.component)
                .map(|c| c.name.as_str())
                .unwrap_or(".notdef");
            glyph.push(
                Element::new("layer")
                    .attr("colorID", layer.palette_index)
                    .attr("name", name),
            );
        }
        colr.push(glyph);
    }
    colr
}

fn cpal_table(font: &FontData) -> Element {
    let mut palette = Element::new("palette").attr("index", 0);
    for (index, color) in font.palette.colors().iter().enumerate() {
        palette.push(Element::new("color").attr("index", index).attr("value", color));
    }
    Element::new("CPAL")
        .value("version", 0)
        .value("numPaletteEntries", font.palette.len())
        .child(palette)
}

fn gdef_table(font: &FontData) -> Element {
    let mut classes = Element::new("GlyphClassDef").attr("Format", 2);
    let names = font
        .characters
        .iter()
        .map(|c| c.name.as_str())
        .chain(font.components.components().iter().map(|c| c.name.as_str()));
    for name in names {
        classes.push(Element::new("ClassDef").attr("glyph", name).attr("class", 1));
    }
    Element::new("GDEF").value("Version", "0x0010000").child(classes)
}
