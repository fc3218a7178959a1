use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::Error;
use crate::model::{Alignment, Document, Paragraph, Run};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";

type Archive = zip::ZipArchive<std::fs::File>;

const MAX_LIST_LEVEL: u8 = 8;

struct LevelDef {
    num_fmt: String,
    lvl_text: String,
    indent_left: f32,
    indent_hanging: f32,
}

#[derive(Default)]
struct NumberingInfo {
    abstract_nums: HashMap<String, HashMap<u8, LevelDef>>,
    num_to_abstract: HashMap<String, String>,
}

struct ThemeFonts {
    major: String,
    minor: String,
}

struct StyleDefaults {
    font_size: f32,
    font_name: String,
    space_after: f32,
    line_spacing: f32, // multiplier from w:spacing @line / 240
}

struct ParagraphStyle {
    font_size: Option<f32>,
    font_name: Option<String>,
    bold: bool,
    color: Option<[u8; 3]>,
    space_before: f32,
    space_after: Option<f32>,
    alignment: Option<Alignment>,
    page_break_before: bool,
}

struct StylesInfo {
    defaults: StyleDefaults,
    paragraph_styles: HashMap<String, ParagraphStyle>,
}

fn twips_to_pts(twips: f32) -> f32 {
    twips / 20.0
}

fn parse_hex_color(val: &str) -> Option<[u8; 3]> {
    if val.len() != 6 || !val.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let r = u8::from_str_radix(&val[0..2], 16).ok()?;
    let g = u8::from_str_radix(&val[2..4], 16).ok()?;
    let b = u8::from_str_radix(&val[4..6], 16).ok()?;
    Some([r, g, b])
}

/// List levels run from 0 to 8.
fn parse_level(val: &str) -> Option<u8> {
    val.parse::<u8>().ok().filter(|&l| l <= MAX_LIST_LEVEL)
}

fn is_wml(node: roxmltree::Node, name: &str) -> bool {
    node.tag_name().name() == name && node.tag_name().namespace() == Some(WML_NS)
}

fn wml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children().find(|n| is_wml(*n, name))
}

fn wml_attr<'a>(node: roxmltree::Node<'a, 'a>, child: &str) -> Option<&'a str> {
    wml(node, child).and_then(|n| n.attribute((WML_NS, "val")))
}

/// A toggle property such as `<w:b/>`; `w:val="0"` or `"false"` switches it off.
fn wml_flag(node: roxmltree::Node, child: &str) -> bool {
    wml(node, child).is_some_and(|n| !matches!(n.attribute((WML_NS, "val")), Some("0" | "false")))
}

fn twips_attr(node: roxmltree::Node, attr: &str) -> Option<f32> {
    node.attribute((WML_NS, attr))
        .and_then(|v| v.parse::<f32>().ok())
        .map(twips_to_pts)
}

/// Auto line spacing as a multiplier; exact and at-least rules are ignored.
fn line_spacing_attr(spacing: roxmltree::Node) -> Option<f32> {
    match spacing.attribute((WML_NS, "lineRule")) {
        None | Some("auto") => spacing
            .attribute((WML_NS, "line"))
            .and_then(|v| v.parse::<f32>().ok())
            .map(|line| line / 240.0),
        _ => None,
    }
}

fn parse_alignment(val: &str) -> Alignment {
    match val {
        "center" => Alignment::Center,
        "right" | "end" => Alignment::Right,
        "both" | "distribute" => Alignment::Justify,
        _ => Alignment::Left,
    }
}

fn read_part(zip: &mut Archive, name: &str) -> Option<String> {
    let mut file = zip.by_name(name).ok()?;
    let mut content = String::new();
    file.read_to_string(&mut content).ok()?;
    Some(content)
}

fn dml<'a>(node: roxmltree::Node<'a, 'a>, name: &str) -> Option<roxmltree::Node<'a, 'a>> {
    node.children()
        .find(|n| n.tag_name().name() == name && n.tag_name().namespace() == Some(DML_NS))
}

fn latin_typeface<'a>(node: roxmltree::Node<'a, 'a>) -> Option<&'a str> {
    dml(node, "latin")
        .and_then(|n| n.attribute("typeface"))
        .filter(|tf| !tf.is_empty())
}

fn parse_theme(zip: &mut Archive) -> ThemeFonts {
    let mut theme = ThemeFonts {
        major: String::from("Calibri Light"),
        minor: String::from("Calibri"),
    };

    let names: Vec<String> = zip.file_names().map(str::to_string).collect();
    let Some(theme_name) = names
        .iter()
        .find(|n| n.starts_with("word/theme/") && n.ends_with(".xml"))
    else {
        return theme;
    };
    let Some(xml_content) = read_part(zip, theme_name) else {
        return theme;
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        return theme;
    };

    for node in xml.descendants() {
        if node.tag_name().namespace() != Some(DML_NS) {
            continue;
        }
        let slot = match node.tag_name().name() {
            "majorFont" => &mut theme.major,
            "minorFont" => &mut theme.minor,
            _ => continue,
        };
        if let Some(tf) = latin_typeface(node) {
            *slot = tf.to_string();
        }
    }
    theme
}

fn resolve_font(rfonts: roxmltree::Node, theme: &ThemeFonts, default_font: &str) -> String {
    if let Some(f) = rfonts.attribute((WML_NS, "ascii")) {
        return f.to_string();
    }
    match rfonts.attribute((WML_NS, "asciiTheme")) {
        Some("majorHAnsi") => theme.major.clone(),
        Some("minorHAnsi") => theme.minor.clone(),
        _ => default_font.to_string(),
    }
}

fn parse_styles(zip: &mut Archive, theme: &ThemeFonts) -> StylesInfo {
    let mut info = StylesInfo {
        defaults: StyleDefaults {
            font_size: 11.0,
            font_name: theme.minor.clone(),
            space_after: 0.0,
            line_spacing: 1.0,
        },
        paragraph_styles: HashMap::new(),
    };

    let Some(xml_content) = read_part(zip, "word/styles.xml") else {
        return info;
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        log::warn!("word/styles.xml is not well-formed, using built-in defaults");
        return info;
    };
    let root = xml.root_element();
    let defaults = &mut info.defaults;

    if let Some(doc_defaults) = wml(root, "docDefaults") {
        if let Some(rpr) = wml(doc_defaults, "rPrDefault").and_then(|n| wml(n, "rPr")) {
            if let Some(sz) = wml_attr(rpr, "sz").and_then(|v| v.parse::<f32>().ok()) {
                defaults.font_size = sz / 2.0;
            }
            if let Some(rfonts) = wml(rpr, "rFonts") {
                defaults.font_name = resolve_font(rfonts, theme, &theme.minor);
            }
        }
        let spacing = wml(doc_defaults, "pPrDefault")
            .and_then(|n| wml(n, "pPr"))
            .and_then(|n| wml(n, "spacing"));
        if let Some(spacing) = spacing {
            if let Some(after) = twips_attr(spacing, "after") {
                defaults.space_after = after;
            }
            if let Some(line) = line_spacing_attr(spacing) {
                defaults.line_spacing = line;
            }
        }
    }

    for style_node in root.children().filter(|n| is_wml(*n, "style")) {
        if style_node.attribute((WML_NS, "type")) != Some("paragraph") {
            continue;
        }
        let Some(style_id) = style_node.attribute((WML_NS, "styleId")) else {
            continue;
        };

        let ppr = wml(style_node, "pPr");
        let spacing = ppr.and_then(|n| wml(n, "spacing"));
        let rpr = wml(style_node, "rPr");

        let style = ParagraphStyle {
            font_size: rpr
                .and_then(|n| wml_attr(n, "sz"))
                .and_then(|v| v.parse::<f32>().ok())
                .map(|hp| hp / 2.0),
            font_name: rpr
                .and_then(|n| wml(n, "rFonts"))
                .map(|rfonts| resolve_font(rfonts, theme, &info.defaults.font_name)),
            bold: rpr.is_some_and(|n| wml_flag(n, "b")),
            color: rpr
                .and_then(|n| wml_attr(n, "color"))
                .and_then(parse_hex_color),
            space_before: spacing
                .and_then(|n| twips_attr(n, "before"))
                .unwrap_or(0.0),
            space_after: spacing.and_then(|n| twips_attr(n, "after")),
            alignment: ppr.and_then(|n| wml_attr(n, "jc")).map(parse_alignment),
            page_break_before: ppr.is_some_and(|n| wml_flag(n, "pageBreakBefore")),
        };
        info.paragraph_styles.insert(style_id.to_string(), style);
    }

    info
}

fn parse_numbering(zip: &mut Archive) -> NumberingInfo {
    let mut numbering = NumberingInfo::default();

    let Some(xml_content) = read_part(zip, "word/numbering.xml") else {
        return numbering;
    };
    let Ok(xml) = roxmltree::Document::parse(&xml_content) else {
        return numbering;
    };

    for node in xml.root_element().children() {
        if node.tag_name().namespace() != Some(WML_NS) {
            continue;
        }
        match node.tag_name().name() {
            "abstractNum" => {
                let Some(abs_id) = node.attribute((WML_NS, "abstractNumId")) else {
                    continue;
                };
                let mut levels = HashMap::new();
                for lvl in node.children().filter(|n| is_wml(*n, "lvl")) {
                    let Some(ilvl) = lvl.attribute((WML_NS, "ilvl")).and_then(parse_level) else {
                        continue;
                    };
                    let ind = wml(lvl, "pPr").and_then(|ppr| wml(ppr, "ind"));
                    levels.insert(
                        ilvl,
                        LevelDef {
                            num_fmt: wml_attr(lvl, "numFmt").unwrap_or("bullet").to_string(),
                            lvl_text: wml_attr(lvl, "lvlText").unwrap_or("").to_string(),
                            indent_left: ind.and_then(|n| twips_attr(n, "left")).unwrap_or(0.0),
                            indent_hanging: ind
                                .and_then(|n| twips_attr(n, "hanging"))
                                .unwrap_or(0.0),
                        },
                    );
                }
                numbering.abstract_nums.insert(abs_id.to_string(), levels);
            }
            "num" => {
                let (Some(num_id), Some(abs_id)) =
                    (node.attribute((WML_NS, "numId")), wml_attr(node, "abstractNumId"))
                else {
                    continue;
                };
                numbering
                    .num_to_abstract
                    .insert(num_id.to_string(), abs_id.to_string());
            }
            _ => {}
        }
    }

    numbering
}

/// Reads the text content and layout hints of a DOCX file.
pub fn parse(path: &Path) -> Result<Document, Error> {
    let file = std::fs::File::open(path)?;
    let mut zip = zip::ZipArchive::new(file)?;

    let theme = parse_theme(&mut zip);
    let styles = parse_styles(&mut zip, &theme);
    let numbering = parse_numbering(&mut zip);

    let xml_content = read_part(&mut zip, "word/document.xml")
        .ok_or_else(|| Error::InvalidDocx("missing word/document.xml".into()))?;
    let xml = roxmltree::Document::parse(&xml_content)?;
    let body = wml(xml.root_element(), "body")
        .ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;

    let mut doc = Document::letter();
    doc.line_spacing = styles.defaults.line_spacing;

    if let Some(sect) = wml(body, "sectPr") {
        if let Some(pg_sz) = wml(sect, "pgSz") {
            doc.page_width = twips_attr(pg_sz, "w").unwrap_or(doc.page_width);
            doc.page_height = twips_attr(pg_sz, "h").unwrap_or(doc.page_height);
        }
        if let Some(pg_mar) = wml(sect, "pgMar") {
            doc.margin_top = twips_attr(pg_mar, "top").unwrap_or(doc.margin_top);
            doc.margin_bottom = twips_attr(pg_mar, "bottom").unwrap_or(doc.margin_bottom);
            doc.margin_left = twips_attr(pg_mar, "left").unwrap_or(doc.margin_left);
            doc.margin_right = twips_attr(pg_mar, "right").unwrap_or(doc.margin_right);
        }
    }

    let ctx = BodyContext { theme: &theme, styles: &styles, numbering: &numbering };
    let mut counters: HashMap<(String, u8), u32> = HashMap::new();

    for node in body.children() {
        if is_wml(node, "p") {
            ctx.paragraph(node, &mut counters, &mut doc.paragraphs);
        } else if is_wml(node, "tbl") {
            ctx.table(node, &mut doc.paragraphs);
        }
    }

    log::debug!(
        "Parsed {} paragraphs from {} ({}x{} pt)",
        doc.paragraphs.len(),
        path.display(),
        doc.page_width,
        doc.page_height
    );
    Ok(doc)
}

struct BodyContext<'s> {
    theme: &'s ThemeFonts,
    styles: &'s StylesInfo,
    numbering: &'s NumberingInfo,
}

impl BodyContext<'_> {
    /// Appends one or more paragraphs; a `w:br w:type="page"` inside the
    /// paragraph splits it, and the remainder starts on a new page.
    fn paragraph(
        &self,
        node: roxmltree::Node,
        counters: &mut HashMap<(String, u8), u32>,
        out: &mut Vec<Paragraph>,
    ) {
        let defaults = &self.styles.defaults;
        let ppr = wml(node, "pPr");
        let para_style = ppr
            .and_then(|ppr| wml_attr(ppr, "pStyle"))
            .and_then(|id| self.styles.paragraph_styles.get(id));
        let inline_spacing = ppr.and_then(|ppr| wml(ppr, "spacing"));

        let space_before = inline_spacing
            .and_then(|n| twips_attr(n, "before"))
            .or_else(|| para_style.map(|s| s.space_before))
            .unwrap_or(0.0);
        let space_after = inline_spacing
            .and_then(|n| twips_attr(n, "after"))
            .or_else(|| para_style.and_then(|s| s.space_after))
            .unwrap_or(defaults.space_after);
        let line_spacing = inline_spacing.and_then(line_spacing_attr);

        let alignment = ppr
            .and_then(|ppr| wml_attr(ppr, "jc"))
            .map(parse_alignment)
            .or_else(|| para_style.and_then(|s| s.alignment))
            .unwrap_or(Alignment::Left);

        let page_break_before = ppr.is_some_and(|ppr| wml_flag(ppr, "pageBreakBefore"))
            || para_style.is_some_and(|s| s.page_break_before);

        let num_pr = ppr.and_then(|ppr| wml(ppr, "numPr"));
        let (mut indent_left, mut indent_hanging, list_label) =
            parse_list_info(num_pr, self.numbering, counters);

        // Paragraph-level w:ind overrides the numbering level
        if let Some(ind) = ppr.and_then(|ppr| wml(ppr, "ind")) {
            if let Some(v) = twips_attr(ind, "left") {
                indent_left = v;
            }
            if let Some(v) = twips_attr(ind, "hanging") {
                indent_hanging = v;
            }
        }

        let style_font_size = para_style
            .and_then(|s| s.font_size)
            .unwrap_or(defaults.font_size);
        let style_font_name = para_style
            .and_then(|s| s.font_name.as_deref())
            .unwrap_or(&defaults.font_name);
        let style_bold = para_style.is_some_and(|s| s.bold);
        let style_color = para_style.and_then(|s| s.color);

        let mut current = Paragraph {
            runs: Vec::new(),
            space_before,
            space_after,
            content_height: compute_drawing_height(node),
            alignment,
            indent_left,
            indent_hanging,
            list_label,
            page_break_before,
            line_spacing,
        };

        for run_node in node.children().filter(|n| is_wml(*n, "r")) {
            let rpr = wml(run_node, "rPr");
            let make_run = |text: String| Run {
                text,
                font_size: rpr
                    .and_then(|n| wml_attr(n, "sz"))
                    .and_then(|v| v.parse::<f32>().ok())
                    .map(|hp| hp / 2.0)
                    .unwrap_or(style_font_size),
                font_name: rpr
                    .and_then(|n| wml(n, "rFonts"))
                    .map(|rfonts| resolve_font(rfonts, self.theme, style_font_name))
                    .unwrap_or_else(|| style_font_name.to_string()),
                bold: rpr.map_or(style_bold, |n| {
                    wml(n, "b").map_or(style_bold, |_| wml_flag(n, "b"))
                }),
                italic: rpr.is_some_and(|n| wml_flag(n, "i")),
                color: rpr
                    .and_then(|n| wml_attr(n, "color"))
                    .and_then(parse_hex_color)
                    .or(style_color),
            };

            let mut text = String::new();
            for child in run_node.children() {
                if child.tag_name().namespace() != Some(WML_NS) {
                    continue;
                }
                match child.tag_name().name() {
                    "t" => text.push_str(child.text().unwrap_or("")),
                    "tab" => text.push('\t'),
                    "br" if child.attribute((WML_NS, "type")) == Some("page") => {
                        if !text.is_empty() {
                            current.runs.push(make_run(std::mem::take(&mut text)));
                        }
                        let next = Paragraph {
                            runs: Vec::new(),
                            space_before: 0.0,
                            space_after: current.space_after,
                            content_height: 0.0,
                            alignment: current.alignment,
                            indent_left: current.indent_left,
                            indent_hanging: current.indent_hanging,
                            list_label: String::new(),
                            page_break_before: true,
                            line_spacing: current.line_spacing,
                        };
                        out.push(std::mem::replace(&mut current, next));
                    }
                    "br" | "cr" => text.push(' '),
                    _ => {}
                }
            }
            if !text.is_empty() {
                current.runs.push(make_run(text));
            }
        }

        out.push(current);
    }

    /// Tables are flattened: one paragraph per row, cells separated by tabs.
    fn table(&self, node: roxmltree::Node, out: &mut Vec<Paragraph>) {
        let defaults = &self.styles.defaults;
        for row in node.children().filter(|n| is_wml(*n, "tr")) {
            let cells: Vec<String> = row
                .children()
                .filter(|n| is_wml(*n, "tc"))
                .map(|cell| {
                    cell.descendants()
                        .filter(|n| is_wml(*n, "t"))
                        .filter_map(|n| n.text())
                        .collect::<String>()
                })
                .collect();
            let mut para = Paragraph::plain(cells.join("\t"), defaults.font_size);
            para.runs[0].font_name = defaults.font_name.clone();
            para.space_after = 2.0;
            out.push(para);
        }
    }
}

fn parse_list_info(
    num_pr: Option<roxmltree::Node>,
    numbering: &NumberingInfo,
    counters: &mut HashMap<(String, u8), u32>,
) -> (f32, f32, String) {
    let none = (0.0, 0.0, String::new());
    let Some(num_pr) = num_pr else {
        return none;
    };
    let Some(num_id) = wml_attr(num_pr, "numId") else {
        return none;
    };
    let ilvl = match wml_attr(num_pr, "ilvl") {
        None => 0,
        Some(v) => match parse_level(v) {
            Some(level) => level,
            None => return none,
        },
    };

    let Some(def) = numbering
        .num_to_abstract
        .get(num_id)
        .and_then(|abs_id| numbering.abstract_nums.get(abs_id))
        .and_then(|levels| levels.get(&ilvl))
    else {
        return none;
    };

    let counter = counters
        .entry((num_id.to_string(), ilvl))
        .and_modify(|c| *c += 1)
        .or_insert(1);
    let label = if def.num_fmt == "bullet" {
        "\u{2022}".to_string()
    } else {
        def.lvl_text.replace(&format!("%{}", ilvl + 1), &counter.to_string())
    };
    (def.indent_left, def.indent_hanging, label)
}

fn compute_drawing_height(para_node: roxmltree::Node) -> f32 {
    let mut max_height: f32 = 0.0;
    for drawing in para_node.descendants().filter(|n| is_wml(*n, "drawing")) {
        for container in drawing.children() {
            let name = container.tag_name().name();
            if (name == "inline" || name == "anchor")
                && container.tag_name().namespace() == Some(WPD_NS)
                && let Some(cy) = container
                    .children()
                    .find(|n| {
                        n.tag_name().name() == "extent"
                            && n.tag_name().namespace() == Some(WPD_NS)
                    })
                    .and_then(|n| n.attribute("cy"))
                    .and_then(|v| v.parse::<f32>().ok())
            {
                // EMU to points
                max_height = max_height.max(cy / 12700.0);
            }
        }
    }
    max_height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_values() {
        assert_eq!(parse_alignment("center"), Alignment::Center);
        assert_eq!(parse_alignment("end"), Alignment::Right);
        assert_eq!(parse_alignment("both"), Alignment::Justify);
        assert_eq!(parse_alignment("start"), Alignment::Left);
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("FF8000"), Some([255, 128, 0]));
        assert_eq!(parse_hex_color("auto"), None);
        assert_eq!(parse_hex_color("F80"), None);
        assert_eq!(parse_hex_color("1\u{e9}234"), None);
        assert_eq!(parse_hex_color("GG0000"), None);
    }

    #[test]
    fn list_levels_past_eight_get_no_label() {
        assert_eq!(parse_level("8"), Some(8));
        assert_eq!(parse_level("9"), None);
        assert_eq!(parse_level("255"), None);

        let level = |text: &str| LevelDef {
            num_fmt: "decimal".into(),
            lvl_text: text.into(),
            indent_left: 36.0,
            indent_hanging: 18.0,
        };
        let mut numbering = NumberingInfo::default();
        numbering.abstract_nums.insert(
            "0".into(),
            HashMap::from([(0, level("%1.")), (255, level("%256."))]),
        );
        numbering.num_to_abstract.insert("1".into(), "0".into());

        let xml = format!(
            r#"<w:numPr xmlns:w="{WML_NS}"><w:ilvl w:val="255"/><w:numId w:val="1"/></w:numPr>"#
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let mut counters = HashMap::new();
        let (indent, _, label) =
            parse_list_info(Some(doc.root_element()), &numbering, &mut counters);
        assert_eq!(indent, 0.0);
        assert!(label.is_empty());
        assert!(counters.is_empty());

        let xml = format!(r#"<w:numPr xmlns:w="{WML_NS}"><w:numId w:val="1"/></w:numPr>"#);
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let (indent, _, label) =
            parse_list_info(Some(doc.root_element()), &numbering, &mut counters);
        assert_eq!(indent, 36.0);
        assert_eq!(label, "1.");
    }

    #[test]
    fn toggles_respect_val() {
        let xml = format!(
            r#"<w:rPr xmlns:w="{WML_NS}"><w:b/><w:i w:val="0"/></w:rPr>"#
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let rpr = doc.root_element();
        assert!(wml_flag(rpr, "b"));
        assert!(!wml_flag(rpr, "i"));
        assert!(!wml_flag(rpr, "u"));
    }

    #[test]
    fn exact_line_rule_is_ignored() {
        let xml = format!(
            r#"<w:pPr xmlns:w="{WML_NS}"><w:spacing w:line="360"/><w:spacing w:line="300" w:lineRule="exact"/></w:pPr>"#
        );
        let doc = roxmltree::Document::parse(&xml).unwrap();
        let mut spacings = doc.root_element().children().filter(|n| n.is_element());
        assert_eq!(line_spacing_attr(spacings.next().unwrap()), Some(1.5));
        assert_eq!(line_spacing_attr(spacings.next().unwrap()), None);
    }
}
