use crate::report::Finding;
use regex::Regex;
use url::Url;

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

const MALFORMED_MARKUP_SCORE: u32 = 50;
const SCRIPT_ELEMENT_SCORE: u32 = 100;
const SPOOFED_LINK_SCORE: u32 = 50;

pub const NO_VISIBLE_TEXT: &str = "[no visible text]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgAnalysisResult {
    pub score: u32,
    pub findings: Vec<Finding>,
}

/// Inspects a single SVG fragment for script injection and link
/// label/destination spoofing.
#[derive(Debug)]
pub struct SvgThreatAnalyzer {
    domain_pattern: Regex,
}

impl Default for SvgThreatAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SvgThreatAnalyzer {
    pub fn new() -> Self {
        Self {
            // Latin-alphabet domain-like text: dotted lowercase alnum/hyphen
            // segments with a >=2 letter suffix. Non-Latin labels never match,
            // so the spoofing penalty never fires for them.
            domain_pattern: Regex::new(r"(?i)([a-z0-9]+(-[a-z0-9]+)*\.)+[a-z]{2,}").unwrap(),
        }
    }

    /// Analyze one fragment. Pure function of the markup; every call gets a
    /// fresh accumulator.
    pub fn analyze(&self, svg_markup: &str) -> SvgAnalysisResult {
        let mut result = SvgAnalysisResult {
            score: 0,
            findings: Vec::new(),
        };

        let document = match roxmltree::Document::parse(svg_markup) {
            Ok(document) => document,
            Err(e) => {
                // Unparseable markup is terminal for this fragment.
                log::debug!("SVG fragment failed to parse: {e}");
                result.score += MALFORMED_MARKUP_SCORE;
                result.findings.push(Finding::new(
                    MALFORMED_MARKUP_SCORE,
                    "Malformed SVG markup, could not be parsed",
                ));
                return result;
            }
        };

        self.detect_scripts(&document, &mut result);
        self.analyze_links(&document, &mut result);

        // Detecting text hidden as vector paths would require rasterizing the
        // SVG and OCR-scanning the image; that capability is absent, and the
        // report must say so rather than imply the check came back clean.
        result.findings.push(Finding::info(
            "Note: image-based hidden text check not performed (no rendering/OCR support)",
        ));

        result
    }

    fn detect_scripts(&self, document: &roxmltree::Document, result: &mut SvgAnalysisResult) {
        let script_count = document
            .descendants()
            .filter(|node| is_svg_element(node, "script"))
            .count();

        if script_count > 0 {
            // Flat penalty: one script is as bad as five.
            result.score += SCRIPT_ELEMENT_SCORE;
            result.findings.push(Finding::new(
                SCRIPT_ELEMENT_SCORE,
                format!("High risk: {script_count} <script> element(s) in SVG may execute malicious code"),
            ));
        }
    }

    fn analyze_links(&self, document: &roxmltree::Document, result: &mut SvgAnalysisResult) {
        for link in document
            .descendants()
            .filter(|node| is_svg_element(node, "a"))
        {
            // xlink:href takes precedence over a plain href attribute.
            let destination = link
                .attribute((XLINK_NS, "href"))
                .or_else(|| link.attribute("href"));

            let Some(destination) = destination.filter(|url| !url.is_empty()) else {
                continue;
            };

            let label = link
                .descendants()
                .find(|node| is_svg_element(node, "text"))
                .and_then(|node| node.text())
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .unwrap_or(NO_VISIBLE_TEXT);

            result.findings.push(Finding::info(format!(
                "Link in SVG: label='{label}', destination='{destination}'"
            )));

            if let Some(matched) = self.domain_pattern.find(label) {
                let label_host = matched.as_str().to_lowercase();
                let destination_host = Url::parse(destination)
                    .ok()
                    .and_then(|url| url.host_str().map(str::to_lowercase));

                // A destination without a parseable host still counts as a
                // mismatch when the label claims to be a domain.
                if destination_host.as_deref() != Some(label_host.as_str()) {
                    result.score += SPOOFED_LINK_SCORE;
                    result.findings.push(Finding::new(
                        SPOOFED_LINK_SCORE,
                        format!(
                            "Warning: SVG link label '{label}' does not match destination '{destination}', highly suspicious"
                        ),
                    ));
                }
            }
        }
    }
}

fn is_svg_element(node: &roxmltree::Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(SVG_NS)
        && node.tag_name().name() == name
}
