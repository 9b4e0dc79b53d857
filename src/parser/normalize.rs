//! Rewrites legacy markup shapes into the canonical shape the extractors read
//!
//! Two generations of markup are in circulation:
//! - Legacy: `<startouttext />` text blocks, `<additional_answer>TEXT</additional_answer>`,
//!   `<optioninput>` with child `<option correct="...">` elements
//! - Explicit: `<text>`, `<additional_answer answer="TEXT"/>`,
//!   `<optioninput options="('a','b')" correct="b"/>`
//!
//! Every rewrite here is idempotent.

use super::xml::MarkupDocument;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::sync::LazyLock;

static START_OUT_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"startouttext\s*/").expect("valid startouttext pattern"));
static END_OUT_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"endouttext\s*/").expect("valid endouttext pattern"));

/// Markup generation detected while normalizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupGeneration {
    Explicit,
    Legacy,
}

/// What [`normalize`] rewrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// `<startouttext />` blocks rewritten before parsing
    pub text_blocks: usize,
    pub additional_answers: usize,
    pub option_inputs: usize,
}

impl NormalizeReport {
    pub fn rewrites(&self) -> usize {
        self.text_blocks + self.additional_answers + self.option_inputs
    }

    pub fn generation(&self) -> MarkupGeneration {
        if self.rewrites() > 0 {
            MarkupGeneration::Legacy
        } else {
            MarkupGeneration::Explicit
        }
    }
}

/// Turn `<startouttext />` / `<endouttext />` into `<text>` / `</text>`
///
/// Runs on raw text because the legacy pair is not well-formed until rewritten.
pub fn rewrite_legacy_text(markup: &str) -> Cow<'_, str> {
    if !markup.contains("startouttext") && !markup.contains("endouttext") {
        return Cow::Borrowed(markup);
    }
    let rewritten = START_OUT_TEXT.replace_all(markup, "text");
    let rewritten = END_OUT_TEXT.replace_all(&rewritten, "/text");
    Cow::Owned(rewritten.into_owned())
}

/// Number of `<startouttext />` blocks in raw markup
pub fn legacy_text_blocks(markup: &str) -> usize {
    START_OUT_TEXT.find_iter(markup).count()
}

/// Rewrite legacy element shapes in place
pub fn normalize(doc: &mut MarkupDocument) -> NormalizeReport {
    let mut report = NormalizeReport::default();

    for response in doc.find_all(&["stringresponse"]) {
        for additional in doc.children_named(response, "additional_answer") {
            let has_answer = doc
                .attr(additional, "answer")
                .is_some_and(|answer| !answer.is_empty());
            let text = doc.text(additional).map(str::to_string);
            match text {
                Some(text) if !has_answer && !text.is_empty() => {
                    doc.set_attr(additional, "answer", text);
                    doc.set_text(additional, "");
                    report.additional_answers += 1;
                }
                _ => {}
            }
        }
    }

    for input in doc.find_all(&["optioninput"]) {
        let options = doc.children_named(input, "option");
        if options.is_empty() {
            continue;
        }

        let mut correct_option = None;
        let mut names = Vec::with_capacity(options.len());
        for option in options {
            let name = doc.text(option).unwrap_or_default().trim().to_string();
            let correct = doc
                .attr(option, "correct")
                .is_some_and(|value| value.eq_ignore_ascii_case("true"));
            if correct {
                correct_option = Some(name.clone());
            }
            names.push(format!("'{}'", name));
        }

        doc.set_attr(input, "options", format!("({})", names.join(",")));
        if let Some(correct) = correct_option {
            doc.set_attr(input, "correct", correct);
        }
        report.option_inputs += 1;
    }

    report
}
