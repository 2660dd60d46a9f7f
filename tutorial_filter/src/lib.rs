mod config;
pub mod manual;

use log::{debug, info};

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

pub use crate::config::*;

// **** Fence patterns ****

// A fence opening a chunk that must not appear in the handout: either it
// carries an explicit remove_for_md flag, or its label ends in one of the
// learnr-specific suffixes (-solution, -code-check, -hint, -hint-<n>).
static SUPPRESSED_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^```\{[^}]*(?:remove_for_md\s*=\s*T|-solution\s*[,}]|-code-check\s*[,}]|-hint(?:-\d+)?\s*[,}])",
    )
    .unwrap()
});

// A fence opening an interactive exercise chunk. These are kept, but the
// exercise attribute has to go or knitr chokes on it.
static EXERCISE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```\{[^}]*exercise\s*=\s*T").unwrap());

static EXERCISE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*exercise\s*=\s*T(?:RUE)?").unwrap());

// **** Leading metadata block ****

static TITLE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^title:\s*(.*)$").unwrap());

static KEEP_OUTPUT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*keep_output\s*:\s*(true|false|yes|no)\s*$").unwrap());

const METADATA_DELIMITER: &str = "---";
const CLOSING_FENCE: &str = "```";

/// Synthesizes the handout header for the given metadata.
///
/// The header is one fixed template with two substitution points: the title
/// and the knitr chunk options. With `keep_output` set, figures go to an
/// `img/` directory and chunk results stay in the document; without it, both
/// are dropped from the rendered output.
pub fn synthesize_header(front: &FrontMatter) -> String {
    let opts = if front.keep_output {
        r#"message=FALSE, warning=FALSE, fig.path = "img/""#
    } else {
        r#"message=FALSE, warning=FALSE, results="hide", fig.show="hide""#
    };
    format!(
        "---\n\
         title: {title}\n\
         output:\n  \
           github_document:\n    \
             toc: yes\n\
         editor_options:\n  \
           chunk_output_type: console\n\
         ---\n\
         \n\
         ```{{r opts, echo = FALSE}}\n\
         knitr::opts_chunk$set({opts})\n\
         ```",
        title = front.title,
        opts = opts
    )
}

// The body filter is a two-state scan. While suppressing, nothing is
// emitted; any closing fence returns to copying, even one that did not open
// a suppressed chunk.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum FilterState {
    Copying,
    Suppressing,
}

/// Runs the body filter over `body` and prepends the synthesized header.
///
/// This is the pure core: no I/O, no state across calls. Lines are emitted
/// in their original order and content, except that suppressed chunks
/// (fences included) are dropped and `exercise = TRUE` attributes are
/// deleted from the fences that carry them.
pub fn filter_document(body: &[&str], front: &FrontMatter) -> String {
    let mut out = synthesize_header(front);
    out.push('\n');

    let mut state = FilterState::Copying;
    for raw in body {
        let line: Cow<str> = if SUPPRESSED_FENCE.is_match(raw) {
            state = FilterState::Suppressing;
            Cow::Borrowed(*raw)
        } else if EXERCISE_FENCE.is_match(raw) {
            EXERCISE_ATTR.replace(raw, "")
        } else {
            Cow::Borrowed(*raw)
        };

        if state == FilterState::Copying {
            out.push_str(&line);
            out.push('\n');
        }

        // An unterminated suppressed chunk silently stays suppressed to the
        // end of the document.
        if line.trim() == CLOSING_FENCE {
            state = FilterState::Copying;
        }
    }
    out
}

/// Converts a full tutorial document into a handout.
///
/// The leading metadata block (between the first and second `---` line) is
/// scanned for a `title:` declaration and an optional `keep_output:` option
/// and then replaced wholesale by the synthesized header; the remaining
/// lines go through [filter_document]. Values in `overrides` win over
/// whatever the document declares.
///
/// ```
/// use tutorial_filter::{convert_str, FrontMatterOverrides};
///
/// let doc = "---\ntitle: Intro\n---\nSome text\n";
/// let handout = convert_str(doc, &FrontMatterOverrides::default())?;
/// assert!(handout.text.ends_with("Some text\n"));
/// assert_eq!(handout.front_matter.title, "Intro");
/// # Ok::<(), tutorial_filter::FilterErrors>(())
/// ```
pub fn convert_str(input: &str, overrides: &FrontMatterOverrides) -> Result<Handout, FilterErrors> {
    let mut delimiters_seen = 0u32;
    let mut title: Option<String> = None;
    let mut keep_output: Option<bool> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in input.lines() {
        if line.trim() == METADATA_DELIMITER && delimiters_seen < 2 {
            delimiters_seen += 1;
            continue;
        }
        if delimiters_seen == 1 {
            // Inside the metadata block. Only the recognized keys matter;
            // everything else is superseded by the synthesized header.
            if let Some(caps) = TITLE_LINE.captures(line) {
                title = Some(caps[1].trim_end().to_string());
            } else if let Some(caps) = KEEP_OUTPUT_LINE.captures(line) {
                keep_output = Some(matches!(&caps[1].to_lowercase()[..], "true" | "yes"));
            }
            continue;
        }
        body.push(line);
    }

    debug!(
        "convert_str: scanned title: {:?}, keep_output: {:?}, body lines: {:?}",
        title,
        keep_output,
        body.len()
    );

    let front = FrontMatter {
        title: overrides
            .title
            .clone()
            .or(title)
            .ok_or(FilterErrors::MissingTitle)?,
        keep_output: overrides.keep_output.or(keep_output).unwrap_or(true),
    };
    info!(
        "Converting document: title: {:?}, keep_output: {:?}",
        front.title, front.keep_output
    );

    let text = filter_document(&body, &front);
    Ok(Handout {
        text,
        front_matter: front,
    })
}
