// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The metadata that drives the synthesized handout header.
///
/// This is the resolved form: a title is always present. Use
/// [FrontMatterOverrides] together with [crate::convert_str] when the
/// metadata should be scanned from the document itself.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FrontMatter {
    pub title: String,
    /// When false, the synthesized header tells knitr to drop all figures
    /// and textual chunk results from the rendered handout.
    pub keep_output: bool,
}

/// Caller-provided values that take precedence over whatever the leading
/// metadata block of the document declares.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FrontMatterOverrides {
    pub title: Option<String>,
    pub keep_output: Option<bool>,
}

// ******** Output data structures *********

/// A converted document: the synthesized header followed by the filtered
/// body, ready to be written out and rendered.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Handout {
    pub text: String,
    /// The metadata the header was synthesized from, after overrides.
    pub front_matter: FrontMatter,
}

/// Errors that prevent a document from being converted.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FilterErrors {
    /// Neither the document's leading metadata block nor the caller
    /// provided a title.
    MissingTitle,
}

impl Error for FilterErrors {}

impl Display for FilterErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterErrors::MissingTitle => write!(f, "missing required field: title"),
        }
    }
}
