use clap::Parser;

/// This is a tutorial-to-handout conversion program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration describing a batch of tutorials to convert.
    /// For more information about the file format, read the crate documentation.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A single tutorial document to convert. Mutually exclusive with --config
    /// and --input-dir.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path or 'stdout') Where the converted handout of --input is written. Defaults to
    /// the input file name in the current directory.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (directory path) A directory to scan for tutorial documents (*.Rmd, up to one
    /// subdirectory deep). Every document found is converted.
    #[clap(long, value_parser)]
    pub input_dir: Option<String>,

    /// (directory path, default '.') The directory receiving converted handouts in
    /// --input-dir mode.
    #[clap(long, value_parser)]
    pub output_dir: Option<String>,

    /// (optional) Overrides the title declared in the document's metadata block.
    #[clap(long, value_parser)]
    pub title: Option<String>,

    /// If passed, the handout header suppresses figures and textual chunk results.
    #[clap(long, takes_value = false)]
    pub drop_output: bool,

    /// If passed, the external rendering step (Rscript + rmarkdown) is skipped and only
    /// the converted document is written.
    #[clap(long, takes_value = false)]
    pub no_render: bool,

    /// (file path, optional) A reference handout to compare the converted output against.
    /// A mismatch prints a diff and fails.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
