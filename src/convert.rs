use log::{debug, info, warn};

use tutorial_filter::*;

use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use text_diff::print_diff;
use walkdir::WalkDir;

use crate::args::Args;
use crate::convert::config_reader::*;

#[derive(Debug, Snafu)]
pub enum ConvertError {
    #[snafu(display("Error reading input document {path}"))]
    OpeningInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing handout {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error creating output directory {path}"))]
    CreatingOutputDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening configuration file"))]
    OpeningJson { source: std::io::Error },
    #[snafu(display("Error parsing configuration file"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display(""))]
    MissingParentDir {},
    #[snafu(display("Input path {path} has no file name"))]
    MissingFileName { path: String },
    #[snafu(display("Error scanning input directory"))]
    ScanningInputDir { source: walkdir::Error },
    #[snafu(display("Cannot convert {path}"))]
    Filtering {
        source: FilterErrors,
        path: String,
    },
    #[snafu(display("Could not start the renderer, is Rscript on the PATH?"))]
    RenderSpawn { source: std::io::Error },
    #[snafu(display("Rendering failed for {path} (exit status {status})"))]
    RenderFailed { path: String, status: i32 },
    #[snafu(display("Converted handout differs from reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type ConvertResult<T> = Result<T, ConvertError>;

pub mod config_reader {
    use crate::convert::*;

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct OutputSettings {
        #[serde(rename = "outputDirectory")]
        pub output_directory: Option<String>,
        #[serde(rename = "renderDocuments")]
        pub render_documents: Option<bool>,
        #[serde(rename = "keepOutput")]
        pub keep_output: Option<bool>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct TutorialSource {
        #[serde(rename = "filePath")]
        pub file_path: String,
        pub title: Option<String>,
        #[serde(rename = "keepOutput")]
        pub keep_output: Option<bool>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ConvertConfig {
        #[serde(rename = "outputSettings")]
        pub output_settings: OutputSettings,
        pub tutorials: Vec<TutorialSource>,
    }

    pub fn read_config(path: &str) -> ConvertResult<ConvertConfig> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu {})?;
        debug!("read_config: read content: {:?}", contents);
        let config: ConvertConfig =
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        Ok(config)
    }

    impl TutorialSource {
        /// The metadata overrides for this source, with the batch-wide
        /// default for keep_output filled in.
        pub fn overrides(&self, settings: &OutputSettings) -> FrontMatterOverrides {
            FrontMatterOverrides {
                title: self.title.clone(),
                keep_output: self.keep_output.or(settings.keep_output),
            }
        }
    }
}

pub mod render {
    use crate::convert::*;

    /// The argument vector of the external rendering step. Kept separate
    /// from the spawn so it can be inspected without an R installation.
    pub fn render_command(path: &str) -> (String, Vec<String>) {
        let script = format!(
            r#"library(rmarkdown); rmarkdown::render("{}", rmarkdown::github_document(toc=T, html_preview=F))"#,
            path
        );
        ("Rscript".to_string(), vec!["-e".to_string(), script])
    }

    /// Renders a converted handout with rmarkdown: table of contents on,
    /// HTML preview off. The renderer is a black box; only its exit status
    /// is interpreted.
    pub fn render_github_document(path: &str) -> ConvertResult<()> {
        let (program, cmd_args) = render_command(path);
        info!("Rendering {:?}", path);
        let status = Command::new(&program)
            .args(&cmd_args)
            .status()
            .context(RenderSpawnSnafu {})?;
        if !status.success() {
            return Err(ConvertError::RenderFailed {
                path: path.to_string(),
                status: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}

/// Converts one document from disk and returns the handout without writing
/// anything.
fn convert_file(input_path: &str, overrides: &FrontMatterOverrides) -> ConvertResult<Handout> {
    info!("Attempting to read tutorial {:?}", input_path);
    let contents = fs::read_to_string(input_path).context(OpeningInputSnafu {
        path: input_path.to_string(),
    })?;
    convert_str(&contents, overrides).context(FilteringSnafu {
        path: input_path.to_string(),
    })
}

fn write_handout(handout: &Handout, out_path: &str) -> ConvertResult<()> {
    if out_path == "stdout" {
        println!("{}", handout.text);
        return Ok(());
    }
    if let Some(parent) = Path::new(out_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(CreatingOutputDirSnafu {
                path: parent.display().to_string(),
            })?;
        }
    }
    fs::write(out_path, &handout.text).context(WritingOutputSnafu {
        path: out_path.to_string(),
    })
}

fn check_reference(handout: &Handout, reference_path: &str) -> ConvertResult<()> {
    let reference = fs::read_to_string(reference_path).context(OpeningInputSnafu {
        path: reference_path.to_string(),
    })?;
    if reference != handout.text {
        warn!("Found differences with the reference handout");
        print_diff(reference.as_str(), handout.text.as_str(), "\n");
        return Err(ConvertError::ReferenceMismatch {
            path: reference_path.to_string(),
        });
    }
    Ok(())
}

/// Tutorial documents below `root`: *.Rmd files (case-insensitive), at most
/// one subdirectory deep. Tutorials conventionally sit in one directory per
/// tutorial below the root.
fn discover_tutorials(root: &str) -> ConvertResult<Vec<PathBuf>> {
    let mut res: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(2).sort_by_file_name() {
        let entry = entry.context(ScanningInputDirSnafu {})?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_rmd = entry
            .path()
            .extension()
            .map(|e| e.eq_ignore_ascii_case("Rmd"))
            .unwrap_or(false);
        if is_rmd {
            res.push(entry.path().to_path_buf());
        }
    }
    debug!("discover_tutorials: found {:?}", res);
    Ok(res)
}

/// Output location in directory mode: the input's file name, directly under
/// the output directory.
fn handout_path(input: &Path, output_dir: &str) -> ConvertResult<PathBuf> {
    let name = input.file_name().context(MissingFileNameSnafu {
        path: input.display().to_string(),
    })?;
    Ok(Path::new(output_dir).join(name))
}

fn convert_and_emit(
    input_path: &str,
    out_path: &str,
    overrides: &FrontMatterOverrides,
    render: bool,
) -> ConvertResult<()> {
    let handout = convert_file(input_path, overrides)?;
    info!("{} -> {}", input_path, out_path);
    write_handout(&handout, out_path)?;
    if render && out_path != "stdout" {
        render::render_github_document(out_path)?;
    }
    Ok(())
}

fn run_batch(config_path: &str, args: &Args) -> ConvertResult<()> {
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    if config.tutorials.is_empty() {
        whatever!("no tutorials listed in the configuration");
    }
    // Relative paths in the configuration are resolved against its
    // directory.
    let root = Path::new(config_path)
        .parent()
        .context(MissingParentDirSnafu {})?;
    let output_dir = config
        .output_settings
        .output_directory
        .clone()
        .unwrap_or_else(|| ".".to_string());
    let render = config.output_settings.render_documents.unwrap_or(true) && !args.no_render;

    for tut in config.tutorials.iter() {
        let input = root.join(&tut.file_path);
        let out = handout_path(&input, root.join(&output_dir).display().to_string().as_str())?;
        convert_and_emit(
            input.display().to_string().as_str(),
            out.display().to_string().as_str(),
            &tut.overrides(&config.output_settings),
            render,
        )?;
    }
    Ok(())
}

fn run_directory(input_dir: &str, args: &Args) -> ConvertResult<()> {
    let output_dir = args.output_dir.clone().unwrap_or_else(|| ".".to_string());
    let overrides = FrontMatterOverrides {
        title: args.title.clone(),
        keep_output: if args.drop_output { Some(false) } else { None },
    };
    let tutorials = discover_tutorials(input_dir)?;
    if tutorials.is_empty() {
        whatever!("no tutorial documents (*.Rmd) found under {}", input_dir);
    }
    for input in tutorials.iter() {
        let out = handout_path(input, output_dir.as_str())?;
        convert_and_emit(
            input.display().to_string().as_str(),
            out.display().to_string().as_str(),
            &overrides,
            !args.no_render,
        )?;
    }
    Ok(())
}

fn run_single(input_path: &str, args: &Args) -> ConvertResult<()> {
    let overrides = FrontMatterOverrides {
        title: args.title.clone(),
        keep_output: if args.drop_output { Some(false) } else { None },
    };
    let out = match args.out.clone() {
        Some(x) => x,
        None => handout_path(Path::new(input_path), ".")?
            .display()
            .to_string(),
    };
    let handout = convert_file(input_path, &overrides)?;
    info!("{} -> {}", input_path, out);
    write_handout(&handout, out.as_str())?;

    // The reference handout, if provided for comparison
    if let Some(reference) = args.reference.clone() {
        check_reference(&handout, reference.as_str())?;
    }

    if !args.no_render && out != "stdout" {
        render::render_github_document(out.as_str())?;
    }
    Ok(())
}

pub fn run_conversion(args: &Args) -> ConvertResult<()> {
    match (&args.config, &args.input_dir, &args.input) {
        (Some(config_path), _, _) => run_batch(config_path.as_str(), args),
        (None, Some(input_dir), _) => run_directory(input_dir.as_str(), args),
        (None, None, Some(input)) => run_single(input.as_str(), args),
        (None, None, None) => {
            whatever!("nothing to do: pass --config, --input-dir or --input")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::config_reader::*;
    use super::render::*;
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let d = std::env::temp_dir().join(format!("mkhandout_{}_{}", name, std::process::id()));
        if d.exists() {
            fs::remove_dir_all(&d).unwrap();
        }
        fs::create_dir_all(&d).unwrap();
        d
    }

    #[test]
    fn parse_full_config() {
        let js = r#"{
            "outputSettings": {
                "outputDirectory": "handouts",
                "renderDocuments": false,
                "keepOutput": false
            },
            "tutorials": [
                { "filePath": "intro/intro.Rmd" },
                { "filePath": "wrangling/wrangling.Rmd",
                  "title": "Data wrangling",
                  "keepOutput": true }
            ]
        }"#;
        let config: ConvertConfig = serde_json::from_str(js).unwrap();
        assert_eq!(
            config.output_settings.output_directory,
            Some("handouts".to_string())
        );
        assert_eq!(config.tutorials.len(), 2);

        // Batch default applies when the tutorial does not override it.
        let o0 = config.tutorials[0].overrides(&config.output_settings);
        assert_eq!(o0.keep_output, Some(false));
        assert_eq!(o0.title, None);
        let o1 = config.tutorials[1].overrides(&config.output_settings);
        assert_eq!(o1.keep_output, Some(true));
        assert_eq!(o1.title, Some("Data wrangling".to_string()));
    }

    #[test]
    fn parse_minimal_config() {
        let js = r#"{
            "outputSettings": {},
            "tutorials": [ { "filePath": "a.Rmd" } ]
        }"#;
        let config: ConvertConfig = serde_json::from_str(js).unwrap();
        let o = config.tutorials[0].overrides(&config.output_settings);
        assert_eq!(o, FrontMatterOverrides::default());
    }

    #[test]
    fn render_command_shape() {
        let (program, cmd_args) = render_command("handouts/intro.Rmd");
        assert_eq!(program, "Rscript");
        assert_eq!(cmd_args[0], "-e");
        assert!(cmd_args[1].contains(r#"rmarkdown::render("handouts/intro.Rmd""#));
        assert!(cmd_args[1].contains("toc=T"));
        assert!(cmd_args[1].contains("html_preview=F"));
    }

    #[test]
    fn convert_file_end_to_end() {
        let dir = scratch_dir("convert");
        let input = dir.join("intro.Rmd");
        fs::write(
            &input,
            "---\ntitle: Intro\n---\ntext\n```{r ex1-solution}\nhidden\n```\nmore\n",
        )
        .unwrap();

        let handout = convert_file(
            input.display().to_string().as_str(),
            &FrontMatterOverrides::default(),
        )
        .unwrap();
        assert_eq!(handout.front_matter.title, "Intro");
        assert!(!handout.text.contains("hidden"));
        assert!(handout.text.ends_with("text\nmore\n"));

        let out = dir.join("out").join("intro.Rmd");
        write_handout(&handout, out.display().to_string().as_str()).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), handout.text);
    }

    #[test]
    fn convert_file_missing_title_is_reported() {
        let dir = scratch_dir("notitle");
        let input = dir.join("bad.Rmd");
        fs::write(&input, "---\nauthor: x\n---\nbody\n").unwrap();
        let res = convert_file(
            input.display().to_string().as_str(),
            &FrontMatterOverrides::default(),
        );
        match res {
            Err(ConvertError::Filtering { source, .. }) => {
                assert_eq!(source, FilterErrors::MissingTitle)
            }
            x => panic!("expected a filtering error, got {:?}", x),
        }
    }

    #[test]
    fn discovery_finds_rmd_one_level_deep() {
        let dir = scratch_dir("discover");
        fs::create_dir_all(dir.join("intro")).unwrap();
        fs::create_dir_all(dir.join("deep/deeper")).unwrap();
        fs::write(dir.join("top.rmd"), "x").unwrap();
        fs::write(dir.join("intro/intro.Rmd"), "x").unwrap();
        fs::write(dir.join("intro/notes.txt"), "x").unwrap();
        fs::write(dir.join("deep/deeper/far.Rmd"), "x").unwrap();

        let found = discover_tutorials(dir.display().to_string().as_str()).unwrap();
        let names: Vec<String> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["intro.Rmd".to_string(), "top.rmd".to_string()]);
    }

    #[test]
    fn handout_path_flattens_into_output_dir() {
        let p = handout_path(Path::new("inst/tutorials/intro/intro.Rmd"), "handouts").unwrap();
        assert_eq!(p, Path::new("handouts").join("intro.Rmd"));
    }

    #[test]
    fn reference_check_passes_and_fails() {
        let dir = scratch_dir("reference");
        let handout = Handout {
            text: "---\ntitle: T\n---\nbody\n".to_string(),
            front_matter: FrontMatter {
                title: "T".to_string(),
                keep_output: true,
            },
        };
        let good = dir.join("good.Rmd");
        fs::write(&good, &handout.text).unwrap();
        assert!(check_reference(&handout, good.display().to_string().as_str()).is_ok());

        let bad = dir.join("bad.Rmd");
        fs::write(&bad, "something else\n").unwrap();
        let res = check_reference(&handout, bad.display().to_string().as_str());
        assert!(matches!(res, Err(ConvertError::ReferenceMismatch { .. })));
    }

    #[test]
    fn batch_conversion_from_config() {
        let dir = scratch_dir("batch");
        fs::create_dir_all(dir.join("tutorials/intro")).unwrap();
        fs::write(
            dir.join("tutorials/intro/intro.Rmd"),
            "---\ntitle: Intro\n---\n```{r ex1, exercise = TRUE}\n1 + 1\n```\n",
        )
        .unwrap();
        let config_path = dir.join("convert.json");
        fs::write(
            &config_path,
            r#"{
                "outputSettings": {
                    "outputDirectory": "handouts",
                    "renderDocuments": false,
                    "keepOutput": false
                },
                "tutorials": [ { "filePath": "tutorials/intro/intro.Rmd" } ]
            }"#,
        )
        .unwrap();

        let args = Args {
            config: Some(config_path.display().to_string()),
            input: None,
            out: None,
            input_dir: None,
            output_dir: None,
            title: None,
            drop_output: false,
            no_render: false,
            reference: None,
            verbose: false,
        };
        run_conversion(&args).unwrap();

        let out = fs::read_to_string(dir.join("handouts/intro.Rmd")).unwrap();
        assert!(out.contains("title: Intro"));
        assert!(out.contains(r#"results="hide""#));
        assert!(out.contains("```{r ex1}\n1 + 1\n```"));
        assert!(!out.contains("exercise"));
    }
}
