//! imgcomment - inspect images referenced from documentation comments

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use imgcomment::presenter::{
    CommentSource, DEFAULT_ASSET_DIR, DocRenderer, ImagePresenter, PresenterConfig,
};
use imgcomment::probe_path;
use imgcomment::source::DEFAULT_INLINE_THRESHOLD;

#[derive(Parser)]
#[command(name = "imgcomment")]
#[command(version, about = "Images in documentation comments", long_about = None)]
#[command(after_help = "EXAMPLES:
    imgcomment probe icon.png logo.svg         Show image sizes
    imgcomment render doc.xml --root ./sln     Render a comment with its image")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the pixel size sniffed from each image
    Probe {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Render a documentation comment and append its image block
    Render {
        /// File holding the comment XML
        #[arg(value_name = "COMMENT_XML")]
        comment: PathBuf,

        /// Solution directory image paths are relative to
        #[arg(short, long, default_value = ".")]
        root: PathBuf,

        /// Largest file, in bytes, inlined as a data URI
        #[arg(long, default_value_t = DEFAULT_INLINE_THRESHOLD)]
        threshold: u64,

        /// Asset subdirectory searched after the root
        #[arg(long, default_value = DEFAULT_ASSET_DIR)]
        asset_dir: String,

        /// Allow images to be drawn larger than their native size
        #[arg(long)]
        upscale: bool,
    },
}

#[derive(Serialize)]
struct ProbeReport {
    path: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// A comment read from disk.
struct FileComment(String);

impl CommentSource for FileComment {
    fn symbol_doc(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Shows the comment XML verbatim in place of a host renderer.
struct PreformattedRenderer;

impl DocRenderer for PreformattedRenderer {
    fn render(&self, fragment: &str) -> String {
        format!("<pre>{}</pre>", quick_xml::escape::escape(fragment))
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Probe { files, json } => probe(&files, json),
        Command::Render {
            comment,
            root,
            threshold,
            asset_dir,
            upscale,
        } => {
            let config = PresenterConfig::default()
                .with_inline_threshold(threshold)
                .with_asset_dir(asset_dir)
                .with_upscale_by_default(upscale)
                .with_target_type(None);
            render(&comment, root, config)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn probe(files: &[PathBuf], json: bool) -> Result<(), String> {
    let reports: Vec<ProbeReport> = files
        .iter()
        .map(|path| {
            let size = probe_path(path);
            ProbeReport {
                path: path.display().to_string(),
                width: size.map(|s| s.width),
                height: size.map(|s| s.height),
            }
        })
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&reports).map_err(|e| e.to_string())?;
        println!("{out}");
        return Ok(());
    }

    for report in &reports {
        match (report.width, report.height) {
            (Some(w), Some(h)) => println!("{}: {w}x{h}", report.path),
            _ => println!("{}: unknown", report.path),
        }
    }
    Ok(())
}

fn render(comment: &Path, root: PathBuf, config: PresenterConfig) -> Result<(), String> {
    let xml = fs::read_to_string(comment).map_err(|e| format!("{}: {e}", comment.display()))?;

    let presenter = ImagePresenter::new(config);
    let roots = presenter.solution_roots(root);
    let html = presenter
        .present(&FileComment(xml), &PreformattedRenderer, &roots)
        .ok_or_else(|| "comment is empty".to_string())?;

    println!("{html}");
    Ok(())
}
