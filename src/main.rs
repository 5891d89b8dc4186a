//! Compiles a directory of SVG icons into an OpenType font and a companion
//! constants file declaring the icon code points.

use clap::Parser;
use iconforge::{classfile, compile, IconInput, Options};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// The first Private Use Area code point; icons are assigned upward from
/// here in name order.
const FIRST_CODE_POINT: u32 = 0xE000;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory containing the input `*.svg` icons.
    input: PathBuf,

    /// The output font file.
    output: PathBuf,

    /// Companion source file listing the icon code points.
    #[arg(short, long)]
    output_class_file: Option<PathBuf>,

    /// Indentation width of the companion source file.
    #[arg(short, long, default_value_t = 2)]
    indent: usize,

    /// Name of the emitted class of constants.
    #[arg(short, long, default_value = "Icons")]
    class_name: String,

    /// The font family name.
    #[arg(short, long, default_value = "iconforge")]
    font_name: String,

    /// Normalize every glyph into the em square.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    normalize: bool,

    /// Drop shape primitives instead of expanding them to paths.
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    ignore_shapes: bool,

    /// Log progress.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let icons = discover_icons(&args.input)?;
    info!("compiling {} icons from {}", icons.len(), args.input.display());

    let options = Options {
        font_name: args.font_name.clone(),
        normalize: args.normalize,
        ignore_shapes: args.ignore_shapes,
        ..Options::default()
    };

    let font = compile(&icons, &options)?;
    std::fs::write(&args.output, &font.data)?;
    info!("wrote {} ({} bytes)", args.output.display(), font.data.len());

    if let Some(class_file) = &args.output_class_file {
        let rendered = classfile::render(&args.class_name, args.indent, &font.code_points);
        std::fs::write(class_file, rendered)?;
        info!("wrote {}", class_file.display());
    }

    Ok(())
}

/// Collect `*.svg` files of a directory, sorted by stem, and assign code
/// points sequentially from the Private Use Area.
fn discover_icons(dir: &Path) -> Result<Vec<IconInput>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_svg = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg"));
        if path.is_file() && is_svg {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            paths.push((stem, path));
        } else {
            debug!("skipping {}", path.display());
        }
    }

    paths.sort();

    paths
        .into_iter()
        .enumerate()
        .map(|(i, (name, path))| {
            Ok(IconInput {
                name,
                svg: std::fs::read_to_string(&path)?,
                code_point: FIRST_CODE_POINT + i as u32,
            })
        })
        .collect()
}
