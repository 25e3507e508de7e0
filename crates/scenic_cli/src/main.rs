//! `scenic` - export, inspect and load scene documents
//!
//! Run with: cargo run -p scenic_cli -- <command>
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scenic_export::{export_to_folder, obj, ExportConfig};
use scenic_format::{parse_document, Document};
use scenic_graph::SceneGraph;
use scenic_import::{DecodeOptions, SceneLoader};
use scenic_math::AABB;

#[derive(Parser)]
#[command(name = "scenic")]
#[command(about = "Write and read JSON scene documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export a Wavefront OBJ file to a scene folder
    Export {
        /// Input .obj file (materials from its mtllib are included)
        input: PathBuf,

        /// Output folder, created if missing
        output: PathBuf,

        /// TOML export settings
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Replace textures already present in the output folder
        #[arg(long)]
        overwrite: bool,
    },

    /// Print a summary of a scene document
    Info {
        document: PathBuf,
    },

    /// Validate cross-references; exits non-zero when any are dangling
    Check {
        document: PathBuf,
    },

    /// Load a document into a headless scene graph and print the node tree
    Load {
        document: PathBuf,

        /// Read texture headers to record image sizes
        #[arg(long)]
        probe_textures: bool,

        /// Number of ticks to run after loading
        #[arg(long, default_value_t = 1)]
        ticks: u32,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Export {
            input,
            output,
            config,
            overwrite,
        } => export(&input, &output, config.as_deref(), overwrite),
        Command::Info { document } => info(&document),
        Command::Check { document } => check(&document),
        Command::Load {
            document,
            probe_textures,
            ticks,
        } => load(&document, probe_textures, ticks),
    }
}

fn export(input: &Path, output: &Path, config: Option<&Path>, overwrite: bool) -> Result<()> {
    let mut config = match config {
        Some(path) => ExportConfig::load_from_file(path)?,
        None => ExportConfig::load(),
    };
    if overwrite {
        config.overwrite_textures = true;
    }

    let objects = match input.extension().and_then(|e| e.to_str()) {
        Some("obj") => obj::load_obj(input)?,
        _ => bail!("Unsupported input file: {}", input.display()),
    };
    if objects.is_empty() {
        bail!("{} contains no geometry", input.display());
    }

    eprintln!("Exporting {} objects from {}...", objects.len(), input.display());
    let report = export_to_folder(&objects, output, &config)?;
    print!("{}", report);
    Ok(())
}

fn read_document(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    let doc = parse_document(&bytes).with_context(|| format!("cannot parse {}", path.display()))?;
    Ok(doc)
}

fn info(path: &Path) -> Result<()> {
    let doc = read_document(path)?;

    println!("{}", path.display());
    println!("  Format:     {} ({})", doc.metadata.format_version, doc.metadata.kind);
    if let Some(generated_by) = &doc.metadata.generated_by {
        println!("  Written by: {}", generated_by);
    }
    println!("  Objects:    {}", doc.object_count());
    println!("  Geometries: {}", doc.geometries.len());
    println!("  Embeds:     {}", doc.embeds.len());
    println!("  Materials:  {}", doc.materials.len());
    println!("  Textures:   {}", doc.textures.len());
    println!("  Cameras:    {}", doc.cameras.len());
    println!("  Lights:     {}", doc.lights.len());
    if let Some(camera) = &doc.defaults.camera {
        println!("  Camera:     {}", camera);
    }

    let triangles: usize = doc
        .embeds
        .values()
        .flat_map(|embed| scenic_format::FaceReader::new(&embed.faces, embed.uv_layer_count()))
        .filter_map(|face| face.ok())
        .map(|face| face.triangles().len())
        .sum();
    println!("  Triangles:  {}", triangles);

    let (mut graph, _backend) = SceneGraph::headless();
    let root = graph.root();
    let scene = SceneLoader::new(DecodeOptions::default()).load_document(
        &mut graph,
        root,
        "scene",
        &doc,
        |_, _| {},
    )?;
    println!("  Bounds:     {}", format_bounds(&scene.bounds(&graph)));
    if !scene.issues.is_clean() {
        println!("  Issues:     {} (run `scenic check`)", scene.issues.len());
    }
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let doc = read_document(path)?;
    let report = doc.validate();
    if report.is_clean() {
        println!("{}: ok", path.display());
        return Ok(());
    }
    for issue in report.iter() {
        println!("{}: {}", path.display(), issue);
    }
    bail!("{} reference issues in {}", report.len(), path.display());
}

fn load(path: &Path, probe_textures: bool, ticks: u32) -> Result<()> {
    let (mut graph, backend) = SceneGraph::headless();
    let root = graph.root();
    let loader = SceneLoader::new(DecodeOptions::default().with_texture_probe(probe_textures));
    let scene = loader.load(&mut graph, root, path, |graph, scene| {
        log::info!("Loaded, bounds {}", format_bounds(&scene.bounds(graph)));
    })?;

    for _ in 0..ticks {
        graph.tick(1.0 / 60.0);
    }

    print!("{}", graph.render_tree(scene.root));
    println!("{} render resources live", backend.live_count());
    if let Some(camera) = scene.camera.and_then(|id| graph.name(id)) {
        println!("camera: {}", camera);
    }
    Ok(())
}

fn format_bounds(bounds: &AABB) -> String {
    if bounds.is_empty() {
        return "empty".to_string();
    }
    let (min, max) = (bounds.min, bounds.max);
    format!(
        "({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
        min.x, min.y, min.z, max.x, max.y, max.z
    )
}
