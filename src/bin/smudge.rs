use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use smudge::{
    BlurSettings, BlurStyle, CancelToken, EditSession, FrameRegion, GraphConfig, Layout,
    VideoClip, build_palettegen_graph, build_paletteuse_graph, extract_frames,
};

#[derive(Parser, Debug)]
#[command(name = "smudge", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a masked blur to every frame of a GIF and re-encode it.
    Blur(BlurArgs),
    /// Print the two-pass ffmpeg filter graphs for a clip layout project.
    Graph(GraphArgs),
    /// Print decoded frame metadata for a GIF.
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct BlurArgs {
    /// Input GIF path.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Blur style.
    #[arg(long, value_enum, default_value_t = StyleChoice::Gaussian)]
    style: StyleChoice,

    /// Blur intensity (0 disables the blur).
    #[arg(long, default_value_t = 8)]
    intensity: u32,

    /// Mask rectangle as `x,y,w,h`; repeatable.
    #[arg(long = "rect", required = true)]
    rects: Vec<String>,

    /// Optional editing resolution as `WxH` (frames are scaled back on export).
    #[arg(long)]
    size: Option<String>,
}

#[derive(Parser, Debug)]
struct GraphArgs {
    /// Project JSON: layout, fps, width, height, clips.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    /// Input GIF path.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StyleChoice {
    Gaussian,
    Pixelated,
    Mosaic,
}

impl From<StyleChoice> for BlurStyle {
    fn from(choice: StyleChoice) -> Self {
        match choice {
            StyleChoice::Gaussian => BlurStyle::Gaussian,
            StyleChoice::Pixelated => BlurStyle::Pixelated,
            StyleChoice::Mosaic => BlurStyle::Mosaic,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct GraphProject {
    layout: Layout,
    fps: u32,
    width: u32,
    height: u32,
    clips: Vec<VideoClip>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Blur(args) => cmd_blur(args),
        Command::Graph(args) => cmd_graph(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn parse_rect(spec: &str) -> anyhow::Result<FrameRegion> {
    let parts: Vec<u32> = spec
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("parse rect '{spec}' (expected x,y,w,h)"))?;
    anyhow::ensure!(parts.len() == 4, "rect '{spec}' must have four components");
    Ok(FrameRegion::new(parts[0], parts[1], parts[2], parts[3]))
}

fn parse_size(spec: &str) -> anyhow::Result<(u32, u32)> {
    let (w, h) = spec
        .split_once('x')
        .with_context(|| format!("parse size '{spec}' (expected WxH)"))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

fn cmd_blur(args: BlurArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read GIF '{}'", args.in_path.display()))?;
    let target = args.size.as_deref().map(parse_size).transpose()?;

    let cancel = CancelToken::new();
    let mut session = EditSession::new();
    session.load(&bytes, target, &cancel)?;
    session.set_blur(BlurSettings::new(args.style.into(), args.intensity))?;
    for spec in &args.rects {
        let rect = parse_rect(spec)?;
        session.paint_rect(&rect);
    }

    let out = session.export_gif(&cancel)?;
    std::fs::write(&args.out, &out)
        .with_context(|| format!("write GIF '{}'", args.out.display()))?;
    println!(
        "{} frames -> {} ({} bytes)",
        session.frame_count(),
        args.out.display(),
        out.len()
    );
    Ok(())
}

fn cmd_graph(args: GraphArgs) -> anyhow::Result<()> {
    let project = read_project(&args.in_path)?;
    let cfg = GraphConfig {
        layout: project.layout,
        fps: project.fps,
        width: project.width,
        height: project.height,
    };

    println!("# palettegen");
    println!("{}", build_palettegen_graph(&cfg, &project.clips)?);
    println!("# paletteuse");
    println!("{}", build_paletteuse_graph(&cfg, &project.clips)?);
    Ok(())
}

fn read_project(path: &Path) -> anyhow::Result<GraphProject> {
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    let r = BufReader::new(f);
    let project: GraphProject =
        serde_json::from_reader(r).with_context(|| "parse project JSON")?;
    Ok(project)
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.in_path)
        .with_context(|| format!("read GIF '{}'", args.in_path.display()))?;
    let (frames, metadata) = extract_frames(&bytes, None, &CancelToken::new())?;

    println!(
        "{}x{} logical screen, {} frames",
        metadata.screen_width,
        metadata.screen_height,
        frames.len()
    );
    for (i, meta) in metadata.frames.iter().enumerate() {
        println!(
            "frame {i}: {}x{}+{}+{} dispose={:?} delay={}cs",
            meta.region.width,
            meta.region.height,
            meta.region.left,
            meta.region.top,
            meta.disposal,
            meta.delay_cs
        );
    }
    Ok(())
}
