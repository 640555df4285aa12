mod utils;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use blomp::{
    compare::{data_ratio, score, similarity},
    search::{search_depth_and_threshold, search_threshold, SearchTarget},
    Block, BlockTreeDesc, BlompPicture,
};
use clap::{Args, Parser, Subcommand};
use log::info;
use utils::{
    derived_path, exists_decision, load_image, may_write, optional_path, print_tree_info,
    save_image, Assume,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Subcommands,

    /// Only print results and warnings
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Overwrite output files
    #[arg(short = 'n', long = "overwrite", conflicts_with = "assumeno", global = true)]
    assumeyes: bool,

    /// Do not overwrite output files
    #[arg(short = 'y', long = "preserve", conflicts_with = "assumeyes", global = true)]
    assumeno: bool,
}

#[derive(Debug, Subcommand)]
enum Subcommands {
    /// Encode an image to Blomp format
    Enc(EncodeArgs),

    /// Decode a Blomp image into another format
    Dec(DecodeArgs),

    /// Encode and immediately decode an image, to preview the result
    Denc(DencArgs),

    /// Compare two images and score how well one compresses the other
    Comp(CompArgs),

    /// Search for the variation threshold reaching a target size
    Maxv(MaxvArgs),

    /// Search for the depth and variation threshold with the best score
    Opti(OptiArgs),

    /// Print information about the block tree of a Blomp file
    Info(InfoArgs),
}

#[derive(Debug, Args)]
struct TreeArgs {
    /// Maximum depth of the block tree
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(0..=10))]
    depth: u8,

    /// Highest color variation still merged into a single block
    #[arg(short, long, default_value_t = 0.02, value_parser = variation)]
    variation: f32,
}

impl TreeArgs {
    fn desc(&self) -> Result<BlockTreeDesc> {
        Ok(BlockTreeDesc::new(self.depth, self.variation)?)
    }
}

#[derive(Debug, Args)]
struct SearchArgs {
    /// Number of search iterations, 0 to stop once the size settles
    #[arg(short, long, default_value_t = 10)]
    iterations: u32,

    /// Target file size in bytes, defaults to the size of the input file
    #[arg(short, long, conflicts_with = "similarity", value_parser = clap::value_parser!(u64).range(1..))]
    size: Option<u64>,

    /// Target similarity to the input image instead of a file size
    #[arg(long, value_parser = similarity_target)]
    similarity: Option<f32>,

    /// Also save the decoded result as an image, `+` for a derived name
    #[arg(short = 'g', long = "genoutput")]
    generated: Option<PathBuf>,
}

impl SearchArgs {
    fn target(&self, input: &Path) -> Result<SearchTarget> {
        Ok(match (self.size, self.similarity) {
            (_, Some(similarity)) => SearchTarget::Similarity(similarity),
            (Some(size), None) => SearchTarget::Size(size),
            (None, None) => SearchTarget::Size(fs::metadata(input)?.len()),
        })
    }
}

#[derive(Debug, Args)]
struct EncodeArgs {
    /// Input image file of any type supported by `image`
    input: PathBuf,

    /// Output path, defaults to the input name with a `.blp` extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save a heatmap of the block depths, `+` for a derived name
    #[arg(short = 'm', long)]
    heatmap: Option<PathBuf>,

    #[command(flatten)]
    tree: TreeArgs,
}

#[derive(Debug, Args)]
struct DecodeArgs {
    /// Input Blomp image file
    input: PathBuf,

    /// Output image file, defaults to the input name as a PNG
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save a heatmap of the block depths, `+` for a derived name
    #[arg(short = 'm', long)]
    heatmap: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DencArgs {
    /// Input image file of any type supported by `image`
    input: PathBuf,

    /// Output image file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save a heatmap of the block depths, `+` for a derived name
    #[arg(short = 'm', long)]
    heatmap: Option<PathBuf>,

    /// Also keep the encoded Blomp file, `+` for a derived name
    #[arg(short = 'g', long = "genoutput")]
    generated: Option<PathBuf>,

    #[command(flatten)]
    tree: TreeArgs,
}

#[derive(Debug, Args)]
struct CompArgs {
    /// Input image, either a Blomp file or any type supported by `image`
    input: PathBuf,

    /// Image to compare against
    #[arg(short, long = "compfile")]
    compare: PathBuf,
}

#[derive(Debug, Args)]
struct MaxvArgs {
    /// Input image, either a Blomp file or any type supported by `image`
    input: PathBuf,

    /// Output path, defaults to the input name with a `.blp` extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save a heatmap of the block depths, `+` for a derived name
    #[arg(short = 'm', long)]
    heatmap: Option<PathBuf>,

    /// Maximum depth of the block tree
    #[arg(short, long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(0..=10))]
    depth: u8,

    #[command(flatten)]
    search: SearchArgs,
}

#[derive(Debug, Args)]
struct OptiArgs {
    /// Input image, either a Blomp file or any type supported by `image`
    input: PathBuf,

    /// Output path, defaults to the input name with a `.blp` extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Save a heatmap of the block depths, `+` for a derived name
    #[arg(short = 'm', long)]
    heatmap: Option<PathBuf>,

    #[command(flatten)]
    search: SearchArgs,
}

#[derive(Debug, Args)]
struct InfoArgs {
    /// Input Blomp image file
    input: PathBuf,
}

fn variation(s: &str) -> Result<f32, String> {
    unit_interval(s, "Variation")
}

fn similarity_target(s: &str) -> Result<f32, String> {
    let value = unit_interval(s, "Similarity")?;
    if value == 0.0 {
        return Err("Similarity must be above 0.0".to_string())
    }

    Ok(value)
}

fn unit_interval(s: &str, name: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("Invalid number {s}"))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("{name} must be between 0.0 and 1.0"))
    }

    Ok(value)
}

/// Default log filter. Search progress from the library is logged at
/// `debug`, so it is shown unless running quietly.
fn log_filter(quiet: bool) -> &'static str {
    if quiet {
        "warn"
    } else {
        "info,blomp=debug"
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_filter(args.quiet)))
        .init();

    let assume = if args.assumeyes {
        Some(Assume::Yes)
    } else if args.assumeno {
        Some(Assume::No)
    } else {
        None
    };

    let quiet = args.quiet;
    match args.command {
        Subcommands::Enc(a) => encode(a, assume, quiet),
        Subcommands::Dec(a) => decode(a, assume, quiet),
        Subcommands::Denc(a) => denc(a, assume, quiet),
        Subcommands::Comp(a) => comp(a),
        Subcommands::Maxv(a) => maxv(a, assume),
        Subcommands::Opti(a) => opti(a, assume),
        Subcommands::Info(a) => view_info(a),
    }
}

fn check_input(input: &Path) -> Result<()> {
    if !input.try_exists()? {
        bail!("Input file {:?} does not exist", input);
    }

    Ok(())
}

fn encode(args: EncodeArgs, assume: Option<Assume>, quiet: bool) -> Result<()> {
    check_input(&args.input)?;

    let output = args.output.unwrap_or_else(|| derived_path(&args.input, ".blp"));
    if !may_write(&output, assume)? {
        return Ok(())
    }

    let img = load_image(&args.input)?;
    let picture = BlompPicture::from_image(&img, &args.tree.desc()?)?;

    if !quiet {
        print_tree_info(picture.tree(), &output);
    }

    picture.save(&output)?;
    info!("Saved {:?}", output);

    save_heatmap(&picture, optional_path(args.heatmap.as_deref(), &args.input, "_HEAT.png"), assume)
}

fn decode(args: DecodeArgs, assume: Option<Assume>, quiet: bool) -> Result<()> {
    check_input(&args.input)?;

    let output = args.output.unwrap_or_else(|| derived_path(&args.input, ".png"));
    if !may_write(&output, assume)? {
        return Ok(())
    }

    let picture = blomp::open(&args.input)
        .with_context(|| format!("Could not read {:?}", args.input))?;

    if !quiet {
        print_tree_info(picture.tree(), &args.input);
    }

    save_image(&picture.to_image()?, &output)?;
    info!("Saved {:?}", output);

    save_heatmap(&picture, optional_path(args.heatmap.as_deref(), &args.input, "_HEAT.png"), assume)
}

fn denc(args: DencArgs, assume: Option<Assume>, quiet: bool) -> Result<()> {
    check_input(&args.input)?;

    let output = args.output.unwrap_or_else(|| derived_path(&args.input, "_DENC.png"));
    if !may_write(&output, assume)? {
        return Ok(())
    }

    let img = load_image(&args.input)?;
    let picture = BlompPicture::from_image(&img, &args.tree.desc()?)?;

    let generated = optional_path(args.generated.as_deref(), &args.input, ".blp");
    if !quiet {
        print_tree_info(picture.tree(), generated.as_deref().unwrap_or(Path::new("(not saved)")));
    }

    if let Some(path) = generated {
        if may_write(&path, assume)? {
            picture.save(&path)?;
            info!("Saved {:?}", path);
        }
    }

    save_image(&picture.to_image()?, &output)?;
    info!("Saved {:?}", output);

    save_heatmap(&picture, optional_path(args.heatmap.as_deref(), &args.input, "_HEAT.png"), assume)
}

fn comp(args: CompArgs) -> Result<()> {
    check_input(&args.input)?;
    check_input(&args.compare)?;

    let compare_img = load_image(&args.compare)?;
    let input_img = load_image(&args.input)?;

    let compare_size = fs::metadata(&args.compare)?.len();
    let input_size = fs::metadata(&args.input)?.len();

    let similarity = similarity(&compare_img, &input_img)?;

    println!("Comparison of {:?} and {:?}:", args.compare, args.input);
    println!("  Similarity: {similarity}");
    println!("  Data ratio: {}", data_ratio(compare_size, input_size));
    println!("  Score:      {}", score(similarity, compare_size, input_size));

    Ok(())
}

fn maxv(args: MaxvArgs, assume: Option<Assume>) -> Result<()> {
    check_input(&args.input)?;

    let output = args.output.unwrap_or_else(|| derived_path(&args.input, ".blp"));
    if !may_write(&output, assume)? {
        return Ok(())
    }

    let img = load_image(&args.input)?;
    let target = args.search.target(&args.input)?;
    let desc = BlockTreeDesc::default().with_depth(args.depth);

    let result = search_threshold(&img, &desc, target, args.search.iterations)?;

    println!(
        "MaxV result for {:?} after {} iterations:",
        args.input, result.iterations
    );
    println!(
        "  v: {} -> {} bytes",
        result.desc.variation_threshold, result.estimated_size
    );

    let picture = BlompPicture::from_tree(result.tree, result.desc.max_depth)?;
    save_results(
        &picture,
        &output,
        optional_path(args.search.generated.as_deref(), &args.input, "_MAXV.png"),
        optional_path(args.heatmap.as_deref(), &args.input, "_HEAT.png"),
        assume,
    )
}

fn opti(args: OptiArgs, assume: Option<Assume>) -> Result<()> {
    check_input(&args.input)?;

    let output = args.output.unwrap_or_else(|| derived_path(&args.input, ".blp"));
    if !may_write(&output, assume)? {
        return Ok(())
    }

    let img = load_image(&args.input)?;
    let target = args.search.target(&args.input)?;
    let original_size = fs::metadata(&args.input)?.len();

    let result = search_depth_and_threshold(&img, target, args.search.iterations, original_size)?;
    let best = result.best;

    println!(
        "Opti result for {:?} after {} iterations:",
        args.input, result.iterations
    );
    println!(
        "  d: {} v: {}",
        best.desc.max_depth, best.desc.variation_threshold
    );
    println!(
        "  -> {} bytes, similarity {}, score {}",
        best.estimated_size, result.similarity, result.score
    );

    let picture = BlompPicture::from_tree(best.tree, best.desc.max_depth)?;
    save_results(
        &picture,
        &output,
        optional_path(args.search.generated.as_deref(), &args.input, "_OPTI.png"),
        optional_path(args.heatmap.as_deref(), &args.input, "_HEAT.png"),
        assume,
    )
}

fn view_info(args: InfoArgs) -> Result<()> {
    check_input(&args.input)?;

    let (header, tree): (_, Block) = blomp::load_file(&args.input)
        .with_context(|| format!("Could not read {:?}", args.input))?;

    println!(
        "{}x{} pixels, max depth {}",
        header.width, header.height, header.max_depth
    );
    print_tree_info(&tree, &args.input);

    Ok(())
}

/// Save a search result, plus the optional decoded image and heatmap.
fn save_results(
    picture: &BlompPicture,
    output: &Path,
    generated: Option<PathBuf>,
    heatmap: Option<PathBuf>,
    assume: Option<Assume>,
) -> Result<()> {
    picture.save(output)?;
    info!("Saved {:?}", output);

    if let Some(path) = generated {
        if may_write(&path, assume)? {
            save_image(&picture.to_image()?, &path)?;
            info!("Saved {:?}", path);
        }
    }

    save_heatmap(picture, heatmap, assume)
}

fn save_heatmap(picture: &BlompPicture, path: Option<PathBuf>, assume: Option<Assume>) -> Result<()> {
    let Some(path) = path else {
        return Ok(())
    };

    if path.try_exists()? && !exists_decision("Heatmap", "Overwrite", &path, assume) {
        return Ok(())
    }

    save_image(&picture.heatmap()?, &path)?;
    info!("Saved heatmap {:?}", path);

    Ok(())
}
